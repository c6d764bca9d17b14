//! Integration tests for parsing SonicOS response data.
//!
//! These tests validate that the sonicos-api models and request builders work
//! with response bodies captured from real appliances.

use serde_json::Value;
use sonicos_api::models::VersionInfo;
use sonicos_api::{ApiResponse, ResourceKind, ResourceRequest, Selector, Verb};
use sonicos_core::types::{AddressObjectType, FirmwareGeneration};
use std::fs;
use std::path::PathBuf;

/// Get the path to the test fixtures directory.
fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

fn load_fixture(name: &str) -> String {
    let fixture_path = fixtures_dir().join(name);
    fs::read_to_string(&fixture_path).unwrap_or_else(|e| {
        panic!(
            "Failed to read fixture at {}: {}",
            fixture_path.display(),
            e
        )
    })
}

fn load_json(name: &str) -> Value {
    serde_json::from_str(&load_fixture(name))
        .unwrap_or_else(|e| panic!("Failed to parse fixture {name}: {e}"))
}

fn object_keys(value: &Value) -> Vec<String> {
    value
        .as_object()
        .map(|map| map.keys().cloned().collect())
        .unwrap_or_default()
}

#[test]
fn test_version_gen6() {
    let info: VersionInfo = serde_json::from_str(&load_fixture("version_gen6.json")).unwrap();

    assert_eq!(info.model.as_deref(), Some("TZ 400"));
    assert_eq!(info.serial_number.as_deref(), Some("C0EAE4FB1C9F"));
    assert_eq!(info.generation(), Some(FirmwareGeneration::Six));
    assert!(info.extra.contains_key("safemode_version"));
}

#[test]
fn test_version_gen7() {
    let info: VersionInfo = serde_json::from_str(&load_fixture("version_gen7.json")).unwrap();

    assert_eq!(info.firmware_version, "SonicOS 7.0.1-5116");
    assert_eq!(info.generation(), Some(FirmwareGeneration::Seven));
    assert_eq!(info.extra.get("product_code"), Some(&Value::from(35400_u64)));
}

#[test]
fn test_take_address_object_records() {
    let mut response = ApiResponse::Appliance(load_json("address_objects_ipv4.json"));

    let records = response.take_records("address_objects").unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[1]["ipv4"]["network"]["mask"], "255.255.255.0");
    assert!(response.records("address_objects").is_none());
}

#[test]
fn test_unmodified_records_post_back_with_same_keys() {
    let fetched = load_json("address_objects_ipv4.json");
    let records = fetched["address_objects"].as_array().unwrap().clone();

    let request = ResourceRequest::new(
        ResourceKind::AddressObject(AddressObjectType::Ipv4),
        Verb::Post,
    )
    .with_records(records);
    let body = request.body().unwrap();

    assert_eq!(body, fetched);
    for (sent, received) in body["address_objects"]
        .as_array()
        .unwrap()
        .iter()
        .zip(fetched["address_objects"].as_array().unwrap())
    {
        assert_eq!(object_keys(&sent["ipv4"]), object_keys(&received["ipv4"]));
    }
}

#[test]
fn test_bulk_zones_put_back_under_plural_key() {
    let fetched = load_json("zones.json");
    let records = fetched["zones"].as_array().unwrap().clone();

    let bulk = ResourceRequest::new(ResourceKind::Zone, Verb::Put).with_records(records.clone());
    assert_eq!(bulk.body().unwrap(), fetched);

    let single = ResourceRequest::new(ResourceKind::Zone, Verb::Put)
        .with_selector(Some(Selector::name("LAN")))
        .with_records(records[..1].to_vec());
    assert_eq!(single.path().unwrap(), "zones/name/LAN");
    assert_eq!(single.body().unwrap()["zone"][0]["security_type"], "trusted");
}
