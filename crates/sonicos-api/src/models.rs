//! Response envelopes and request models for the SonicOS API.

use crate::resource::path_segment;
use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use sonicos_core::types::{FirmwareGeneration, TimeUnit};
use std::net::{Ipv4Addr, Ipv6Addr};
use tracing::warn;

/// Status code of a successful operation.
pub const E_OK: &str = "E_OK";
/// Status code of a rejected HTTP verb.
pub const E_INVALID: &str = "E_INVALID";
/// Status code of a rejected digest login.
pub const E_UNAUTHORIZED: &str = "E_UNAUTHORIZED";

/// `{ "status": { ... } }` record used by the appliance and by locally
/// synthesized responses.
///
/// The [`Default`] value has `success` unset and no info entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StatusEnvelope {
    /// Status block.
    pub status: Status,
}

/// Status block of a [`StatusEnvelope`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Status {
    /// Outcome flag; absent when nothing was recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    /// Ordered diagnostic entries.
    #[serde(default)]
    pub info: Vec<StatusInfo>,
}

/// One diagnostic entry of a status block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusInfo {
    /// Severity, e.g. `info` or `error`.
    pub level: String,
    /// Machine-readable code, e.g. `E_OK`.
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

impl StatusEnvelope {
    /// Envelope with a single entry and an explicit outcome.
    #[must_use]
    pub fn with_entry(success: bool, level: &str, code: &str, message: &str) -> Self {
        Self {
            status: Status {
                success: Some(success),
                info: vec![StatusInfo {
                    level: level.to_string(),
                    code: code.to_string(),
                    message: message.to_string(),
                }],
            },
        }
    }

    /// `{success: true, info: [{info, E_OK, "Success."}]}`
    #[must_use]
    pub fn ok() -> Self {
        Self::with_entry(true, "info", E_OK, "Success.")
    }

    /// `{success: false, info: [{error, E_INVALID, "Invalid Method."}]}`
    #[must_use]
    pub fn invalid_method() -> Self {
        Self::with_entry(false, "error", E_INVALID, "Invalid Method.")
    }

    /// Whether `success` is explicitly true.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.success == Some(true)
    }

    /// Code of the first info entry.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.status.info.first().map(|info| info.code.as_str())
    }
}

/// Result of a resource operation.
///
/// Pass-through calls return whatever JSON the appliance sent; locally
/// synthesized results (rejected verbs, digest login) carry a
/// [`StatusEnvelope`] built by the client. The two are kept apart so callers
/// can tell which side produced the answer.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    /// Decoded appliance response body
    Appliance(Value),
    /// Status record built by the client without appliance involvement
    Local(StatusEnvelope),
}

impl ApiResponse {
    /// True for locally synthesized responses.
    #[must_use]
    pub const fn is_local(&self) -> bool {
        matches!(self, Self::Local(_))
    }

    /// The appliance JSON, if this is a pass-through response.
    #[must_use]
    pub const fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Appliance(value) => Some(value),
            Self::Local(_) => None,
        }
    }

    /// JSON form of either variant.
    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Self::Appliance(value) => value,
            Self::Local(envelope) => serde_json::to_value(envelope).unwrap_or_default(),
        }
    }

    /// The status block, parsed from the appliance body when present.
    #[must_use]
    pub fn status(&self) -> Option<StatusEnvelope> {
        match self {
            Self::Local(envelope) => Some(envelope.clone()),
            Self::Appliance(value) => {
                let status = value.get("status")?;
                serde_json::from_value(json!({ "status": status })).ok()
            }
        }
    }

    /// Whether the response reports `success: true`.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status().is_some_and(|envelope| envelope.is_success())
    }

    /// Records stored under `key` in an appliance response.
    #[must_use]
    pub fn records(&self, key: &str) -> Option<&Vec<Value>> {
        self.as_value()?.get(key)?.as_array()
    }

    /// Remove and return the records stored under `key`.
    pub fn take_records(&mut self, key: &str) -> Option<Vec<Value>> {
        match self {
            Self::Appliance(Value::Object(map)) => match map.remove(key)? {
                Value::Array(records) => Some(records),
                other => {
                    map.insert(key.to_string(), other);
                    None
                }
            },
            _ => None,
        }
    }
}

/// Explicit outcome of a digest login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// The appliance accepted the credentials (HTTP 200)
    Success,
    /// The appliance answered with something other than HTTP 200
    Failure(String),
    /// No digest challenge was offered, so no credentials were presented
    NotAttempted,
}

impl LoginOutcome {
    /// Whether the login succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Status envelope equivalent.
    ///
    /// [`Self::NotAttempted`] maps to the default envelope with `success`
    /// unset.
    #[must_use]
    pub fn into_envelope(self) -> StatusEnvelope {
        match self {
            Self::Success => StatusEnvelope::ok(),
            Self::Failure(reason) => {
                StatusEnvelope::with_entry(false, "error", E_UNAUTHORIZED, &reason)
            }
            Self::NotAttempted => StatusEnvelope::default(),
        }
    }
}

/// Body of the `version` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VersionInfo {
    /// Firmware string, e.g. `SonicOS 7.0.1-5116`.
    pub firmware_version: String,
    /// Appliance model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Serial number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    /// ROM version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rom_version: Option<String>,
    /// Uptime as reported by the appliance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_uptime: Option<String>,
    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VersionInfo {
    /// Firmware generation encoded in [`Self::firmware_version`].
    #[must_use]
    pub fn generation(&self) -> Option<FirmwareGeneration> {
        FirmwareGeneration::from_firmware_version(&self.firmware_version)
    }
}

/// When a restart should happen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestartSchedule {
    /// Immediately
    Now,
    /// At an absolute appliance timestamp
    At(String),
    /// After a relative delay
    In(u32, TimeUnit),
}

impl RestartSchedule {
    /// Request path for this schedule. The timestamp is escaped as a single
    /// path segment.
    ///
    /// # Errors
    ///
    /// Returns [`sonicos_core::Error::InvalidRequest`] for an empty, `.` or
    /// `..` timestamp.
    pub fn path(&self) -> Result<String> {
        match self {
            Self::Now => Ok("restart/".to_string()),
            Self::At(timestamp) => Ok(format!(
                "restart/at/{}",
                path_segment(timestamp, "restart timestamp")?
            )),
            Self::In(amount, unit) => Ok(format!("restart/in/{amount}/{unit}")),
        }
    }
}

/// Restart parameters.
///
/// At most one time specifier is honoured. When none or several are given the
/// restart is immediate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestartRequest {
    /// Absolute timestamp, passed through verbatim
    pub at: Option<String>,
    /// Delay in minutes
    pub minutes: Option<u32>,
    /// Delay in hours
    pub hours: Option<u32>,
    /// Delay in days
    pub days: Option<u32>,
}

impl RestartRequest {
    /// Restart immediately.
    #[must_use]
    pub fn now() -> Self {
        Self::default()
    }

    /// Restart at an absolute timestamp.
    #[must_use]
    pub fn at(mut self, timestamp: impl Into<String>) -> Self {
        self.at = Some(timestamp.into());
        self
    }

    /// Restart after `minutes`.
    #[must_use]
    pub const fn minutes(mut self, minutes: u32) -> Self {
        self.minutes = Some(minutes);
        self
    }

    /// Restart after `hours`.
    #[must_use]
    pub const fn hours(mut self, hours: u32) -> Self {
        self.hours = Some(hours);
        self
    }

    /// Restart after `days`.
    #[must_use]
    pub const fn days(mut self, days: u32) -> Self {
        self.days = Some(days);
        self
    }

    /// Resolve the specifiers into a single schedule.
    #[must_use]
    pub fn schedule(&self) -> RestartSchedule {
        let given = usize::from(self.at.is_some())
            + usize::from(self.minutes.is_some())
            + usize::from(self.hours.is_some())
            + usize::from(self.days.is_some());

        if given > 1 {
            warn!(request = ?self, "conflicting restart specifiers, restarting immediately");
            return RestartSchedule::Now;
        }

        match (&self.at, self.minutes, self.hours, self.days) {
            (Some(timestamp), ..) => RestartSchedule::At(timestamp.clone()),
            (_, Some(minutes), ..) => RestartSchedule::In(minutes, TimeUnit::Minutes),
            (_, _, Some(hours), _) => RestartSchedule::In(hours, TimeUnit::Hours),
            (.., Some(days)) => RestartSchedule::In(days, TimeUnit::Days),
            _ => RestartSchedule::Now,
        }
    }

    /// Request path for the resolved schedule.
    ///
    /// # Errors
    ///
    /// See [`RestartSchedule::path`].
    pub fn path(&self) -> Result<String> {
        self.schedule().path()
    }
}

/// Address object record for a single IPv4 host.
#[must_use]
pub fn ipv4_host_object(name: &str, zone: &str, address: Ipv4Addr) -> Value {
    json!({
        "ipv4": {
            "name": name,
            "zone": zone,
            "host": { "ip": address.to_string() }
        }
    })
}

/// Address object record for a single IPv6 host.
#[must_use]
pub fn ipv6_host_object(name: &str, zone: &str, address: Ipv6Addr) -> Value {
    json!({
        "ipv6": {
            "name": name,
            "zone": zone,
            "host": { "ip": address.to_string() }
        }
    })
}
