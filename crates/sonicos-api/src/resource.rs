//! Resource kinds and request construction.
//!
//! Everything here is pure: a [`ResourceRequest`] turns into a request path
//! and an optional JSON body without touching the network.

use crate::Result;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde_json::{Map, Value};
use sonicos_core::types::{AddressObjectType, FirmwareGeneration, IpVersion, Verb, VpnPolicyType};
use sonicos_core::Error;
use std::fmt;
use uuid::Uuid;

/// Characters escaped inside a single path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Escape `value` as a single path segment.
///
/// Empty, `.` and `..` are refused: URL resolution drops or collapses them,
/// which would retarget the request at the parent collection. Escaping the
/// dots does not help since `%2e` is treated as a dot as well.
pub(crate) fn path_segment(value: &str, what: &str) -> Result<String> {
    if matches!(value, "" | "." | "..") {
        return Err(Error::InvalidRequest(format!(
            "{what} {value:?} cannot be used as a path segment"
        )));
    }
    Ok(utf8_percent_encode(value, SEGMENT).to_string())
}

/// Selects a single object inside a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Object name
    Name(String),
    /// Object UUID
    Uuid(Uuid),
}

impl Selector {
    /// Select by name.
    #[must_use]
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    /// Select by UUID given in text form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUuid`] if `uuid` does not parse.
    pub fn uuid_str(uuid: &str) -> Result<Self> {
        Ok(Self::Uuid(Uuid::parse_str(uuid)?))
    }

    /// Path suffix, `name/{name}` or `uuid/{uuid}`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] for names that are empty, `.` or `..`.
    pub fn segment(&self) -> Result<String> {
        match self {
            Self::Name(name) => Ok(format!("name/{}", path_segment(name, "object name")?)),
            Self::Uuid(uuid) => Ok(format!("uuid/{uuid}")),
        }
    }
}

impl From<Uuid> for Selector {
    fn from(uuid: Uuid) -> Self {
        Self::Uuid(uuid)
    }
}

/// Firewall configuration object categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// `address-objects/{type}/`
    AddressObject(AddressObjectType),
    /// `address-groups/{ip}/`
    AddressGroup(IpVersion),
    /// `service-objects/`
    ServiceObject,
    /// `service-groups/`
    ServiceGroup,
    /// `zones/`
    Zone,
    /// `nat-policies/{ip}/`
    NatPolicy(IpVersion),
    /// `access-rules/{ip}/` or `security-policies/{ip}/`
    AccessRule(IpVersion, FirmwareGeneration),
    /// `route-policies/{ip}/`
    RoutePolicy(IpVersion),
    /// `vpn/policies/{ip}/{type}/`
    VpnPolicy(IpVersion, VpnPolicyType),
}

impl ResourceKind {
    /// Collection path, always ending in `/`.
    #[must_use]
    pub fn base_path(&self) -> String {
        match self {
            Self::AddressObject(object_type) => format!("address-objects/{object_type}/"),
            Self::AddressGroup(ip) => format!("address-groups/{ip}/"),
            Self::ServiceObject => "service-objects/".to_string(),
            Self::ServiceGroup => "service-groups/".to_string(),
            Self::Zone => "zones/".to_string(),
            Self::NatPolicy(ip) => format!("nat-policies/{ip}/"),
            Self::AccessRule(ip, generation) => format!("{}/{ip}/", generation.policy_path()),
            Self::RoutePolicy(ip) => format!("route-policies/{ip}/"),
            Self::VpnPolicy(ip, vpn_type) => format!("vpn/policies/{ip}/{vpn_type}/"),
        }
    }

    /// Envelope key wrapping the records, `None` for raw payloads.
    ///
    /// Zones switch to the singular `zone` when a single object is selected.
    #[must_use]
    pub const fn envelope_key(&self, selected: bool) -> Option<&'static str> {
        match self {
            Self::AddressObject(_) => Some("address_objects"),
            Self::AddressGroup(_) => Some("address_groups"),
            Self::ServiceObject => Some("service_objects"),
            Self::ServiceGroup => Some("service_groups"),
            Self::Zone if selected => Some("zone"),
            Self::Zone => Some("zones"),
            Self::NatPolicy(_) => Some("nat_policies"),
            Self::AccessRule(_, generation) => Some(generation.policy_key()),
            Self::RoutePolicy(_) => Some("route_policies"),
            Self::VpnPolicy(..) => None,
        }
    }

    /// Whether the API accepts `verb` for this kind.
    #[must_use]
    pub const fn allows(&self, verb: Verb) -> bool {
        match verb {
            Verb::Get | Verb::Post | Verb::Put | Verb::Delete => true,
            Verb::Patch => matches!(self, Self::VpnPolicy(..)),
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.base_path().trim_end_matches('/'))
    }
}

/// Body of a resource request.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Records wrapped under the kind's envelope key
    Records(Vec<Value>),
    /// JSON sent as-is; `Null` sends no body
    Raw(Value),
}

impl Default for Payload {
    fn default() -> Self {
        Self::Records(Vec::new())
    }
}

/// One operation against a resource collection.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceRequest {
    /// Target collection
    pub kind: ResourceKind,
    /// HTTP verb
    pub verb: Verb,
    /// Optional single-object selector
    pub selector: Option<Selector>,
    /// Body for POST, PUT and PATCH
    pub payload: Payload,
}

impl ResourceRequest {
    /// Request with no selector and an empty record list.
    #[must_use]
    pub fn new(kind: ResourceKind, verb: Verb) -> Self {
        Self {
            kind,
            verb,
            selector: None,
            payload: Payload::default(),
        }
    }

    /// Target a single object.
    #[must_use]
    pub fn with_selector(mut self, selector: Option<Selector>) -> Self {
        self.selector = selector;
        self
    }

    /// Records to send.
    #[must_use]
    pub fn with_records(mut self, records: Vec<Value>) -> Self {
        self.payload = Payload::Records(records);
        self
    }

    /// Raw JSON to send.
    #[must_use]
    pub fn with_raw(mut self, data: Value) -> Self {
        self.payload = Payload::Raw(data);
        self
    }

    /// Whether the verb is accepted for the kind.
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        self.kind.allows(self.verb)
    }

    /// Request path relative to the API base.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] when the selector cannot form a path
    /// segment.
    pub fn path(&self) -> Result<String> {
        let mut path = self.kind.base_path();
        if let Some(selector) = &self.selector {
            path.push_str(&selector.segment()?);
        }
        Ok(path)
    }

    /// JSON body, or `None` for verbs that carry no body.
    #[must_use]
    pub fn body(&self) -> Option<Value> {
        if !self.verb.carries_body() {
            return None;
        }

        match &self.payload {
            Payload::Raw(Value::Null) => None,
            Payload::Raw(data) => Some(data.clone()),
            Payload::Records(records) => {
                let records = Value::Array(records.clone());
                match self.kind.envelope_key(self.selector.is_some()) {
                    Some(key) => {
                        let mut envelope = Map::new();
                        envelope.insert(key.to_string(), records);
                        Some(Value::Object(envelope))
                    }
                    None => Some(records),
                }
            }
        }
    }
}
