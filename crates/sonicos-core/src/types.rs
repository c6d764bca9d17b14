//! Core SonicOS domain types.
//!
//! These enums carry the wire spelling of every path segment the management API
//! understands, so that request paths are assembled from typed values rather
//! than free-form strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Default HTTPS port of the management interface
pub const DEFAULT_HTTPS_PORT: u16 = 443;

/// Path prefix of the REST API below the appliance root
pub const API_PREFIX: &str = "api/sonicos/";

/// Implements `Display` and `FromStr` from a table of wire names.
macro_rules! wire_enum {
    ($name:ident, $what:expr, { $($variant:ident => $wire:expr),+ $(,)? }) => {
        impl $name {
            /// Returns the wire spelling used in request paths.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                match s.to_ascii_lowercase().as_str() {
                    $($wire => Ok(Self::$variant),)+
                    _ => Err(Error::InvalidRequest(format!("Unknown {}: {s}", $what))),
                }
            }
        }
    };
}

/// IP address family of a versioned resource collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpVersion {
    /// IPv4 collection
    #[default]
    Ipv4,
    /// IPv6 collection
    Ipv6,
}

wire_enum!(IpVersion, "IP version", {
    Ipv4 => "ipv4",
    Ipv6 => "ipv6",
});

/// Address object families exposed under `address-objects/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressObjectType {
    /// IPv4 host, range and network objects
    #[default]
    Ipv4,
    /// IPv6 host, range and network objects
    Ipv6,
    /// MAC address objects
    Mac,
    /// FQDN address objects
    Fqdn,
}

wire_enum!(AddressObjectType, "address object type", {
    Ipv4 => "ipv4",
    Ipv6 => "ipv6",
    Mac => "mac",
    Fqdn => "fqdn",
});

impl From<IpVersion> for AddressObjectType {
    fn from(version: IpVersion) -> Self {
        match version {
            IpVersion::Ipv4 => Self::Ipv4,
            IpVersion::Ipv6 => Self::Ipv6,
        }
    }
}

/// HTTP verb requested for a resource operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verb {
    /// Read
    #[default]
    Get,
    /// Create
    Post,
    /// Replace
    Put,
    /// Partial update
    Patch,
    /// Remove
    Delete,
}

wire_enum!(Verb, "method", {
    Get => "get",
    Post => "post",
    Put => "put",
    Patch => "patch",
    Delete => "delete",
});

impl Verb {
    /// Whether requests with this verb carry a JSON body.
    ///
    /// DELETE never carries one, even when records are supplied.
    #[must_use]
    pub const fn carries_body(&self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }

    /// The HTTP method for this verb.
    #[must_use]
    pub fn method(&self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Patch => reqwest::Method::PATCH,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

/// HTTP authentication scheme used against the appliance.
///
/// The appliance must have the matching mode enabled on its side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    /// RFC 2617 basic access authentication
    #[default]
    Basic,
    /// RFC 2617 / RFC 7616 digest access authentication
    Digest,
}

wire_enum!(AuthMethod, "authentication method", {
    Basic => "basic",
    Digest => "digest",
});

/// Major firmware line of the appliance.
///
/// SonicOS 7 renamed the `access-rules` endpoint family to `security-policies`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FirmwareGeneration {
    /// SonicOS 6.x (and anything not recognised as 7)
    #[default]
    #[serde(rename = "6")]
    Six,
    /// SonicOS 7.x
    #[serde(rename = "7")]
    Seven,
}

impl FirmwareGeneration {
    /// Derive the generation from a `firmware_version` string such as
    /// `"SonicOS 7.0.1-5116"`.
    ///
    /// Looks at the first character of the last whitespace-delimited token:
    /// `'7'` selects [`Self::Seven`], anything else [`Self::Six`]. Returns
    /// `None` when the string has no token at all.
    #[must_use]
    pub fn from_firmware_version(version: &str) -> Option<Self> {
        let token = version.split_whitespace().next_back()?;
        match token.chars().next()? {
            '7' => Some(Self::Seven),
            _ => Some(Self::Six),
        }
    }

    /// Path segment of the policy endpoint family.
    #[must_use]
    pub const fn policy_path(&self) -> &'static str {
        match self {
            Self::Six => "access-rules",
            Self::Seven => "security-policies",
        }
    }

    /// Envelope key of the policy collection.
    #[must_use]
    pub const fn policy_key(&self) -> &'static str {
        match self {
            Self::Six => "access_rules",
            Self::Seven => "security_policies",
        }
    }
}

impl fmt::Display for FirmwareGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Six => f.write_str("6"),
            Self::Seven => f.write_str("7"),
        }
    }
}

/// VPN policy families exposed under `vpn/policies/{ip}/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VpnPolicyType {
    /// Site-to-site tunnels
    #[default]
    SiteToSite,
    /// Route-based tunnel interfaces
    TunnelInterface,
    /// GroupVPN client policies
    GroupVpn,
}

wire_enum!(VpnPolicyType, "VPN policy type", {
    SiteToSite => "site-to-site",
    TunnelInterface => "tunnel-interface",
    GroupVpn => "group-vpn",
});

/// Unit of a relative restart delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    /// Minutes
    Minutes,
    /// Hours
    Hours,
    /// Days
    Days,
}

wire_enum!(TimeUnit, "time unit", {
    Minutes => "minutes",
    Hours => "hours",
    Days => "days",
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        assert_eq!(IpVersion::Ipv6.as_str(), "ipv6");
        assert_eq!(AddressObjectType::Fqdn.to_string(), "fqdn");
        assert_eq!(VpnPolicyType::TunnelInterface.as_str(), "tunnel-interface");
        assert_eq!(TimeUnit::Hours.to_string(), "hours");
        assert_eq!(Verb::Patch.as_str(), "patch");
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("GET".parse::<Verb>().unwrap(), Verb::Get);
        assert_eq!("Delete".parse::<Verb>().unwrap(), Verb::Delete);
        assert_eq!("IPv4".parse::<IpVersion>().unwrap(), IpVersion::Ipv4);
        assert_eq!("digest".parse::<AuthMethod>().unwrap(), AuthMethod::Digest);
    }

    #[test]
    fn test_parse_unknown_value() {
        let err = "options".parse::<Verb>().unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
        assert!("ipv5".parse::<IpVersion>().is_err());
    }

    #[test]
    fn test_verb_body_rules() {
        assert!(!Verb::Get.carries_body());
        assert!(!Verb::Delete.carries_body());
        assert!(Verb::Post.carries_body());
        assert!(Verb::Put.carries_body());
        assert!(Verb::Patch.carries_body());
        assert_eq!(Verb::Patch.method(), reqwest::Method::PATCH);
    }

    #[test]
    fn test_firmware_generation_from_version() {
        assert_eq!(
            FirmwareGeneration::from_firmware_version("SonicOS 7.0.1-5116"),
            Some(FirmwareGeneration::Seven)
        );
        assert_eq!(
            FirmwareGeneration::from_firmware_version("SonicOS 6.5.4-10"),
            Some(FirmwareGeneration::Six)
        );
        assert_eq!(
            FirmwareGeneration::from_firmware_version("SonicOS Enhanced 6.2.7.1-23n"),
            Some(FirmwareGeneration::Six)
        );
        assert_eq!(FirmwareGeneration::from_firmware_version("   "), None);
    }

    #[test]
    fn test_firmware_generation_paths() {
        assert_eq!(FirmwareGeneration::Six.policy_path(), "access-rules");
        assert_eq!(FirmwareGeneration::Six.policy_key(), "access_rules");
        assert_eq!(FirmwareGeneration::Seven.policy_path(), "security-policies");
        assert_eq!(FirmwareGeneration::Seven.policy_key(), "security_policies");
        assert_eq!(FirmwareGeneration::default(), FirmwareGeneration::Six);
    }

    #[test]
    fn test_serde_wire_names() {
        let json = serde_json::to_string(&VpnPolicyType::SiteToSite).unwrap();
        assert_eq!(json, "\"site-to-site\"");

        let generation: FirmwareGeneration = serde_json::from_str("\"7\"").unwrap();
        assert_eq!(generation, FirmwareGeneration::Seven);

        let method: AuthMethod = serde_json::from_str("\"digest\"").unwrap();
        assert_eq!(method, AuthMethod::Digest);
    }

    #[test]
    fn test_address_object_type_from_ip_version() {
        assert_eq!(
            AddressObjectType::from(IpVersion::Ipv6),
            AddressObjectType::Ipv6
        );
    }
}
