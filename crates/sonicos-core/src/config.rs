//! Connection configuration for SonicOS clients.
//!
//! A [`ConnectionConfig`] is created once per session and never mutated by the
//! client afterwards. It can be built in code or deserialized from any serde
//! format; the password is never serialized back out.

use crate::error::Error;
use crate::types::{AuthMethod, FirmwareGeneration, API_PREFIX, DEFAULT_HTTPS_PORT};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;
use validator::Validate;

/// Username and password presented to the appliance.
#[derive(Clone)]
pub struct Credentials {
    username: String,
    password: SecretString,
}

impl Credentials {
    /// Create a credential pair.
    #[must_use]
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }

    /// Login name.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Plaintext password, for building authentication headers only.
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.expose_secret()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Connection parameters for one appliance.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ConnectionConfig {
    /// Hostname or IP address of the management interface
    #[validate(length(min = 1, max = 253))]
    pub host: String,

    /// HTTPS port of the management interface
    #[validate(range(min = 1))]
    #[serde(default = "default_port")]
    pub port: u16,

    /// Administrator login
    #[validate(length(min = 1))]
    pub username: String,

    /// Administrator password
    #[serde(skip_serializing, deserialize_with = "deserialize_secret")]
    pub password: SecretString,

    /// Authentication scheme used when none is chosen explicitly
    #[serde(default)]
    pub auth_method: AuthMethod,

    /// Whether to verify the appliance's TLS certificate
    #[serde(default = "default_tls_verify")]
    pub tls_verify: bool,

    /// Optional path to a PEM CA certificate for the appliance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_ca_cert: Option<PathBuf>,

    /// Request timeout in seconds
    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Known firmware generation; skips firmware detection when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firmware_generation: Option<FirmwareGeneration>,
}

const fn default_port() -> u16 {
    DEFAULT_HTTPS_PORT
}

const fn default_tls_verify() -> bool {
    true
}

const fn default_request_timeout_secs() -> u64 {
    30
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

impl ConnectionConfig {
    /// Create a new connection configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] if the host or username is empty or the
    /// port is zero.
    pub fn new(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, Error> {
        let config = Self {
            host: host.into(),
            port,
            username: username.into(),
            password: SecretString::from(password.into()),
            auth_method: AuthMethod::default(),
            tls_verify: default_tls_verify(),
            tls_ca_cert: None,
            request_timeout_secs: default_request_timeout_secs(),
            firmware_generation: None,
        };

        config.validate()?;

        Ok(config)
    }

    /// Set the default authentication scheme.
    #[must_use]
    pub const fn with_auth_method(mut self, method: AuthMethod) -> Self {
        self.auth_method = method;
        self
    }

    /// Set whether to verify TLS certificates.
    ///
    /// Passing `false` accepts any certificate the appliance presents, which
    /// is common for factory self-signed certificates but must be chosen
    /// deliberately.
    #[must_use]
    pub const fn with_tls_verify(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Set custom CA certificate path.
    #[must_use]
    pub fn with_ca_cert(mut self, path: PathBuf) -> Self {
        self.tls_ca_cert = Some(path);
        self
    }

    /// Set request timeout in seconds.
    #[must_use]
    pub const fn with_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout_secs = seconds;
        self
    }

    /// Pin the firmware generation instead of probing the appliance.
    #[must_use]
    pub const fn with_firmware_generation(mut self, generation: FirmwareGeneration) -> Self {
        self.firmware_generation = Some(generation);
        self
    }

    /// Get the request timeout as a Duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Credentials for request authentication.
    #[must_use]
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.username.clone(), self.password.clone())
    }

    /// Build the API base URL, `https://{host}:{port}/api/sonicos/`.
    ///
    /// # Errors
    ///
    /// Returns an error if the host does not form a valid URL.
    pub fn base_url(&self) -> Result<Url, Error> {
        let host = if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };

        Url::parse(&format!("https://{host}:{}/{API_PREFIX}", self.port))
            .map_err(|e| Error::ConfigError(format!("Invalid appliance address: {e}")))
    }
}
