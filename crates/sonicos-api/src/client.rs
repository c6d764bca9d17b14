//! Asynchronous SonicOS client implementation.

use crate::auth::{send_with_digest, DigestExchange};
use crate::models::{
    ipv4_host_object, ApiResponse, LoginOutcome, RestartRequest, StatusEnvelope, VersionInfo,
};
use crate::resource::{Payload, ResourceKind, ResourceRequest, Selector};
use crate::Result;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use sonicos_core::client::{
    ClientConfig, HttpReply, HttpRequest, RequestAuth, ReqwestTransport, Transport,
};
use sonicos_core::config::{ConnectionConfig, Credentials};
use sonicos_core::types::{
    AddressObjectType, AuthMethod, FirmwareGeneration, IpVersion, Verb, VpnPolicyType,
};
use sonicos_core::Error;
use std::fmt;
use std::net::Ipv4Addr;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};
use url::Url;

/// Builder for [`SonicOsClient`].
#[derive(Clone)]
pub struct SonicOsClientBuilder {
    config: ConnectionConfig,
    http: ClientConfig,
    base_url: Option<String>,
    transport: Option<Arc<dyn Transport>>,
}

impl SonicOsClientBuilder {
    /// Create a builder for the given appliance connection.
    #[must_use]
    pub fn new(config: ConnectionConfig) -> Self {
        let http = ClientConfig::from_connection(&config);
        Self {
            config,
            http,
            base_url: None,
            transport: None,
        }
    }

    /// Override the HTTP client configuration.
    #[must_use]
    pub fn with_http_config(mut self, config: ClientConfig) -> Self {
        self.http = config;
        self
    }

    /// Use `base_url` instead of `https://{host}:{port}/api/sonicos/`.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> Self {
        self.base_url = Some(base_url.as_ref().to_string());
        self
    }

    /// Send requests through `transport` instead of a `reqwest` client.
    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client cannot
    /// be constructed.
    pub fn build(self) -> Result<SonicOsClient> {
        let mut base_url = match &self.base_url {
            Some(url) => Url::parse(url)
                .map_err(|e| Error::ConfigError(format!("Invalid base URL {url}: {e}")))?,
            None => self.config.base_url()?,
        };
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(&self.http)?),
        };

        debug!(%base_url, auth = %self.config.auth_method, "built SonicOS client");

        Ok(SonicOsClient {
            transport,
            base_url,
            credentials: Arc::new(self.config.credentials()),
            auth_method: self.config.auth_method,
            pinned: self.config.firmware_generation,
            generation: Arc::new(OnceCell::new()),
        })
    }
}

/// Asynchronous SonicOS client.
///
/// The configured authentication mode is only a default. Requests go through
/// a [`Session`], which carries its mode explicitly, so one client can be
/// shared between tasks that authenticate differently.
#[derive(Clone)]
pub struct SonicOsClient {
    transport: Arc<dyn Transport>,
    base_url: Url,
    credentials: Arc<Credentials>,
    auth_method: AuthMethod,
    pinned: Option<FirmwareGeneration>,
    generation: Arc<OnceCell<FirmwareGeneration>>,
}

impl fmt::Debug for SonicOsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SonicOsClient")
            .field("base_url", &self.base_url.as_str())
            .field("credentials", &self.credentials)
            .field("auth_method", &self.auth_method)
            .field("firmware_generation", &self.pinned.or(self.generation.get().copied()))
            .finish_non_exhaustive()
    }
}

impl SonicOsClient {
    /// Construct a client with default HTTP settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the appliance address is invalid or the HTTP
    /// client cannot be constructed.
    pub fn new(config: ConnectionConfig) -> Result<Self> {
        SonicOsClientBuilder::new(config).build()
    }

    /// Create a builder.
    #[must_use]
    pub fn builder(config: ConnectionConfig) -> SonicOsClientBuilder {
        SonicOsClientBuilder::new(config)
    }

    /// Return the base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Authentication mode from the connection configuration.
    #[must_use]
    pub const fn auth_method(&self) -> AuthMethod {
        self.auth_method
    }

    /// Session using the configured authentication mode.
    #[must_use]
    pub const fn session(&self) -> Session<'_> {
        self.with_auth(self.auth_method)
    }

    /// Session using `auth` for every request.
    #[must_use]
    pub const fn with_auth(&self, auth: AuthMethod) -> Session<'_> {
        Session { client: self, auth }
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::InvalidEndpoint(format!("{path}: {e}")))
    }
}

/// A client paired with the authentication mode used for its requests.
#[derive(Debug, Clone, Copy)]
pub struct Session<'a> {
    client: &'a SonicOsClient,
    auth: AuthMethod,
}

impl Session<'_> {
    /// Authentication mode of this session.
    #[must_use]
    pub const fn auth_method(&self) -> AuthMethod {
        self.auth
    }

    /// Log in to the appliance.
    ///
    /// Basic mode POSTs to `auth` and returns the appliance body. Digest mode
    /// runs [`Self::digest_login`] and returns its outcome as a local status
    /// envelope.
    ///
    /// # Errors
    ///
    /// Returns transport errors, and decode errors in basic mode.
    pub async fn login(&self) -> Result<ApiResponse> {
        match self.auth {
            AuthMethod::Basic => self.call(Method::POST, "auth", None).await,
            AuthMethod::Digest => Ok(ApiResponse::Local(
                self.digest_login().await?.into_envelope(),
            )),
        }
    }

    /// HEAD `auth` through the digest handshake.
    ///
    /// # Errors
    ///
    /// Returns transport errors and malformed digest challenges.
    pub async fn digest_login(&self) -> Result<LoginOutcome> {
        let request = self.client.request(Method::HEAD, "auth", None)?;
        info!(method = "HEAD", path = "auth", "SonicOS digest login");

        let exchange = send_with_digest(
            self.client.transport.as_ref(),
            &self.client.credentials,
            request,
        )
        .await?;

        let outcome = match exchange {
            DigestExchange::NoChallenge(_) => LoginOutcome::NotAttempted,
            DigestExchange::Unchallenged(reply) | DigestExchange::Answered(reply)
                if reply.status == StatusCode::OK =>
            {
                LoginOutcome::Success
            }
            DigestExchange::Unchallenged(reply) | DigestExchange::Answered(reply) => {
                LoginOutcome::Failure(format!("appliance answered HTTP {}", reply.status))
            }
        };

        if !outcome.is_success() {
            warn!(?outcome, "SonicOS digest login did not succeed");
        }
        Ok(outcome)
    }

    /// Log out (DELETE `auth`).
    ///
    /// # Errors
    ///
    /// Returns transport and decode errors.
    pub async fn logout(&self) -> Result<ApiResponse> {
        self.call(Method::DELETE, "auth", None).await
    }

    /// Raw `version` response.
    ///
    /// # Errors
    ///
    /// Returns transport and decode errors.
    pub async fn version(&self) -> Result<ApiResponse> {
        self.call(Method::GET, "version", None).await
    }

    /// Typed `version` response.
    ///
    /// # Errors
    ///
    /// Returns transport errors, or a decode error when the body carries no
    /// `firmware_version`.
    pub async fn version_info(&self) -> Result<VersionInfo> {
        self.send(Method::GET, "version", None).await?.json()
    }

    /// Firmware generation used to address access rules.
    ///
    /// A generation pinned in the configuration wins. Otherwise the appliance
    /// is detected once per client; a failed detection assumes SonicOS 6 and is
    /// retried on the next call.
    pub async fn firmware_generation(&self) -> FirmwareGeneration {
        if let Some(generation) = self.client.pinned {
            return generation;
        }
        match self
            .client
            .generation
            .get_or_try_init(|| self.detect_generation())
            .await
        {
            Ok(generation) => *generation,
            Err(err) => {
                warn!(error = %err, "firmware detection failed, assuming SonicOS 6");
                FirmwareGeneration::Six
            }
        }
    }

    async fn detect_generation(&self) -> Result<FirmwareGeneration> {
        let info = self.version_info().await?;
        let generation = info.generation().ok_or_else(|| {
            Error::DecodeError(format!(
                "Unrecognised firmware version {:?}",
                info.firmware_version
            ))
        })?;
        debug!(%generation, "detected SonicOS firmware generation");
        Ok(generation)
    }

    /// Run a resource request.
    ///
    /// A verb the kind does not accept yields a local `E_INVALID` envelope
    /// and nothing is sent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] without sending anything when the
    /// selector cannot form a path segment, and transport and decode errors.
    pub async fn execute(&self, request: &ResourceRequest) -> Result<ApiResponse> {
        if !request.is_allowed() {
            warn!(kind = %request.kind, verb = %request.verb, "rejecting unsupported verb");
            return Ok(ApiResponse::Local(StatusEnvelope::invalid_method()));
        }

        let path = request.path()?;
        let body = request.body();
        self.call(request.verb.method(), &path, body.as_ref()).await
    }

    /// Like [`Self::execute`], with the verb given by name.
    ///
    /// Unknown verb names are rejected the same way as unsupported ones.
    ///
    /// # Errors
    ///
    /// Returns transport and decode errors.
    pub async fn execute_named(
        &self,
        kind: ResourceKind,
        verb: &str,
        selector: Option<Selector>,
        payload: Payload,
    ) -> Result<ApiResponse> {
        let Ok(verb) = verb.parse::<Verb>() else {
            warn!(%kind, verb, "rejecting unknown verb");
            return Ok(ApiResponse::Local(StatusEnvelope::invalid_method()));
        };

        let mut request = ResourceRequest::new(kind, verb).with_selector(selector);
        request.payload = payload;
        self.execute(&request).await
    }

    /// `address-objects/{type}/`.
    ///
    /// # Errors
    ///
    /// Returns transport and decode errors.
    pub async fn address_objects(
        &self,
        object_type: AddressObjectType,
        verb: Verb,
        selector: Option<Selector>,
        records: Vec<Value>,
    ) -> Result<ApiResponse> {
        self.records_call(ResourceKind::AddressObject(object_type), verb, selector, records)
            .await
    }

    /// `address-groups/{ip}/`.
    ///
    /// # Errors
    ///
    /// Returns transport and decode errors.
    pub async fn address_groups(
        &self,
        ip: IpVersion,
        verb: Verb,
        selector: Option<Selector>,
        records: Vec<Value>,
    ) -> Result<ApiResponse> {
        self.records_call(ResourceKind::AddressGroup(ip), verb, selector, records)
            .await
    }

    /// `service-objects/`.
    ///
    /// # Errors
    ///
    /// Returns transport and decode errors.
    pub async fn service_objects(
        &self,
        verb: Verb,
        selector: Option<Selector>,
        records: Vec<Value>,
    ) -> Result<ApiResponse> {
        self.records_call(ResourceKind::ServiceObject, verb, selector, records)
            .await
    }

    /// `service-groups/`.
    ///
    /// # Errors
    ///
    /// Returns transport and decode errors.
    pub async fn service_groups(
        &self,
        verb: Verb,
        selector: Option<Selector>,
        records: Vec<Value>,
    ) -> Result<ApiResponse> {
        self.records_call(ResourceKind::ServiceGroup, verb, selector, records)
            .await
    }

    /// `zones/`. The body key is `zone` when a selector is given.
    ///
    /// # Errors
    ///
    /// Returns transport and decode errors.
    pub async fn zones(
        &self,
        verb: Verb,
        selector: Option<Selector>,
        records: Vec<Value>,
    ) -> Result<ApiResponse> {
        self.records_call(ResourceKind::Zone, verb, selector, records)
            .await
    }

    /// `nat-policies/{ip}/`.
    ///
    /// # Errors
    ///
    /// Returns transport and decode errors.
    pub async fn nat_policies(
        &self,
        ip: IpVersion,
        verb: Verb,
        selector: Option<Selector>,
        records: Vec<Value>,
    ) -> Result<ApiResponse> {
        self.records_call(ResourceKind::NatPolicy(ip), verb, selector, records)
            .await
    }

    /// `access-rules/{ip}/` on SonicOS 6, `security-policies/{ip}/` on 7.
    ///
    /// The verb and selector are checked before the firmware generation is
    /// resolved.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] for an unusable selector, and
    /// transport and decode errors. A failed firmware detection is not an error.
    pub async fn access_rules(
        &self,
        ip: IpVersion,
        verb: Verb,
        selector: Option<Selector>,
        records: Vec<Value>,
    ) -> Result<ApiResponse> {
        let undetected = ResourceKind::AccessRule(ip, FirmwareGeneration::default());
        if !undetected.allows(verb) {
            return self.execute(&ResourceRequest::new(undetected, verb)).await;
        }
        if let Some(selector) = &selector {
            selector.segment()?;
        }

        let generation = self.firmware_generation().await;
        self.records_call(ResourceKind::AccessRule(ip, generation), verb, selector, records)
            .await
    }

    /// `route-policies/{ip}/`.
    ///
    /// # Errors
    ///
    /// Returns transport and decode errors.
    pub async fn route_policies(
        &self,
        ip: IpVersion,
        verb: Verb,
        selector: Option<Selector>,
        records: Vec<Value>,
    ) -> Result<ApiResponse> {
        self.records_call(ResourceKind::RoutePolicy(ip), verb, selector, records)
            .await
    }

    /// `vpn/policies/{ip}/{type}/`. `data` is sent as-is; PATCH is accepted.
    ///
    /// # Errors
    ///
    /// Returns transport and decode errors.
    pub async fn vpn_policies(
        &self,
        ip: IpVersion,
        vpn_type: VpnPolicyType,
        verb: Verb,
        name: Option<&str>,
        data: Option<Value>,
    ) -> Result<ApiResponse> {
        let request = ResourceRequest::new(ResourceKind::VpnPolicy(ip, vpn_type), verb)
            .with_selector(name.map(Selector::name))
            .with_raw(data.unwrap_or(Value::Null));
        self.execute(&request).await
    }

    /// GET a collection and return just its records.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] without sending anything for kinds
    /// without a record collection (VPN policies), and transport and decode
    /// errors, including a reply without the collection key.
    pub async fn list(&self, kind: ResourceKind) -> Result<Vec<Value>> {
        let key = kind.envelope_key(false).ok_or_else(|| {
            Error::InvalidRequest(format!("{kind} has no record collection"))
        })?;

        let request = ResourceRequest::new(kind, Verb::Get);
        let mut response = self.execute(&request).await?;
        response
            .take_records(key)
            .ok_or_else(|| Error::DecodeError(format!("{kind} reply has no {key} list")))
    }

    /// Create a single IPv4 host address object.
    ///
    /// # Errors
    ///
    /// Returns transport and decode errors.
    pub async fn create_ipv4_host_object(
        &self,
        name: &str,
        zone: &str,
        address: Ipv4Addr,
    ) -> Result<ApiResponse> {
        self.address_objects(
            AddressObjectType::Ipv4,
            Verb::Post,
            None,
            vec![ipv4_host_object(name, zone, address)],
        )
        .await
    }

    /// Take the configuration-mode lock (POST `config-mode`).
    ///
    /// # Errors
    ///
    /// Returns transport and decode errors.
    pub async fn preempt(&self) -> Result<ApiResponse> {
        self.call(Method::POST, "config-mode", None).await
    }

    /// Release the configuration-mode lock (POST `non-config-mode`).
    ///
    /// # Errors
    ///
    /// Returns transport and decode errors.
    pub async fn non_config(&self) -> Result<ApiResponse> {
        self.call(Method::POST, "non-config-mode", None).await
    }

    /// Running configuration (GET `config/current`).
    ///
    /// # Errors
    ///
    /// Returns transport and decode errors.
    pub async fn config(&self) -> Result<ApiResponse> {
        self.call(Method::GET, "config/current", None).await
    }

    /// Uncommitted changes (GET `config/pending`).
    ///
    /// # Errors
    ///
    /// Returns transport and decode errors.
    pub async fn pending_changes(&self) -> Result<ApiResponse> {
        self.call(Method::GET, "config/pending", None).await
    }

    /// Commit pending changes (POST `config/pending`).
    ///
    /// # Errors
    ///
    /// Returns transport and decode errors.
    pub async fn commit_pending_changes(&self) -> Result<ApiResponse> {
        self.call(Method::POST, "config/pending", None).await
    }

    /// Restart the appliance.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] without sending anything for an
    /// unusable `at` timestamp, and transport and decode errors.
    pub async fn restart(&self, request: &RestartRequest) -> Result<ApiResponse> {
        self.call(Method::POST, &request.path()?, None).await
    }

    async fn records_call(
        &self,
        kind: ResourceKind,
        verb: Verb,
        selector: Option<Selector>,
        records: Vec<Value>,
    ) -> Result<ApiResponse> {
        let request = ResourceRequest::new(kind, verb)
            .with_selector(selector)
            .with_records(records);
        self.execute(&request).await
    }

    async fn call(&self, method: Method, path: &str, body: Option<&Value>) -> Result<ApiResponse> {
        let reply = self.send(method, path, body).await?;
        debug!(status = %reply.status, path, "SonicOS reply");
        reply.json::<Value>().map(ApiResponse::Appliance)
    }

    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<HttpReply> {
        let request = self.client.request(method, path, body)?;
        info!(method = %request.method, path, auth = %self.auth, "SonicOS request");

        match self.auth {
            AuthMethod::Basic => {
                let request =
                    request.with_auth(RequestAuth::Basic(Arc::clone(&self.client.credentials)));
                self.client.transport.send(request).await
            }
            AuthMethod::Digest => send_with_digest(
                self.client.transport.as_ref(),
                &self.client.credentials,
                request,
            )
            .await
            .map(DigestExchange::into_reply),
        }
    }
}

impl SonicOsClient {
    fn request(&self, method: Method, path: &str, body: Option<&Value>) -> Result<HttpRequest> {
        let mut request = HttpRequest::new(method, self.endpoint(path)?)
            .with_header("accept", "application/json")
            .with_header("content-type", "application/json")
            .with_header("accept-encoding", "application/json")
            .with_header("charset", "UTF-8");

        if let Some(body) = body {
            request = request.with_body(serde_json::to_vec(body)?);
        }
        Ok(request)
    }
}
