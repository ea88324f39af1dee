//! Bonsai API client core
//!
//! [`Client`] owns the connection pipeline shared by every resource:
//! request construction, rate limiting, throttling retries and error
//! classification.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use reqwest::Method;
use reqwest::header::{
    ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT as USER_AGENT_HEADER,
};
use serde::Serialize;
use tracing::{debug, trace, warn};
use url::Url;

use crate::cancel::Cancellation;
use crate::credential::CredentialPair;
use crate::error::{ApiStatus, Error, Result};
use crate::rate_limit::{
    ClientLimiter, DEFAULT_BURST_ALLOWANCE, DEFAULT_BURST_INTERVAL, PROVISION_BURST_ALLOWANCE,
    PROVISION_BURST_INTERVAL, RateLimiter,
};
use crate::resources::{ClusterClient, PlanClient, ReleaseClient, SpaceClient};
use crate::response::Response;
use crate::transport::{HttpRequest, ReqwestTransport, Transport};

/// Library version reported in the user agent.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Production API endpoint.
pub const BASE_ENDPOINT: &str = "https://api.bonsai.io";

/// Identity sent with every request.
pub const USER_AGENT: &str = concat!("bonsai-api-rs/", env!("CARGO_PKG_VERSION"));

pub const CONTENT_TYPE_JSON: &str = "application/json";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Identifies the program built on top of this library.
///
/// Rendered ahead of [`USER_AGENT`] in the `User-Agent` header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Application {
    pub name: String,
    pub version: String,
}

impl Application {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.name.is_empty(), self.version.is_empty()) {
            (true, _) => Ok(()),
            (false, true) => f.write_str(&self.name),
            (false, false) => write!(f, "{}/{}", self.name, self.version),
        }
    }
}

/// Builder for [`Client`]
#[derive(Debug, Default)]
pub struct ClientBuilder {
    endpoint: Option<String>,
    credentials: CredentialPair,
    application: Option<Application>,
    transport: Option<Arc<dyn Transport>>,
    default_rate_limit: Option<(u32, Duration)>,
    provision_rate_limit: Option<(u32, Duration)>,
    timeout: Option<Duration>,
    cancellation: Option<Cancellation>,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the API endpoint; a trailing `/` is dropped.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn credentials(mut self, credentials: CredentialPair) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn application(mut self, application: Application) -> Self {
        self.application = Some(application);
        self
    }

    /// Replace the HTTP transport. [`timeout`](Self::timeout) is ignored
    /// when a transport is supplied.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn default_rate_limit(mut self, burst: u32, interval: Duration) -> Self {
        self.default_rate_limit = Some((burst, interval));
        self
    }

    pub fn provision_rate_limit(mut self, burst: u32, interval: Duration) -> Self {
        self.provision_rate_limit = Some((burst, interval));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn cancellation(mut self, cancellation: Cancellation) -> Self {
        self.cancellation = Some(cancellation);
        self
    }

    pub fn build(self) -> Result<Client> {
        let endpoint = self
            .endpoint
            .unwrap_or_else(|| BASE_ENDPOINT.to_string())
            .trim_end_matches('/')
            .to_string();
        Url::parse(&endpoint).map_err(|source| Error::InvalidUrl {
            url: endpoint.clone(),
            source,
        })?;

        let user_agent = match self.application.map(|app| app.to_string()) {
            Some(app) if !app.is_empty() => format!("{app} {USER_AGENT}"),
            _ => USER_AGENT.to_string(),
        };
        let user_agent_header = HeaderValue::from_str(&user_agent)
            .map_err(|_| Error::InvalidInput(format!("invalid user agent: {user_agent:?}")))?;

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(self.timeout.unwrap_or(DEFAULT_TIMEOUT))?),
        };

        let (default_burst, default_interval) = self
            .default_rate_limit
            .unwrap_or((DEFAULT_BURST_ALLOWANCE, DEFAULT_BURST_INTERVAL));
        let (provision_burst, provision_interval) = self
            .provision_rate_limit
            .unwrap_or((PROVISION_BURST_ALLOWANCE, PROVISION_BURST_INTERVAL));

        Ok(Client {
            inner: Arc::new(ClientInner {
                transport,
                credentials: self.credentials,
                endpoint,
                user_agent,
                user_agent_header,
                limiter: ClientLimiter::new(
                    RateLimiter::new(default_burst, default_interval),
                    RateLimiter::new(provision_burst, provision_interval),
                ),
            }),
            cancel: self.cancellation.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone)]
struct ClientInner {
    transport: Arc<dyn Transport>,
    credentials: CredentialPair,
    endpoint: String,
    user_agent: String,
    user_agent_header: HeaderValue,
    limiter: ClientLimiter,
}

/// Bonsai API client
///
/// Cloning is cheap. Clones share the transport and both rate limiters.
#[derive(Debug, Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
    cancel: Cancellation,
}

impl Client {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Client against the production endpoint with default settings.
    pub fn new(credentials: CredentialPair) -> Result<Self> {
        Self::builder().credentials(credentials).build()
    }

    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }

    pub fn user_agent(&self) -> &str {
        &self.inner.user_agent
    }

    pub fn credentials(&self) -> &CredentialPair {
        &self.inner.credentials
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.inner.transport
    }

    pub fn rate_limiter(&self) -> &ClientLimiter {
        &self.inner.limiter
    }

    pub fn cancellation(&self) -> &Cancellation {
        &self.cancel
    }

    /// Swap the transport, e.g. for a recording transport in tests.
    ///
    /// Other clones of this client keep the previous transport.
    pub fn set_transport(&mut self, transport: Arc<dyn Transport>) {
        Arc::make_mut(&mut self.inner).transport = transport;
    }

    /// Swap credentials. Other clones of this client are unaffected.
    pub fn set_credentials(&mut self, credentials: CredentialPair) {
        Arc::make_mut(&mut self.inner).credentials = credentials;
    }

    /// A clone whose operations observe `cancel`.
    #[must_use]
    pub fn with_cancellation(&self, cancel: Cancellation) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            cancel,
        }
    }

    pub fn clusters(&self) -> ClusterClient<'_> {
        ClusterClient::new(self)
    }

    pub fn plans(&self) -> PlanClient<'_> {
        PlanClient::new(self)
    }

    pub fn releases(&self) -> ReleaseClient<'_> {
        ReleaseClient::new(self)
    }

    pub fn spaces(&self) -> SpaceClient<'_> {
        SpaceClient::new(self)
    }

    /// Build a request for `path` (relative to the endpoint, may carry a
    /// query string) with auth and content negotiation headers set.
    pub fn new_request(
        &self,
        method: Method,
        path: &str,
        body: Option<Bytes>,
    ) -> Result<HttpRequest> {
        let raw = format!("{}{}", self.inner.endpoint, path);
        let url = Url::parse(&raw).map_err(|source| Error::InvalidUrl { url: raw, source })?;

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT_HEADER, self.inner.user_agent_header.clone());
        headers.insert(ACCEPT, HeaderValue::from_static(CONTENT_TYPE_JSON));
        if body.is_some() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_JSON));
        }
        if let Some(auth) = self.inner.credentials.authorization_header()? {
            headers.insert(AUTHORIZATION, auth);
        }

        Ok(HttpRequest {
            method,
            url,
            headers,
            body,
        })
    }

    /// [`new_request`](Self::new_request) with `body` serialized as JSON.
    pub fn new_json_request<T: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &T,
    ) -> Result<HttpRequest> {
        let body = serde_json::to_vec(body).map_err(Error::Encode)?;
        self.new_request(method, path, Some(Bytes::from(body)))
    }

    /// Send `request` through the default rate limiter.
    ///
    /// `429 Too Many Requests` responses are retried after their
    /// `Retry-After` delay until a different outcome arrives or the
    /// client's cancellation fires. Any other `>= 400` status is returned
    /// as [`Error::Api`] with the response attached.
    pub async fn execute(&self, request: HttpRequest) -> Result<Response> {
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            self.inner.limiter.default.wait(&self.cancel).await?;

            debug!(method = %request.method, url = %request.url, attempt, "Sending request");
            let sent = self
                .cancel
                .run(self.inner.transport.send(request.clone()))
                .await?;
            let raw = sent?;

            let mut response = Response::new(raw.status, raw.headers, raw.body);
            trace!(
                status = response.status().as_u16(),
                bytes = response.body().len(),
                "Received response"
            );

            if response.status().as_u16() >= 400 {
                let api_error = response.api_error();

                if api_error.is(ApiStatus::TooManyRequests) {
                    match response.retry_after() {
                        Some(delay) => {
                            warn!(
                                url = %request.url,
                                retry_after_secs = delay.as_secs(),
                                attempt,
                                "Throttled by API, retrying after delay"
                            );
                            self.cancel.sleep(delay).await?;
                        }
                        None => {
                            warn!(
                                url = %request.url,
                                attempt,
                                "Throttled by API without a usable Retry-After, retrying"
                            );
                        }
                    }
                    continue;
                }

                debug!(status = api_error.status, errors = ?api_error.errors, "API returned error");
                return Err(Error::Api {
                    source: api_error,
                    response: Box::new(response),
                });
            }

            if response.is_json() {
                let pagination = response.decode_pagination()?;
                response.set_pagination(pagination);
            }

            return Ok(response);
        }
    }
}
