//! Signed request dispatch.
//!
//! [`MnsClient`] is the seam every higher-level operation goes through. The
//! HTTP implementation, [`HttpMnsClient`], serializes the payload, adds the
//! protocol headers, signs the request and classifies the response:
//!
//! - `200`, `201` and `204` produce a [`Reply`] whose body can be decoded into
//!   the expected document.
//! - Any other status is decoded as an error envelope and surfaced as
//!   [`MnsError::Remote`].
//!
//! No retries happen here; callers own their retry policy.

use crate::config::{ClientConfig, API_VERSION};
use crate::credential::{Credential, AUTHORIZATION, CONTENT_MD5, CONTENT_TYPE, DATE, MNS_VERSION};
use crate::decoder::XmlDecoder;
use crate::error::{ConfigurationError, MnsError, RemoteError};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use md5::{Digest, Md5};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;
use tracing::{debug, warn};

pub use reqwest::Method;

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;

const XML_CONTENT_TYPE: &str = "application/xml";

/// Extra time granted to the transport beyond the configured request timeout,
/// so a server-side long poll always answers before the client gives up.
const RESPONSE_GRACE: Duration = Duration::from_secs(1);

// ============================================================================
// Request and reply
// ============================================================================

/// A document that can be sent as an XML request body
pub trait XmlDocument: Send + Sync {
    fn to_xml(&self) -> Result<String, MnsError>;
}

impl<T> XmlDocument for T
where
    T: Serialize + Send + Sync,
{
    fn to_xml(&self) -> Result<String, MnsError> {
        quick_xml::se::to_string(self).map_err(|e| MnsError::EncodeFailed {
            message: e.to_string(),
        })
    }
}

/// Request body
#[derive(Default)]
pub enum Payload {
    #[default]
    Empty,
    /// Bytes sent as-is
    Raw(Bytes),
    /// A document serialized to XML at dispatch time
    Structured(Box<dyn XmlDocument>),
}

impl Payload {
    pub fn structured(document: impl XmlDocument + 'static) -> Self {
        Self::Structured(Box::new(document))
    }

    /// Serialize the payload into the bytes that go on the wire
    pub fn to_bytes(&self) -> Result<Bytes, MnsError> {
        match self {
            Self::Empty => Ok(Bytes::new()),
            Self::Raw(bytes) => Ok(bytes.clone()),
            Self::Structured(document) => Ok(Bytes::from(document.to_xml()?)),
        }
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "Empty"),
            Self::Raw(bytes) => write!(f, "Raw({} bytes)", bytes.len()),
            Self::Structured(_) => write!(f, "Structured(..)"),
        }
    }
}

/// One call against the service
#[derive(Debug)]
pub struct Request {
    pub method: Method,
    /// Extra headers; protocol headers are added by the dispatcher
    pub headers: HashMap<String, String>,
    pub payload: Payload,
    /// Path relative to the endpoint, including any query string
    pub resource: String,
}

impl Request {
    pub fn new(method: Method, resource: impl Into<String>) -> Self {
        Self {
            method,
            headers: HashMap::new(),
            payload: Payload::Empty,
            resource: resource.into(),
        }
    }

    pub fn get(resource: impl Into<String>) -> Self {
        Self::new(Method::GET, resource)
    }

    pub fn put(resource: impl Into<String>) -> Self {
        Self::new(Method::PUT, resource)
    }

    pub fn post(resource: impl Into<String>) -> Self {
        Self::new(Method::POST, resource)
    }

    pub fn delete(resource: impl Into<String>) -> Self {
        Self::new(Method::DELETE, resource)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_document(self, document: impl XmlDocument + 'static) -> Self {
        self.with_payload(Payload::structured(document))
    }
}

/// A successful response
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub body: Bytes,
}

impl Reply {
    /// Decode the body into the expected document
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, MnsError> {
        XmlDecoder::new()
            .decode(self.body.as_ref())
            .map_err(|e| MnsError::UnmarshalFailed { message: e.message })
    }
}

/// Check whether a status code counts as success
pub fn is_success_status(status: u16) -> bool {
    matches!(status, 200 | 201 | 204)
}

// ============================================================================
// Dispatcher
// ============================================================================

/// Issues signed requests against the service.
///
/// Implementations must be safe to share between tasks; concurrent calls to
/// `send` must not serialize behind a lock.
#[async_trait]
pub trait MnsClient: Send + Sync {
    /// Sign and send a request, returning the reply for a success status
    async fn send(&self, request: Request) -> Result<Reply, MnsError>;

    /// Route subsequent requests through a proxy
    fn set_proxy(&self, proxy_url: &str) -> Result<(), MnsError>;

    /// Proxy currently in use, if the implementation tracks one
    fn proxy_url(&self) -> Option<String> {
        None
    }
}

struct Transport {
    http: reqwest::Client,
    proxy_url: Option<String>,
}

/// [`MnsClient`] over HTTP(S)
pub struct HttpMnsClient {
    endpoint: String,
    access_key_id: String,
    credential: Credential,
    decoder: XmlDecoder,
    connect_timeout: Duration,
    request_timeout: Duration,
    transport: RwLock<Transport>,
}

impl HttpMnsClient {
    /// Create a client for the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns `MnsError::Configuration` if the configuration is invalid or the
    /// HTTP client cannot be created.
    pub fn new(config: &ClientConfig) -> Result<Self, MnsError> {
        config.validate()?;

        let connect_timeout = config.connect_timeout();
        let request_timeout = config.request_timeout();
        let http = build_http_client(connect_timeout, request_timeout, None)?;

        Ok(Self {
            endpoint: config.endpoint.trim().trim_end_matches('/').to_string(),
            access_key_id: config.access_key_id.clone(),
            credential: Credential::new(&config.access_key_secret),
            decoder: XmlDecoder::new(),
            connect_timeout,
            request_timeout,
            transport: RwLock::new(Transport {
                http,
                proxy_url: None,
            }),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Proxy currently in use, if any
    pub fn proxy_url(&self) -> Option<String> {
        self.transport
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .proxy_url
            .clone()
    }

    fn http_client(&self) -> reqwest::Client {
        self.transport
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .http
            .clone()
    }

    fn authorization(
        &self,
        method: &Method,
        headers: &HashMap<String, String>,
        resource: &str,
    ) -> Result<String, MnsError> {
        let signature =
            self.credential
                .signature(method.as_str(), headers, &format!("/{}", resource))?;
        Ok(format!("MNS {}:{}", self.access_key_id, signature))
    }
}

#[async_trait]
impl MnsClient for HttpMnsClient {
    async fn send(&self, request: Request) -> Result<Reply, MnsError> {
        let Request {
            method,
            mut headers,
            payload,
            resource,
        } = request;

        let body = payload.to_bytes()?;

        headers.insert(MNS_VERSION.to_string(), API_VERSION.to_string());
        headers.insert(CONTENT_TYPE.to_string(), XML_CONTENT_TYPE.to_string());
        headers.insert(CONTENT_MD5.to_string(), content_md5(&body));
        headers.insert(DATE.to_string(), http_date(Utc::now()));

        let authorization = self.authorization(&method, &headers, &resource)?;
        headers.insert(AUTHORIZATION.to_string(), authorization);

        let url = format!("{}/{}", self.endpoint, resource);
        debug!(method = %method, resource = %resource, body_len = body.len(), "Sending request");

        let mut builder = self.http_client().request(method.clone(), &url);
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.body(body).send().await.map_err(|e| {
            let message = if e.is_timeout() {
                format!("Request timeout: {}", e)
            } else if e.is_connect() {
                format!("Connection failed: {}", e)
            } else {
                format!("HTTP request failed: {}", e)
            };
            MnsError::RequestFailed { message }
        })?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| MnsError::ReadResponseBodyFailed {
                message: e.to_string(),
            })?;

        if is_success_status(status) {
            debug!(method = %method, resource = %resource, status, "Request succeeded");
            return Ok(Reply { status, body });
        }

        let envelope = self
            .decoder
            .decode_error_envelope(body.as_ref())
            .map_err(|e| MnsError::ErrorBodyUnmarshalFailed {
                status,
                message: e.message,
            })?;

        let error = RemoteError::new(
            status,
            envelope.code,
            envelope.message,
            envelope.request_id,
            envelope.host_id,
            resource,
        );
        warn!(
            method = %method,
            resource = %error.resource,
            status,
            code = %error.code,
            request_id = %error.request_id,
            "Service returned an error"
        );

        Err(error.into())
    }

    fn set_proxy(&self, proxy_url: &str) -> Result<(), MnsError> {
        let http = build_http_client(
            self.connect_timeout,
            self.request_timeout,
            Some(proxy_url),
        )?;

        let mut transport = self.transport.write().unwrap_or_else(PoisonError::into_inner);
        transport.http = http;
        transport.proxy_url = Some(proxy_url.to_string());

        debug!(proxy = %proxy_url, "Proxy configured");
        Ok(())
    }

    fn proxy_url(&self) -> Option<String> {
        HttpMnsClient::proxy_url(self)
    }
}

impl fmt::Debug for HttpMnsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpMnsClient")
            .field("endpoint", &self.endpoint)
            .field("access_key_id", &self.access_key_id)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

fn build_http_client(
    connect_timeout: Duration,
    request_timeout: Duration,
    proxy_url: Option<&str>,
) -> Result<reqwest::Client, MnsError> {
    let builder = reqwest::Client::builder()
        .connect_timeout(connect_timeout)
        .timeout(request_timeout.saturating_add(RESPONSE_GRACE));

    let builder = match proxy_url {
        Some(proxy_url) => {
            url::Url::parse(proxy_url).map_err(|e| ConfigurationError::Invalid {
                message: format!("proxy '{}' is not a valid URL: {}", proxy_url, e),
            })?;
            let proxy = reqwest::Proxy::all(proxy_url).map_err(|e| ConfigurationError::Invalid {
                message: format!("proxy '{}' rejected: {}", proxy_url, e),
            })?;
            builder.proxy(proxy)
        }
        None => builder.no_proxy(),
    };

    builder.build().map_err(|e| {
        ConfigurationError::Invalid {
            message: format!("Failed to create HTTP client: {}", e),
        }
        .into()
    })
}

/// `Content-MD5` value: base64 of the lowercase hex MD5 digest
pub(crate) fn content_md5(body: &[u8]) -> String {
    STANDARD.encode(hex::encode(Md5::digest(body)))
}

/// RFC 1123 date in GMT, as used by the `Date` header
pub(crate) fn http_date(now: DateTime<Utc>) -> String {
    now.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
