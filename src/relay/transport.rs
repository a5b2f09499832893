//! Outbound HTTP capability used by the fetcher

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use reqwest::header::HeaderMap;
use reqwest::{Client, Method, Url};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::RelaySettings;

/// Marker carried by every oversized-response failure. The fetcher keys its
/// range-narrowing and restart paths on this text.
pub const RESPONSE_TOO_LARGE: &str = "RESPONSE_TOO_LARGE";

#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("RESPONSE_TOO_LARGE: response body exceeds {limit} bytes")]
    ResponseTooLarge { limit: u64 },

    #[error("Deadline of {0:?} exceeded")]
    Timeout(Duration),

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("HTTP request failed: {0}")]
    RequestFailed(String),
}

impl TransportError {
    pub fn is_response_too_large(&self) -> bool {
        self.to_string().contains(RESPONSE_TOO_LARGE)
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;

/// Fully built outbound request. Headers are already validated.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Upstream response with its body buffered in memory
#[derive(Debug, Clone, Default)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

/// One round trip to the upstream; no retries at this level.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn round_trip(&self, request: &OutboundRequest) -> Result<TransportResponse>;
}

/// Transport settings
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_response_bytes: u64,
    pub accept_invalid_certs: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
            max_response_bytes: 32 * 1024 * 1024,
            accept_invalid_certs: true,
        }
    }
}

impl TransportConfig {
    pub fn from_settings(settings: &RelaySettings) -> Self {
        let request_timeout = settings.fetch_timeout();
        Self {
            connect_timeout: request_timeout.min(Duration::from_secs(5)),
            request_timeout,
            max_response_bytes: settings.max_response_bytes.as_u64(),
            accept_invalid_certs: settings.accept_invalid_certs,
        }
    }
}

/// reqwest-backed transport
///
/// Redirects are not followed: a 3xx goes back to the caller, which may
/// resume with the `X-Range` hint.
pub struct ReqwestTransport {
    client: Client,
    config: TransportConfig,
}

impl ReqwestTransport {
    pub fn new(config: TransportConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| TransportError::RequestFailed(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn map_error(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(self.config.request_timeout)
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else {
            TransportError::RequestFailed(err.to_string())
        }
    }

    fn too_large(&self) -> TransportError {
        TransportError::ResponseTooLarge {
            limit: self.config.max_response_bytes,
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn round_trip(&self, request: &OutboundRequest) -> Result<TransportResponse> {
        debug!(method = %request.method, url = %request.url, "Sending request");

        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone());
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let mut response = builder.send().await.map_err(|e| self.map_error(e))?;

        let limit = self.config.max_response_bytes;
        if response.content_length().is_some_and(|len| len > limit) {
            return Err(self.too_large());
        }

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();

        // Chunked bodies carry no length up front; enforce the cap while reading.
        let mut body = BytesMut::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| self.map_error(e))? {
            if (body.len() + chunk.len()) as u64 > limit {
                return Err(self.too_large());
            }
            body.extend_from_slice(&chunk);
        }

        debug!(url = %request.url, status, size = body.len(), "Response received");

        Ok(TransportResponse {
            status,
            headers,
            body: body.freeze(),
        })
    }
}
