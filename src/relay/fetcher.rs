//! Resilient fetch of a [`RequestEvent`] through an [`HttpTransport`]
//!
//! `fetch` is total: every outcome, including gate rejections and
//! exhausted retries, comes back as a [`ResponseEvent`].
//!
//! ## Flow
//! 1. Master nodes reject the request outright.
//! 2. Blacklisted hosts are rejected.
//! 3. The outbound request is built; a malformed method, URL or header is a 400.
//! 4. Up to `retry_fetch_count` transport attempts:
//!    - success returns immediately (302 responses carry the request's `Range`
//!      back as `X-Range`);
//!    - an oversized GET is narrowed with `Range: bytes=<start>-<limit-1>`;
//!    - an oversized non-GET escalates straight to step 5;
//!    - any other failure is retried as is.
//! 5. A budget that ends on an oversized failure sleeps for the cooldown and
//!    starts over from the incoming event with a fresh budget, at most
//!    `max_fetch_restarts` times.
//! 6. Otherwise the fetch is reported as a 408.

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, RANGE};
use reqwest::{Method, Url};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::blacklist::Blacklist;
use super::range::ByteRange;
use super::transport::{HttpTransport, OutboundRequest, TransportResponse};
use crate::config::RelaySettings;
use crate::event::{RequestEvent, ResponseEvent};

pub const MASTER_MODE_CAUSE: &str = "Proxy service is no enable in snova master node.";
pub const BLACKLISTED_CAUSE: &str = "Current site is in blacklist.";

const X_RANGE: &str = "X-Range";

// Connection-level headers that must not be copied onto the outbound request;
// the client derives them from the body it sends.
const SKIPPED_REQUEST_HEADERS: &[&str] = &["content-length", "transfer-encoding", "connection"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestBuildError {
    #[error("invalid method: {0}")]
    InvalidMethod(String),

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("invalid header: {0}")]
    InvalidHeader(String),
}

impl RequestBuildError {
    fn into_response(self, url: &str) -> ResponseEvent {
        let cause = match self {
            RequestBuildError::InvalidMethod(_) | RequestBuildError::InvalidUrl(_) => {
                format!("Invalid fetch url:{url}")
            }
            RequestBuildError::InvalidHeader(name) => format!("Invalid request header:{name}"),
        };
        denied(400, &cause)
    }
}

/// Explanatory plain-text response for a refused or failed fetch.
pub fn denied(status: u32, cause: &str) -> ResponseEvent {
    ResponseEvent::plain_text(
        status,
        format!("You are not allowed to visit this site via proxy because {cause}."),
    )
}

/// Result of one retry budget
#[derive(Debug)]
enum Outcome {
    Served(ResponseEvent),
    Oversized,
    Exhausted,
}

/// Performs fetches on behalf of callers. Cheap to share; holds no
/// per-request state.
pub struct Fetcher {
    settings: Arc<RelaySettings>,
    blacklist: Blacklist,
    transport: Arc<dyn HttpTransport>,
}

impl Fetcher {
    pub fn new(settings: Arc<RelaySettings>, transport: Arc<dyn HttpTransport>) -> Self {
        let blacklist = Blacklist::from_settings(&settings);
        Self {
            settings,
            blacklist,
            transport,
        }
    }

    pub async fn fetch(&self, event: &RequestEvent) -> ResponseEvent {
        // Rejections keep the default 200 status; callers read the body.
        if self.settings.is_master {
            return denied(200, MASTER_MODE_CAUSE);
        }

        let host = target_host(event);
        if self.blacklist.is_blacklisted(&host) {
            info!(host = %host, url = %event.url, "Rejected blacklisted host");
            return denied(200, BLACKLISTED_CAUSE);
        }

        let mut restarts = 0;
        loop {
            let request = match build_request(event) {
                Ok(request) => request,
                Err(err) => {
                    warn!(url = %event.url, error = %err, "Failed to build outbound request");
                    return err.into_response(&event.url);
                }
            };

            match self.run_budget(event, request).await {
                Outcome::Served(response) => return response,
                Outcome::Oversized if restarts < self.settings.max_fetch_restarts => {
                    restarts += 1;
                    warn!(
                        url = %event.url,
                        restart = restarts,
                        cooldown_ms = self.settings.restart_cooldown_ms,
                        "Response too large, restarting fetch after cooldown"
                    );
                    tokio::time::sleep(self.settings.restart_cooldown()).await;
                }
                Outcome::Oversized | Outcome::Exhausted => break,
            }
        }

        error!(url = %event.url, restarts, "Fetch retries exhausted");
        denied(408, &format!("Fetch timeout for url:{}", event.url))
    }

    async fn run_budget(&self, event: &RequestEvent, mut request: OutboundRequest) -> Outcome {
        let mut remaining = self.settings.retry_fetch_count;
        let mut last_oversized = false;

        while remaining > 0 {
            let err = match self.transport.round_trip(&request).await {
                Ok(upstream) if !(100..=599).contains(&upstream.status) => {
                    // Such a status cannot be carried in a ResponseEvent.
                    warn!(
                        url = %event.url,
                        status = upstream.status,
                        "Upstream sent invalid status"
                    );
                    let cause = format!(
                        "Invalid upstream status {} for url:{}",
                        upstream.status, event.url
                    );
                    return Outcome::Served(denied(502, &cause));
                }
                Ok(upstream) => {
                    let response = build_response(upstream, &request);
                    info!(
                        method = %request.method,
                        url = %event.url,
                        status = response.status,
                        size = response.content.len(),
                        "Fetched"
                    );
                    return Outcome::Served(response);
                }
                Err(err) => err,
            };

            remaining -= 1;
            warn!(url = %event.url, remaining, error = %err, "Failed to fetch URL");

            last_oversized = err.is_response_too_large();
            if !last_oversized {
                continue;
            }
            if !request.method.as_str().eq_ignore_ascii_case("GET") {
                return Outcome::Oversized;
            }
            narrow_range(&mut request, self.settings.range_fetch_limit.as_u64());
        }

        if last_oversized {
            Outcome::Oversized
        } else {
            Outcome::Exhausted
        }
    }
}

/// Host used for the blacklist: the `Host` header, else the URL's host.
fn target_host(event: &RequestEvent) -> String {
    match event.header("Host") {
        Some(host) if !host.trim().is_empty() => host.to_string(),
        _ => Url::parse(&event.url)
            .ok()
            .and_then(|url| url.host_str().map(str::to_string))
            .unwrap_or_default(),
    }
}

pub fn build_request(event: &RequestEvent) -> Result<OutboundRequest, RequestBuildError> {
    let method = Method::from_bytes(event.method.as_bytes())
        .map_err(|_| RequestBuildError::InvalidMethod(event.method.clone()))?;

    let url = Url::parse(&event.url)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
        .ok_or_else(|| RequestBuildError::InvalidUrl(event.url.clone()))?;

    let mut headers = HeaderMap::with_capacity(event.headers.len());
    for entry in &event.headers {
        let name = HeaderName::from_bytes(entry.name.as_bytes())
            .map_err(|_| RequestBuildError::InvalidHeader(entry.name.clone()))?;
        if SKIPPED_REQUEST_HEADERS.contains(&name.as_str()) {
            continue;
        }
        let value = HeaderValue::from_str(&entry.value)
            .map_err(|_| RequestBuildError::InvalidHeader(entry.name.clone()))?;
        headers.append(name, value);
    }

    Ok(OutboundRequest {
        method,
        url,
        headers,
        body: event.content.clone(),
    })
}

fn build_response(upstream: TransportResponse, request: &OutboundRequest) -> ResponseEvent {
    let mut response = ResponseEvent::new(u32::from(upstream.status));
    for (name, value) in upstream.headers {
        response.add_header(name, value);
    }
    // The body is fully buffered, so the length is known.
    response.remove_header("Transfer-Encoding");
    response.set_content(upstream.body);

    if response.status == 302 {
        if let Some(range) = request.headers.get(RANGE).and_then(|v| v.to_str().ok()) {
            if !range.is_empty() {
                response.add_header(X_RANGE, range);
            }
        }
    }

    response
}

/// Rewrite `Range` to `bytes=<start>-<limit-1>`, keeping the previously
/// requested start (0 when none).
fn narrow_range(request: &mut OutboundRequest, limit: u64) {
    let start = request
        .headers
        .get(RANGE)
        .and_then(|v| v.to_str().ok())
        .and_then(ByteRange::parse)
        .map_or(0, |range| range.start);

    let narrowed = ByteRange::narrowed(start, limit).to_string();
    debug!(url = %request.url, range = %narrowed, "Narrowing request range");

    if let Ok(value) = HeaderValue::from_str(&narrowed) {
        request.headers.insert(RANGE, value);
    }
}
