//! Scripted transport for fetcher and dispatcher tests

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;

use super::transport::{HttpTransport, OutboundRequest, Result, TransportError, TransportResponse};

type Fallback = fn() -> Result<TransportResponse>;

/// Replays queued results in order and records every request it sees. Once the
/// script runs dry it answers with the fallback, or a connect error.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<TransportResponse>>>,
    fallback: Option<Fallback>,
    seen: Mutex<Vec<OutboundRequest>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Result<TransportResponse>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: None,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn with_fallback(mut self, fallback: Fallback) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn requests(&self) -> Vec<OutboundRequest> {
        self.seen.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn round_trip(&self, request: &OutboundRequest) -> Result<TransportResponse> {
        self.seen.lock().unwrap().push(request.clone());
        let next = self.script.lock().unwrap().pop_front();
        match (next, self.fallback) {
            (Some(result), _) => result,
            (None, Some(fallback)) => fallback(),
            (None, None) => Err(TransportError::Connect("script exhausted".into())),
        }
    }
}

pub fn ok_response(body: &'static [u8]) -> TransportResponse {
    TransportResponse {
        status: 200,
        headers: vec![("content-type".to_string(), "text/plain".to_string())],
        body: Bytes::from_static(body),
    }
}

pub fn too_large() -> Result<TransportResponse> {
    Err(TransportError::ResponseTooLarge { limit: 1024 })
}
