use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use bytes::{Bytes, BytesMut};

use crate::relay::ResponseSink;

/// Buffers encoded frames and renders them as the body of the HTTP reply.
///
/// The transport status is always 200; the relayed status lives inside the
/// encoded response event.
#[derive(Debug, Default)]
pub struct HttpEventSink {
    buffer: BytesMut,
}

impl HttpEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

impl ResponseSink for HttpEventSink {
    fn max_package_size(&self) -> i64 {
        -1
    }

    fn send(&mut self, chunk: Bytes) {
        self.buffer.extend_from_slice(&chunk);
    }
}

impl IntoResponse for HttpEventSink {
    fn into_response(self) -> Response {
        let body = self.buffer.freeze();
        (
            StatusCode::OK,
            [
                (
                    header::CONTENT_TYPE,
                    mime::APPLICATION_OCTET_STREAM.essence_str().to_string(),
                ),
                (header::CONTENT_LENGTH, body.len().to_string()),
            ],
            body,
        )
            .into_response()
    }
}
