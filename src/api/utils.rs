//! API utility functions

use axum::body::Body;
use bytes::Bytes;
use http_body_util::{BodyExt, LengthLimitError, Limited};

use crate::api::error::ApiError;

/// Collect a request body, refusing anything over `max_size` bytes.
///
/// Decompression has already happened in `RequestDecompressionLayer`, so the
/// limit applies to the decoded frame.
pub async fn read_body(body: Body, max_size: usize) -> Result<Bytes, ApiError> {
    let collected = Limited::new(body, max_size)
        .collect()
        .await
        .map_err(|err| {
            if err.downcast_ref::<LengthLimitError>().is_some() {
                ApiError::PayloadTooLarge(max_size)
            } else {
                ApiError::InvalidPayload(err.to_string())
            }
        })?;

    Ok(collected.to_bytes())
}

/// Mode label reported by the health endpoint
pub fn mode_label(is_master: bool) -> &'static str {
    if is_master { "master" } else { "slave" }
}
