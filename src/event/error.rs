use thiserror::Error;

use super::codec::EventKind;

/// Failure to decode header tags or an event frame.
///
/// A decode error always discards the whole frame; no partially decoded
/// event is handed on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("truncated {what}: need {needed} bytes, have {available}")]
    Truncated {
        what: &'static str,
        needed: usize,
        available: usize,
    },

    #[error("bad header tags magic {0:#06x}")]
    BadMagic(u16),

    #[error("unsupported header tags version {0}")]
    UnsupportedTagsVersion(u8),

    #[error("unknown event type {0}")]
    UnknownEventType(u16),

    #[error("unsupported {kind} body version {version}")]
    UnsupportedBodyVersion { kind: EventKind, version: u16 },

    #[error("malformed event body: {0}")]
    Body(String),

    #[error("invalid event: {0}")]
    Invalid(String),
}

impl From<prost::DecodeError> for DecodeError {
    fn from(value: prost::DecodeError) -> Self {
        DecodeError::Body(value.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DecodeError>;
