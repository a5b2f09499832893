//! `Range: bytes=<start>-<end>` values (single-range subset of RFC 7233)

use std::fmt;

/// Requested byte window. `end == None` is open-ended (`bytes=100-`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: Option<u64>,
}

impl ByteRange {
    /// Parse a `Range` header value. An omitted or unparsable end is
    /// open-ended; an unparsable start rejects the whole value. Only the first
    /// range of a multi-range value is considered.
    pub fn parse(value: &str) -> Option<Self> {
        let (unit, spec) = value.trim().split_once('=')?;
        if !unit.trim().eq_ignore_ascii_case("bytes") {
            return None;
        }

        let first = spec.split(',').next()?.trim();
        let (start, end) = first.split_once('-')?;
        let start = start.trim().parse::<u64>().ok()?;
        let end = end.trim().parse::<u64>().ok();

        Some(Self { start, end })
    }

    /// Window used to retry an oversized fetch. The end is `limit - 1`
    /// counted from byte zero, not from `start`.
    pub fn narrowed(start: u64, limit: u64) -> Self {
        Self {
            start,
            end: Some(limit.saturating_sub(1)),
        }
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            Some(end) => write!(f, "bytes={}-{}", self.start, end),
            None => write!(f, "bytes={}-", self.start),
        }
    }
}
