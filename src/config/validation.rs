use super::models::Config;
use crate::humanize::ByteSize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("max_payload_bytes ({actual}) exceeds limit of {limit}")]
    PayloadSizeExceedsLimit { actual: ByteSize, limit: ByteSize },

    #[error("range_fetch_limit must be positive")]
    InvalidRangeFetchLimit,

    #[error("max_response_bytes must be positive")]
    InvalidMaxResponseBytes,

    #[error("fetch_timeout_secs must be positive")]
    InvalidFetchTimeout,

    #[error("Invalid blacklist entry '{entry}': {reason}")]
    InvalidBlacklistEntry { entry: String, reason: &'static str },
}

const MAX_PAYLOAD_BYTES: ByteSize = ByteSize::mib(32);

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_payload_size(config)?;
    validate_fetch_limits(config)?;
    validate_blacklist(config)?;
    Ok(())
}

fn validate_payload_size(config: &Config) -> Result<(), ValidationError> {
    if config.server.max_payload_bytes > MAX_PAYLOAD_BYTES {
        return Err(ValidationError::PayloadSizeExceedsLimit {
            actual: config.server.max_payload_bytes,
            limit: MAX_PAYLOAD_BYTES,
        });
    }

    Ok(())
}

fn validate_fetch_limits(config: &Config) -> Result<(), ValidationError> {
    let relay = &config.relay;

    if relay.range_fetch_limit.as_u64() == 0 {
        return Err(ValidationError::InvalidRangeFetchLimit);
    }

    if relay.max_response_bytes.as_u64() == 0 {
        return Err(ValidationError::InvalidMaxResponseBytes);
    }

    if relay.fetch_timeout_secs == 0 {
        return Err(ValidationError::InvalidFetchTimeout);
    }

    Ok(())
}

/// Entries are exact hosts or a single leading `*.` wildcard
fn validate_blacklist(config: &Config) -> Result<(), ValidationError> {
    for entry in &config.relay.blacklist {
        let invalid = |reason| ValidationError::InvalidBlacklistEntry {
            entry: entry.clone(),
            reason,
        };

        let trimmed = entry.trim();
        if trimmed.is_empty() {
            return Err(invalid("entry is empty"));
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(invalid("entry contains whitespace"));
        }

        let host = trimmed.strip_prefix("*.").unwrap_or(trimmed);
        if host.is_empty() {
            return Err(invalid("wildcard without a domain"));
        }
        if host.contains('*') {
            return Err(invalid("'*' is only allowed as a leading '*.'"));
        }
    }

    Ok(())
}
