use crate::humanize::ByteSize;
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub relay: RelaySettings,
}

/// Inbound HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    /// Largest encoded event accepted on `/invoke`
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: ByteSize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            max_payload_bytes: default_max_payload_bytes(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8080))
}

fn default_max_payload_bytes() -> ByteSize {
    ByteSize::mib(5)
}

/// Relay behaviour. Loaded once at startup and never mutated afterwards.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RelaySettings {
    /// Master nodes refuse to relay fetches
    #[serde(default)]
    pub is_master: bool,
    /// Transport attempts per fetch budget
    #[serde(default = "default_retry_fetch_count")]
    pub retry_fetch_count: u32,
    /// Window used when narrowing an oversized GET with a Range header
    #[serde(default = "default_range_fetch_limit")]
    pub range_fetch_limit: ByteSize,
    /// Full restarts (fresh budget) allowed after oversized failures
    #[serde(default = "default_max_fetch_restarts")]
    pub max_fetch_restarts: u32,
    #[serde(default = "default_restart_cooldown_ms")]
    pub restart_cooldown_ms: u64,
    /// Deadline for a single transport attempt
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    /// Bodies above this size fail with RESPONSE_TOO_LARGE
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: ByteSize,
    #[serde(default = "default_accept_invalid_certs")]
    pub accept_invalid_certs: bool,
    /// Exact hosts or `*.suffix` wildcards
    #[serde(default)]
    pub blacklist: Vec<String>,
    /// Also deny loopback and RFC1918 addresses
    #[serde(default)]
    pub block_private_hosts: bool,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            is_master: false,
            retry_fetch_count: default_retry_fetch_count(),
            range_fetch_limit: default_range_fetch_limit(),
            max_fetch_restarts: default_max_fetch_restarts(),
            restart_cooldown_ms: default_restart_cooldown_ms(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            max_response_bytes: default_max_response_bytes(),
            accept_invalid_certs: default_accept_invalid_certs(),
            blacklist: Vec::new(),
            block_private_hosts: false,
        }
    }
}

impl RelaySettings {
    pub fn restart_cooldown(&self) -> Duration {
        Duration::from_millis(self.restart_cooldown_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

fn default_retry_fetch_count() -> u32 {
    3
}

fn default_range_fetch_limit() -> ByteSize {
    ByteSize::kib(256)
}

fn default_max_fetch_restarts() -> u32 {
    1
}

fn default_restart_cooldown_ms() -> u64 {
    1000
}

fn default_fetch_timeout_secs() -> u64 {
    10
}

fn default_max_response_bytes() -> ByteSize {
    ByteSize::mib(32)
}

fn default_accept_invalid_certs() -> bool {
    true
}
