//! Host gate applied before any outbound fetch

use std::collections::HashSet;
use std::net::IpAddr;

use crate::config::RelaySettings;

/// Immutable host predicate built from configuration.
///
/// Entries are either exact hosts (`192.168.1.5`, `example.com`) or
/// `*.suffix` wildcards that match any sub-domain but not the apex. Matching
/// ignores ASCII case, a port suffix and a trailing dot.
#[derive(Debug, Clone, Default)]
pub struct Blacklist {
    exact: HashSet<String>,
    suffixes: Vec<String>,
    block_private: bool,
}

impl Blacklist {
    pub fn new<I, S>(entries: I, block_private: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut blacklist = Self {
            block_private,
            ..Self::default()
        };

        for entry in entries {
            let entry = entry.as_ref().trim().to_ascii_lowercase();
            match entry.strip_prefix('*') {
                Some(suffix) if suffix.starts_with('.') => {
                    let suffix = suffix.trim_end_matches('.');
                    // A bare "*." would match every host.
                    if !suffix.is_empty() {
                        blacklist.suffixes.push(suffix.to_string());
                    }
                }
                _ => {
                    blacklist.exact.insert(normalize_host(&entry));
                }
            }
        }

        blacklist
    }

    pub fn from_settings(settings: &RelaySettings) -> Self {
        Self::new(&settings.blacklist, settings.block_private_hosts)
    }

    pub fn is_blacklisted(&self, host: &str) -> bool {
        let host = normalize_host(host);
        if host.is_empty() {
            return false;
        }

        if self.exact.contains(&host) {
            return true;
        }

        if self
            .suffixes
            .iter()
            .any(|suffix| host.len() > suffix.len() && host.ends_with(suffix.as_str()))
        {
            return true;
        }

        self.block_private && is_private_host(&host)
    }
}

/// Lowercase, drop `:port`, unbracket IPv6 literals, drop a trailing dot.
fn normalize_host(host: &str) -> String {
    let host = host.trim();

    let host = if let Some(rest) = host.strip_prefix('[') {
        rest.split(']').next().unwrap_or(rest)
    } else {
        match host.rsplit_once(':') {
            // A single colon is a port separator; more means a bare IPv6 literal.
            Some((name, port))
                if !name.contains(':') && port.chars().all(|c| c.is_ascii_digit()) =>
            {
                name
            }
            _ => host,
        }
    };

    host.trim_end_matches('.').to_ascii_lowercase()
}

fn is_private_host(host: &str) -> bool {
    if host == "localhost" || host.ends_with(".localhost") {
        return true;
    }

    match host.parse::<IpAddr>() {
        Ok(IpAddr::V4(addr)) => addr.is_loopback() || addr.is_private(),
        Ok(IpAddr::V6(addr)) => addr.is_loopback(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        let blacklist = Blacklist::new(["192.168.1.5", "Example.COM"], false);

        assert!(blacklist.is_blacklisted("192.168.1.5"));
        assert!(blacklist.is_blacklisted("192.168.1.5:8080"));
        assert!(blacklist.is_blacklisted("example.com"));
        assert!(blacklist.is_blacklisted("EXAMPLE.com."));
        assert!(!blacklist.is_blacklisted("192.168.1.6"));
        assert!(!blacklist.is_blacklisted("www.example.com"));
    }

    #[test]
    fn test_wildcard_matches_subdomains_only() {
        let blacklist = Blacklist::new(["*.example.org"], false);

        assert!(blacklist.is_blacklisted("a.example.org"));
        assert!(blacklist.is_blacklisted("deep.a.example.org:443"));
        assert!(!blacklist.is_blacklisted("example.org"));
        assert!(!blacklist.is_blacklisted("badexample.org"));
    }

    #[test]
    fn test_bare_wildcard_matches_nothing() {
        let blacklist = Blacklist::new(["*.", "*.."], false);
        assert!(!blacklist.is_blacklisted("example.com"));
        assert!(!blacklist.is_blacklisted("a.b"));
    }

    #[test]
    fn test_empty_host_is_allowed() {
        let blacklist = Blacklist::new(["example.com"], true);
        assert!(!blacklist.is_blacklisted(""));
        assert!(!blacklist.is_blacklisted("   "));
    }

    #[test]
    fn test_private_hosts() {
        let blacklist = Blacklist::new(Vec::<String>::new(), true);

        assert!(blacklist.is_blacklisted("localhost"));
        assert!(blacklist.is_blacklisted("127.0.0.1:3000"));
        assert!(blacklist.is_blacklisted("10.1.2.3"));
        assert!(blacklist.is_blacklisted("172.20.0.1"));
        assert!(blacklist.is_blacklisted("192.168.1.5"));
        assert!(blacklist.is_blacklisted("[::1]:8080"));
        assert!(!blacklist.is_blacklisted("172.32.0.1"));
        assert!(!blacklist.is_blacklisted("8.8.8.8"));
        assert!(!blacklist.is_blacklisted("example.com"));
    }

    #[test]
    fn test_private_hosts_allowed_by_default() {
        let blacklist = Blacklist::new(Vec::<String>::new(), false);
        assert!(!blacklist.is_blacklisted("127.0.0.1"));
    }

    #[test]
    fn test_ipv6_literal_entry() {
        let blacklist = Blacklist::new(["[2001:db8::1]"], false);
        assert!(blacklist.is_blacklisted("[2001:db8::1]:443"));
        assert!(blacklist.is_blacklisted("2001:db8::1"));
    }

    #[test]
    fn test_from_settings() {
        let settings = RelaySettings {
            blacklist: vec!["blocked.example".to_string()],
            ..RelaySettings::default()
        };
        let blacklist = Blacklist::from_settings(&settings);
        assert!(blacklist.is_blacklisted("blocked.example"));
    }

    #[test]
    fn test_deterministic() {
        let blacklist = Blacklist::new(["*.example.org", "10.0.0.1"], true);
        for host in ["a.example.org", "10.0.0.1", "example.net", "192.168.0.1"] {
            assert_eq!(blacklist.is_blacklisted(host), blacklist.is_blacklisted(host));
        }
    }
}
