//! Landing-host policy.
//!
//! Decides which hostnames belong to the platform itself (and are never
//! tenant-scoped), and where a store-not-found page sends the visitor.

use std::time::Duration;

/// Delay before the store-not-found page redirects to the landing domain.
pub const NOT_FOUND_REDIRECT_DELAY: Duration = Duration::from_secs(5);

/// Loopback names always treated as local-development landing aliases.
const LOCAL_LANDING_HOSTS: &[&str] = &["localhost", "127.0.0.1", "::1"];

/// Normalize a hostname for comparison.
///
/// Lower-cases, drops a `:port` suffix, IPv6 brackets and a trailing dot.
#[must_use]
pub fn normalize_host(raw: &str) -> String {
    split_authority(raw.trim()).0.trim_end_matches('.').to_ascii_lowercase()
}

/// Split `host[:port]` (IPv6 hosts in brackets) into its parts.
fn split_authority(authority: &str) -> (&str, Option<u16>) {
    if let Some(rest) = authority.strip_prefix('[') {
        return match rest.split_once(']') {
            Some((host, tail)) => (host, tail.strip_prefix(':').and_then(|p| p.parse().ok())),
            None => (rest, None),
        };
    }

    match authority.rsplit_once(':') {
        // A bare IPv6 address has several colons and no port.
        Some((host, port)) if !host.contains(':') => match port.parse() {
            Ok(port) => (host, Some(port)),
            Err(_) => (authority, None),
        },
        _ => (authority, None),
    }
}

fn is_local_dev(host: &str) -> bool {
    LOCAL_LANDING_HOSTS.contains(&host) || host.ends_with(".localhost")
}

/// The fixed set of platform-owned hostnames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LandingHosts {
    root_domain: String,
    hosts: Vec<String>,
}

impl LandingHosts {
    /// Landing set for a root domain: the root, its `www` alias, the local
    /// loopback aliases, and any extra hosts.
    #[must_use]
    pub fn new(root_domain: &str, extra: impl IntoIterator<Item = String>) -> Self {
        let root_domain = normalize_host(root_domain);
        let mut hosts = vec![root_domain.clone(), format!("www.{root_domain}")];
        hosts.extend(LOCAL_LANDING_HOSTS.iter().map(|h| (*h).to_string()));
        for host in extra {
            let host = normalize_host(&host);
            if !host.is_empty() && !hosts.contains(&host) {
                hosts.push(host);
            }
        }
        Self { root_domain, hosts }
    }

    #[must_use]
    pub fn root_domain(&self) -> &str {
        &self.root_domain
    }

    /// Case-insensitive membership test.
    #[must_use]
    pub fn is_landing(&self, hostname: &str) -> bool {
        let host = normalize_host(hostname);
        self.hosts.iter().any(|h| *h == host)
    }

    /// Where a store-not-found page redirects.
    ///
    /// - a subdomain of the root domain goes to the root, keeping `scheme`;
    /// - a local-development host goes to `localhost` on the same port;
    /// - anything else goes to the canonical `https://` root.
    #[must_use]
    pub fn not_found_redirect(&self, scheme: &str, authority: &str) -> String {
        let (host, port) = split_authority(authority.trim());
        let host = host.trim_end_matches('.').to_ascii_lowercase();
        let root = &self.root_domain;

        if host == *root || host.ends_with(&format!(".{root}")) {
            return format!("{scheme}://{root}");
        }

        if is_local_dev(&host) {
            return port.map_or_else(
                || format!("{scheme}://localhost"),
                |port| format!("{scheme}://localhost:{port}"),
            );
        }

        format!("https://{root}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hosts() -> LandingHosts {
        LandingHosts::new("shopmesh.io", vec!["promo.shopmesh.io".to_string()])
    }

    #[test]
    fn test_normalize_host() {
        assert_eq!(normalize_host("Store.Example.COM:8080"), "store.example.com");
        assert_eq!(normalize_host("example.com."), "example.com");
        assert_eq!(normalize_host("[::1]:3000"), "::1");
        assert_eq!(normalize_host("::1"), "::1");
    }

    #[test]
    fn test_landing_hosts_case_insensitive() {
        let hosts = hosts();
        for host in [
            "shopmesh.io",
            "WWW.SHOPMESH.IO",
            "localhost",
            "localhost:5173",
            "127.0.0.1",
            "promo.shopmesh.io",
        ] {
            assert!(hosts.is_landing(host), "{host} should be a landing host");
        }
        assert!(!hosts.is_landing("tienda.shopmesh.io"));
        assert!(!hosts.is_landing("tienda.localhost"));
        assert!(!hosts.is_landing("custom-domain.com"));
    }

    #[test]
    fn test_redirect_from_platform_subdomain_keeps_scheme() {
        let hosts = hosts();
        assert_eq!(
            hosts.not_found_redirect("http", "missing.shopmesh.io"),
            "http://shopmesh.io"
        );
        assert_eq!(
            hosts.not_found_redirect("https", "Missing.Shopmesh.io:443"),
            "https://shopmesh.io"
        );
    }

    #[test]
    fn test_redirect_from_local_dev_keeps_port() {
        let hosts = hosts();
        assert_eq!(
            hosts.not_found_redirect("http", "missing.localhost:5173"),
            "http://localhost:5173"
        );
        assert_eq!(
            hosts.not_found_redirect("http", "127.0.0.1"),
            "http://localhost"
        );
    }

    #[test]
    fn test_redirect_from_custom_domain_goes_to_canonical_root() {
        assert_eq!(
            hosts().not_found_redirect("http", "gone-store.com"),
            "https://shopmesh.io"
        );
    }
}
