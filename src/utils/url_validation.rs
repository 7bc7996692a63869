//! Validation of caller-supplied raw-media URLs
//!
//! A `media_url` comes from the client's connection query and the bridge
//! POSTs synthesized audio to it, so it must not be usable to reach
//! internal services. A URL passes when it:
//! - Uses `http` or `https`
//! - Has a host
//! - Does not resolve to a loopback/private/reserved address
//!
//! Address checks are skipped when private targets are explicitly allowed
//! (local development against a player on the same machine).

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use thiserror::Error;
use tracing::warn;
use url::Url;

/// Errors that can occur during URL validation
#[derive(Debug, Error)]
pub enum UrlValidationError {
    #[error("Invalid URL format: {0}")]
    InvalidFormat(#[from] url::ParseError),

    #[error("URL scheme must be http or https, got: {0}")]
    UnsupportedScheme(String),

    #[error("URL must have a host")]
    MissingHost,

    #[error("URL resolves to private/internal IP address: {0}")]
    PrivateIpDetected(IpAddr),

    #[error("Failed to resolve hostname: {0}")]
    DnsResolutionFailed(String),
}

/// Checks if an IPv4 address is private/internal
///
/// Covers loopback, RFC 1918, link-local, broadcast, unspecified,
/// documentation, CGNAT (100.64.0.0/10) and benchmarking (198.18.0.0/15).
pub fn is_private_ipv4(ip: &Ipv4Addr) -> bool {
    let [a, b, ..] = ip.octets();
    ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_broadcast()
        || ip.is_unspecified()
        || ip.is_documentation()
        || (a == 100 && (b & 0xC0) == 64)
        || (a == 198 && (b == 18 || b == 19))
}

/// Checks if an IPv6 address is private/internal
///
/// Covers loopback, unspecified, link-local (fe80::/10), unique local
/// (fc00::/7), documentation (2001:db8::/32) and IPv4-mapped private
/// addresses.
pub fn is_private_ipv6(ip: &Ipv6Addr) -> bool {
    if ip.is_loopback() || ip.is_unspecified() {
        return true;
    }
    let segments = ip.segments();
    if segments[0] & 0xFFC0 == 0xFE80 || segments[0] & 0xFE00 == 0xFC00 {
        return true;
    }
    if segments[0] == 0x2001 && segments[1] == 0x0DB8 {
        return true;
    }
    ip.to_ipv4_mapped().is_some_and(|v4| is_private_ipv4(&v4))
}

/// Checks if an IP address is private/internal
pub fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(ipv4) => is_private_ipv4(ipv4),
        IpAddr::V6(ipv6) => is_private_ipv6(ipv6),
    }
}

/// Validate a raw-media playback URL and return it parsed.
///
/// # Arguments
/// * `url` - The URL string supplied by the client
/// * `allow_private` - Skip the private-address checks
///
/// # Example
/// ```rust,ignore
/// use voice_bridge::utils::url_validation::validate_media_url;
///
/// assert!(validate_media_url("https://player.example.com/push", false).await.is_ok());
/// assert!(validate_media_url("http://127.0.0.1:9000/push", false).await.is_err());
/// assert!(validate_media_url("http://127.0.0.1:9000/push", true).await.is_ok());
/// ```
pub async fn validate_media_url(url: &str, allow_private: bool) -> Result<Url, UrlValidationError> {
    let parsed = Url::parse(url)?;

    let scheme = parsed.scheme();
    if scheme != "https" && scheme != "http" {
        return Err(UrlValidationError::UnsupportedScheme(scheme.to_string()));
    }

    let host = match parsed.host() {
        Some(host) => host.to_owned(),
        None => return Err(UrlValidationError::MissingHost),
    };

    if allow_private {
        return Ok(parsed);
    }

    let addrs: Vec<IpAddr> = match host {
        url::Host::Ipv4(ip) => vec![IpAddr::V4(ip)],
        url::Host::Ipv6(ip) => vec![IpAddr::V6(ip)],
        url::Host::Domain(ref domain) => {
            let port = parsed.port_or_known_default().unwrap_or(443);
            tokio::net::lookup_host((domain.as_str(), port))
                .await
                .map_err(|e| UrlValidationError::DnsResolutionFailed(format!("{domain}: {e}")))?
                .map(|addr| addr.ip())
                .collect()
        }
    };

    if addrs.is_empty() {
        return Err(UrlValidationError::DnsResolutionFailed(format!(
            "No addresses found for {host}"
        )));
    }

    if let Some(ip) = addrs.iter().find(|ip| is_private_ip(ip)) {
        warn!(
            host = %host,
            resolved_ip = %ip,
            "Media URL targets a private address, refusing to push audio there"
        );
        return Err(UrlValidationError::PrivateIpDetected(*ip));
    }

    Ok(parsed)
}
