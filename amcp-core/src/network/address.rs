//! Host name resolution.

use std::net::{IpAddr, Ipv4Addr};

use tokio::net::lookup_host;
use tracing::debug;

/// Resolve `host` to one IP address.
///
/// `localhost` maps to `127.0.0.1` and literal addresses pass through.
/// Anything else goes to the system resolver and the first answer wins.
pub async fn resolve_ip_address(host: &str) -> Option<IpAddr> {
    let host = host.trim();
    if host.eq_ignore_ascii_case("localhost") {
        return Some(IpAddr::V4(Ipv4Addr::LOCALHOST));
    }
    if let Ok(ip) = host.parse() {
        return Some(ip);
    }

    match lookup_host((host, 0)).await {
        Ok(mut addrs) => addrs.next().map(|addr| addr.ip()),
        Err(e) => {
            debug!(host, error = %e, "host lookup failed");
            None
        }
    }
}
