// Address Resolver
// Thin facade over host name lookup. Literal addresses pass straight
// through; anything carrying alphabetic characters is a name.

use std::net::{IpAddr, SocketAddr};
use tokio::net::lookup_host;
use tracing::debug;

use super::traits::TransportError;

/// Classification from the wire contract: an input with alphabetic
/// characters is a domain name. IPv6 literals also carry hex letters,
/// so anything that already parses as an address is excluded first.
pub fn requires_lookup(host: &str) -> bool {
    !host.is_empty()
        && host.parse::<IpAddr>().is_err()
        && host.chars().any(|c| c.is_ascii_alphabetic())
}

/// Resolve the configured host to a socket address. Failure is
/// non-fatal to the caller; it drives a Disconnected transition.
pub async fn resolve(host: &str, port: u16) -> Result<SocketAddr, TransportError> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, port));
    }
    if !requires_lookup(host) {
        return Err(TransportError::InvalidAddress(host.to_string()));
    }

    debug!(host, "performing DNS lookup");
    let mut addresses = lookup_host((host, port))
        .await
        .map_err(|e| TransportError::Dns {
            host: host.to_string(),
            reason: e.to_string(),
        })?;
    addresses.next().ok_or_else(|| TransportError::Dns {
        host: host.to_string(),
        reason: "lookup returned no addresses".to_string(),
    })
}
