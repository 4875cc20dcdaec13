//! Probe target resolution.
use crate::{Error, Result};
use std::net::{IpAddr, ToSocketAddrs};

/// Resolve a host name or IP literal to the address that will be probed.
/// IP literals never touch DNS; for names the first IPv4 result is preferred,
/// then the first result of any family.
pub fn resolve_target(host: &str) -> Result<IpAddr> {
	let host = host.trim();
	if host.is_empty() {
		return Err(Error::Resolve { host: host.into(), reason: "empty host".into() });
	}
	// Try to parse as literal IP first to avoid DNS lookups.
	if let Ok(ip) = host.trim_start_matches('[').trim_end_matches(']').parse::<IpAddr>() {
		return Ok(ip);
	}
	let addrs: Vec<IpAddr> = (host, 0)
		.to_socket_addrs()
		.map_err(|e| Error::Resolve { host: host.into(), reason: e.to_string() })?
		.map(|sa| sa.ip())
		.collect();
	addrs
		.iter()
		.find(|ip| ip.is_ipv4())
		.or_else(|| addrs.first())
		.copied()
		.ok_or_else(|| Error::Resolve { host: host.into(), reason: "no addresses".into() })
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parse_ip_literals() {
		assert_eq!(resolve_target("127.0.0.1").unwrap().to_string(), "127.0.0.1");
		assert_eq!(resolve_target(" ::1 ").unwrap().to_string(), "::1");
		assert_eq!(resolve_target("[fe80::1]").unwrap().to_string(), "fe80::1");
	}

	#[test]
	fn empty_host_is_rejected() {
		assert!(matches!(resolve_target("  "), Err(Error::Resolve { .. })));
	}

	#[test]
	fn localhost_resolves() {
		let ip = resolve_target("localhost").unwrap();
		assert!(ip.is_loopback());
	}
}
