//! Client address derivation for rate limiting.

// std
use std::net::{Ipv4Addr, Ipv6Addr};
// crates.io
use http::HeaderMap;
// self
use crate::{_prelude::*, limiter::ClientKey};

/// Header carrying the proxy chain, client first.
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";
/// Header carrying the client address as seen by a single reverse proxy.
pub const X_REAL_IP: &str = "x-real-ip";

/// Derives the rate-limit key for a request.
///
/// Lookup order:
///
/// 1. the first publicly routable address in `X-Forwarded-For`,
/// 2. the address in `X-Real-IP`,
/// 3. the transport peer address,
/// 4. [`ClientKey::unknown`], shared by every request with no usable address.
pub fn client_key(headers: &HeaderMap, peer: Option<IpAddr>) -> ClientKey {
	client_ip(headers, peer).map(ClientKey::from).unwrap_or_else(ClientKey::unknown)
}

/// Best-effort client address, see [`client_key`] for the lookup order.
pub fn client_ip(headers: &HeaderMap, peer: Option<IpAddr>) -> Option<IpAddr> {
	forwarded_for(headers).or_else(|| real_ip(headers)).or(peer)
}

fn forwarded_for(headers: &HeaderMap) -> Option<IpAddr> {
	let value = headers.get(X_FORWARDED_FOR)?.to_str().ok()?;

	value
		.split(',')
		.filter_map(|hop| hop.trim().parse::<IpAddr>().ok())
		.find(|addr| !is_private(addr))
}

fn real_ip(headers: &HeaderMap) -> Option<IpAddr> {
	headers.get(X_REAL_IP)?.to_str().ok()?.trim().parse().ok()
}

/// Returns `true` for loopback, link-local, private, unique-local, and unspecified addresses.
pub fn is_private(addr: &IpAddr) -> bool {
	match addr {
		IpAddr::V4(v4) => is_private_v4(v4),
		IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
			Some(v4) => is_private_v4(&v4),
			None => is_private_v6(v6),
		},
	}
}

fn is_private_v4(addr: &Ipv4Addr) -> bool {
	addr.is_private() || addr.is_loopback() || addr.is_link_local() || addr.is_unspecified()
}

fn is_private_v6(addr: &Ipv6Addr) -> bool {
	addr.is_loopback()
		|| addr.is_unspecified()
		|| addr.is_unique_local()
		|| addr.is_unicast_link_local()
}
