//! Per-client token-bucket rate limiting with idle eviction.
//!
//! The [`ClientLimiterRegistry`] owns one [`TokenBucket`] per [`ClientKey`] behind a single
//! mutex. Buckets appear on a client's first request and disappear once the client has been
//! idle for longer than the configured threshold, removed by the sweep task started through
//! [`ClientLimiterRegistry::spawn_sweeper`].

pub mod bucket;
pub mod registry;

pub use bucket::*;
pub use registry::*;

// self
use crate::_prelude::*;

/// Identity of a rate-limited client, normally its network address.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientKey(String);
impl ClientKey {
	/// Key shared by every request whose address cannot be determined.
	pub fn unknown() -> Self {
		Self("unknown".into())
	}

	/// Wraps an arbitrary key (for non-IP client identities).
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the key as a string slice.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl From<IpAddr> for ClientKey {
	fn from(addr: IpAddr) -> Self {
		Self(addr.to_string())
	}
}
impl Display for ClientKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}
