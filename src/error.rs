//! Crate-level error types shared across the token service, stores, and configuration.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Canonical error exposed by public APIs.
///
/// Every variant is a server-side fault; callers on the request path flatten them into
/// [`Rejection::Internal`](crate::admission::Rejection::Internal) after logging.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error(transparent)]
	Storage(#[from] crate::store::StoreError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// The operating system could not supply random bytes for a new token.
	#[error("Entropy source failed: {message}.")]
	Entropy {
		/// Human-readable error payload from the random source.
		message: String,
	},
	/// Issuance instant plus TTL falls outside the representable date range.
	#[error("Token TTL {ttl} overflows the expiry timestamp.")]
	TtlOutOfRange {
		/// Requested lifetime.
		ttl: Duration,
	},
	/// The token store did not answer within the configured deadline.
	#[error("Token store did not respond within {timeout:?}.")]
	StoreTimeout {
		/// Deadline that elapsed.
		timeout: std::time::Duration,
	},
}

/// Configuration and validation failures.
#[derive(Clone, Debug, PartialEq, ThisError)]
pub enum ConfigError {
	/// Refill rate must be a finite, strictly positive number.
	#[error("Limiter refill rate must be positive and finite, got {rps}.")]
	InvalidRate {
		/// Offending requests-per-second value.
		rps: f64,
	},
	/// Burst must allow at least one request.
	#[error("Limiter burst must be at least 1.")]
	ZeroBurst,
	/// A duration field was zero.
	#[error("The {field} duration must be greater than zero.")]
	ZeroDuration {
		/// Name of the offending field.
		field: &'static str,
	},
	/// A token TTL exceeds the supported maximum.
	#[error("The {scope} token TTL must not exceed {max_secs} seconds.")]
	TtlTooLong {
		/// Scope label whose TTL is invalid.
		scope: &'static str,
		/// Largest accepted TTL in seconds.
		max_secs: u64,
	},
	/// A token TTL was zero or negative.
	#[error("The {scope} token TTL must be positive.")]
	NonPositiveTtl {
		/// Scope label whose TTL is invalid.
		scope: &'static str,
	},
}
