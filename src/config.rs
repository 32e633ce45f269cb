//! Admission configuration: limiter tuning, per-scope token lifetimes, and store deadlines.
//!
//! Every struct deserializes from partial input; missing fields fall back to the defaults
//! below. Durations are written as whole seconds.

// std
use std::time::Duration as StdDuration;
// self
use crate::{_prelude::*, auth::TokenScope, error::ConfigError};

/// Top-level configuration consumed by [`TokenService`](crate::tokens::TokenService) and
/// [`AdmissionPipeline`](crate::admission::AdmissionPipeline).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdmissionConfig {
	/// Per-client rate limiter settings.
	pub limiter: LimiterConfig,
	/// Lifetimes for each token scope.
	pub ttl: TokenTtls,
	/// Upper bound for a single token store call.
	#[serde(with = "seconds", rename = "store_timeout_secs")]
	pub store_timeout: StdDuration,
}
impl AdmissionConfig {
	const DEFAULT_STORE_TIMEOUT: StdDuration = StdDuration::from_secs(3);

	/// Replaces the limiter section.
	pub fn with_limiter(mut self, limiter: LimiterConfig) -> Self {
		self.limiter = limiter;

		self
	}

	/// Replaces the TTL section.
	pub fn with_ttl(mut self, ttl: TokenTtls) -> Self {
		self.ttl = ttl;

		self
	}

	/// Overrides the store deadline.
	pub fn with_store_timeout(mut self, timeout: StdDuration) -> Self {
		self.store_timeout = timeout;

		self
	}

	/// Checks every section for values the runtime cannot honor.
	///
	/// A disabled limiter section is not checked.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.limiter.enabled {
			self.limiter.validate()?;
		}

		self.validate_tokens()
	}

	/// Checks the sections the token service reads: TTLs and the store deadline.
	pub fn validate_tokens(&self) -> Result<(), ConfigError> {
		self.ttl.validate()?;

		if self.store_timeout.is_zero() {
			return Err(ConfigError::ZeroDuration { field: "store_timeout" });
		}

		Ok(())
	}
}
impl Default for AdmissionConfig {
	fn default() -> Self {
		Self {
			limiter: LimiterConfig::default(),
			ttl: TokenTtls::default(),
			store_timeout: Self::DEFAULT_STORE_TIMEOUT,
		}
	}
}

/// Token-bucket and eviction settings for the client limiter registry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimiterConfig {
	/// When false, the rate-limit gate admits every request.
	pub enabled: bool,
	/// Refill rate in tokens per second.
	pub rps: f64,
	/// Bucket capacity.
	pub burst: u32,
	/// Clients idle for longer than this are evicted.
	#[serde(with = "seconds", rename = "idle_timeout_secs")]
	pub idle_timeout: StdDuration,
	/// Interval between eviction sweeps.
	#[serde(with = "seconds", rename = "sweep_interval_secs")]
	pub sweep_interval: StdDuration,
}
impl LimiterConfig {
	const DEFAULT_BURST: u32 = 4;
	const DEFAULT_IDLE_TIMEOUT: StdDuration = StdDuration::from_secs(3 * 60);
	const DEFAULT_RPS: f64 = 2.;
	const DEFAULT_SWEEP_INTERVAL: StdDuration = StdDuration::from_secs(60);

	/// Creates an enabled limiter with the given rate and burst and default eviction timing.
	pub fn new(rps: f64, burst: u32) -> Self {
		Self { rps, burst, ..Self::default() }
	}

	/// Returns a configuration that admits every request.
	pub fn disabled() -> Self {
		Self { enabled: false, ..Self::default() }
	}

	/// Overrides the idle threshold.
	pub fn with_idle_timeout(mut self, idle_timeout: StdDuration) -> Self {
		self.idle_timeout = idle_timeout;

		self
	}

	/// Overrides the sweep interval.
	pub fn with_sweep_interval(mut self, sweep_interval: StdDuration) -> Self {
		self.sweep_interval = sweep_interval;

		self
	}

	/// Rejects rates, bursts, and intervals the bucket math cannot use.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if !self.rps.is_finite() || self.rps <= 0. {
			return Err(ConfigError::InvalidRate { rps: self.rps });
		}
		if self.burst == 0 {
			return Err(ConfigError::ZeroBurst);
		}
		if self.idle_timeout.is_zero() {
			return Err(ConfigError::ZeroDuration { field: "idle_timeout" });
		}
		if self.sweep_interval.is_zero() {
			return Err(ConfigError::ZeroDuration { field: "sweep_interval" });
		}

		Ok(())
	}
}
impl Default for LimiterConfig {
	fn default() -> Self {
		Self {
			enabled: true,
			rps: Self::DEFAULT_RPS,
			burst: Self::DEFAULT_BURST,
			idle_timeout: Self::DEFAULT_IDLE_TIMEOUT,
			sweep_interval: Self::DEFAULT_SWEEP_INTERVAL,
		}
	}
}

/// Lifetime of each token scope, applied at issuance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenTtls {
	/// Bearer credential lifetime.
	#[serde(with = "seconds", rename = "authentication_secs")]
	pub authentication: StdDuration,
	/// Account activation token lifetime.
	#[serde(with = "seconds", rename = "activation_secs")]
	pub activation: StdDuration,
	/// Password reset token lifetime.
	#[serde(with = "seconds", rename = "password_reset_secs")]
	pub password_reset: StdDuration,
}
impl TokenTtls {
	/// Longest lifetime any scope may be configured with.
	pub const MAX_TTL: StdDuration = StdDuration::from_secs(366 * 24 * 60 * 60);

	/// Returns the lifetime configured for `scope`.
	pub fn for_scope(&self, scope: TokenScope) -> Duration {
		Duration::try_from(self.std_for_scope(scope)).unwrap_or(Duration::MAX)
	}

	/// Rejects zero TTLs and TTLs longer than [`Self::MAX_TTL`].
	pub fn validate(&self) -> Result<(), ConfigError> {
		for scope in TokenScope::ALL {
			let ttl = self.std_for_scope(scope);

			if ttl.is_zero() {
				return Err(ConfigError::NonPositiveTtl { scope: scope.as_str() });
			}
			if ttl > Self::MAX_TTL {
				return Err(ConfigError::TtlTooLong {
					scope: scope.as_str(),
					max_secs: Self::MAX_TTL.as_secs(),
				});
			}
		}

		Ok(())
	}

	fn std_for_scope(&self, scope: TokenScope) -> StdDuration {
		match scope {
			TokenScope::Authentication => self.authentication,
			TokenScope::Activation => self.activation,
			TokenScope::PasswordReset => self.password_reset,
		}
	}
}
impl Default for TokenTtls {
	fn default() -> Self {
		Self {
			authentication: StdDuration::from_secs(72 * 60 * 60),
			activation: StdDuration::from_secs(72 * 60 * 60),
			password_reset: StdDuration::from_secs(45 * 60),
		}
	}
}

mod seconds {
	// std
	use std::time::Duration;
	// crates.io
	use serde::{Deserialize, Deserializer, Serializer};

	pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_u64(value.as_secs())
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
	where
		D: Deserializer<'de>,
	{
		u64::deserialize(deserializer).map(Duration::from_secs)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn defaults_are_valid() {
		let config = AdmissionConfig::default();

		config.validate().expect("Default configuration should validate.");

		assert!(config.limiter.enabled);
		assert_eq!(config.limiter.burst, 4);
		assert_eq!(config.ttl.for_scope(TokenScope::Authentication), Duration::hours(72));
		assert_eq!(config.ttl.for_scope(TokenScope::PasswordReset), Duration::minutes(45));
	}

	#[test]
	fn partial_json_falls_back_to_defaults() {
		let config: AdmissionConfig = serde_json::from_str(
			r#"{"limiter":{"rps":10.5,"idle_timeout_secs":30},"store_timeout_secs":1}"#,
		)
		.expect("Partial configuration should deserialize.");

		assert_eq!(config.limiter.rps, 10.5);
		assert_eq!(config.limiter.burst, LimiterConfig::DEFAULT_BURST);
		assert_eq!(config.limiter.idle_timeout, StdDuration::from_secs(30));
		assert_eq!(config.limiter.sweep_interval, StdDuration::from_secs(60));
		assert_eq!(config.store_timeout, StdDuration::from_secs(1));
		assert_eq!(config.ttl, TokenTtls::default());
	}

	#[test]
	fn invalid_limiter_values_are_rejected() {
		assert_eq!(
			LimiterConfig::new(0., 5).validate(),
			Err(ConfigError::InvalidRate { rps: 0. })
		);
		assert!(matches!(
			LimiterConfig::new(f64::NAN, 5).validate(),
			Err(ConfigError::InvalidRate { .. })
		));
		assert_eq!(LimiterConfig::new(2., 0).validate(), Err(ConfigError::ZeroBurst));
		assert_eq!(
			LimiterConfig::new(2., 5).with_sweep_interval(StdDuration::ZERO).validate(),
			Err(ConfigError::ZeroDuration { field: "sweep_interval" })
		);
	}

	#[test]
	fn zero_ttl_and_timeout_are_rejected() {
		let ttl = TokenTtls { password_reset: StdDuration::ZERO, ..TokenTtls::default() };

		assert_eq!(
			AdmissionConfig::default().with_ttl(ttl).validate(),
			Err(ConfigError::NonPositiveTtl { scope: "password-reset" })
		);
		assert_eq!(
			AdmissionConfig::default().with_store_timeout(StdDuration::ZERO).validate(),
			Err(ConfigError::ZeroDuration { field: "store_timeout" })
		);
	}

	#[test]
	fn oversized_ttl_is_rejected() {
		let config: AdmissionConfig =
			serde_json::from_str(r#"{"ttl":{"authentication_secs":18446744073709551615}}"#)
				.expect("Oversized TTL should still deserialize.");

		assert_eq!(
			config.validate(),
			Err(ConfigError::TtlTooLong {
				scope: "authentication",
				max_secs: TokenTtls::MAX_TTL.as_secs(),
			})
		);

		let at_limit = TokenTtls { activation: TokenTtls::MAX_TTL, ..TokenTtls::default() };

		assert_eq!(at_limit.validate(), Ok(()));
	}

	#[test]
	fn disabled_limiter_section_is_not_checked() {
		let limiter =
			LimiterConfig { sweep_interval: StdDuration::ZERO, ..LimiterConfig::disabled() };

		assert_eq!(AdmissionConfig::default().with_limiter(limiter).validate(), Ok(()));
	}
}
