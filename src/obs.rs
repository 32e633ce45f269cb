//! Optional observability helpers for the admission pipeline and token service.
//!
//! # Feature Flags
//!
//! - Enable `tracing` (default) to emit spans named `token_admission.stage` with the `stage`
//!   field, `error` events for internal failures, and `debug` events for eviction sweeps.
//! - Enable `metrics` to increment the `token_admission_outcome_total` counter for every
//!   stage decision, labeled by `stage` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Points in the request or issuance path that report outcomes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
	/// Per-client rate-limit gate.
	RateLimit,
	/// `Authorization` header parsing and token resolution.
	Identity,
	/// Per-endpoint authenticated/activated gates.
	Authorization,
	/// Token issuance.
	Issue,
	/// Token revocation.
	Revoke,
	/// Account activation through an activation token.
	Activate,
}
impl Stage {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Stage::RateLimit => "rate_limit",
			Stage::Identity => "identity",
			Stage::Authorization => "authorization",
			Stage::Issue => "issue",
			Stage::Revoke => "revoke",
			Stage::Activate => "activate",
		}
	}
}
impl Display for Stage {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each stage decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
	/// The request or operation moved on.
	Allowed,
	/// The caller was turned away (client error).
	Rejected,
	/// A server-side fault stopped the stage.
	Failed,
}
impl Outcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Outcome::Allowed => "allowed",
			Outcome::Rejected => "rejected",
			Outcome::Failed => "failed",
		}
	}
}
impl Display for Outcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
