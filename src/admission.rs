//! Request admission: rate limiting, bearer token resolution, and authorization gates.
//!
//! [`AdmissionPipeline::admit`] runs the per-request stages in order:
//!
//! 1. the rate-limit gate (skipped when the limiter is disabled),
//! 2. identity resolution from the `Authorization` header.
//!
//! A rejection at any stage short-circuits the rest. Authorization [`Gate`]s run later, per
//! endpoint, against the [`Identity`] the pipeline attached. [`AdmissionLayer`] and
//! [`GateLayer`] wire the same logic into a `tower` stack.

pub mod client_addr;
pub mod credential;
pub mod gate;
pub mod layer;

pub use client_addr::*;
pub use credential::*;
pub use gate::*;
pub use layer::*;

// crates.io
use http::{
	HeaderMap, HeaderValue, Response, StatusCode,
	header::{CONTENT_TYPE, WWW_AUTHENTICATE},
};
// self
use crate::{
	_prelude::*,
	auth::{Identity, TokenScope},
	config::LimiterConfig,
	limiter::ClientLimiterRegistry,
	obs::{self, Outcome, Stage, StageSpan},
	tokens::{ResolveError, TokenService},
};

/// Reason a request was turned away. Each tag maps to its own response category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ThisError)]
pub enum Rejection {
	/// `Authorization` header present but not `Bearer <token>`, or the token is not
	/// syntactically valid.
	#[error("invalid or missing authentication token")]
	MalformedCredential,
	/// Well-formed token that does not resolve (unknown, revoked, or expired).
	#[error("invalid or missing authentication token")]
	InvalidCredential,
	/// The client used up its rate-limit budget.
	#[error("rate limit exceeded")]
	RateLimitExceeded,
	/// The endpoint needs an authenticated subject but the request was anonymous.
	#[error("you must be authenticated to access this resource")]
	AuthenticationRequired,
	/// The endpoint needs an activated account.
	#[error("your user account must be activated to access this resource")]
	AccountInactive,
	/// Server-side failure; details are logged, never returned.
	#[error("the server encountered a problem and could not process your request")]
	Internal,
}
impl Rejection {
	/// Returns a stable tag suitable for logs and metrics.
	pub const fn as_str(self) -> &'static str {
		match self {
			Rejection::MalformedCredential => "malformed_credential",
			Rejection::InvalidCredential => "invalid_credential",
			Rejection::RateLimitExceeded => "rate_limit_exceeded",
			Rejection::AuthenticationRequired => "authentication_required",
			Rejection::AccountInactive => "account_inactive",
			Rejection::Internal => "internal_error",
		}
	}

	/// HTTP status for this rejection.
	pub const fn status(self) -> StatusCode {
		match self {
			Rejection::MalformedCredential
			| Rejection::InvalidCredential
			| Rejection::AuthenticationRequired => StatusCode::UNAUTHORIZED,
			Rejection::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
			Rejection::AccountInactive => StatusCode::FORBIDDEN,
			Rejection::Internal => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	/// `WWW-Authenticate` challenge sent with credential rejections.
	pub const fn challenge(self) -> Option<&'static str> {
		match self {
			Rejection::MalformedCredential | Rejection::InvalidCredential => Some("Bearer"),
			_ => None,
		}
	}

	/// Client-facing message.
	pub fn message(self) -> String {
		self.to_string()
	}

	/// Renders the rejection as a JSON `{"error": ...}` response.
	pub fn into_response<B>(self) -> Response<B>
	where
		B: From<String>,
	{
		let body = serde_json::json!({ "error": self.message() }).to_string();
		let mut response = Response::new(B::from(body));

		*response.status_mut() = self.status();

		response.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

		if let Some(challenge) = self.challenge() {
			response.headers_mut().insert(WWW_AUTHENTICATE, HeaderValue::from_static(challenge));
		}

		response
	}
}

/// Composes the rate-limit gate and identity resolution for inbound requests.
#[derive(Clone, Debug)]
pub struct AdmissionPipeline {
	tokens: TokenService,
	limiter: Option<Arc<ClientLimiterRegistry>>,
}
impl AdmissionPipeline {
	/// Creates a pipeline. Passing `None` disables rate limiting.
	pub fn new(tokens: TokenService, limiter: Option<Arc<ClientLimiterRegistry>>) -> Self {
		Self { tokens, limiter }
	}

	/// Creates a pipeline with a fresh registry when `config.enabled` is set.
	///
	/// Fails with [`Error::Config`] when an enabled limiter section is unusable. The caller
	/// still owns the sweep lifecycle; see [`ClientLimiterRegistry::spawn_sweeper`].
	pub fn from_config(tokens: TokenService, config: &LimiterConfig) -> Result<Self> {
		let limiter = if config.enabled {
			Some(Arc::new(ClientLimiterRegistry::new(config.clone())?))
		} else {
			None
		};

		Ok(Self::new(tokens, limiter))
	}

	/// Rate limiter in use, if enabled.
	pub fn limiter(&self) -> Option<&Arc<ClientLimiterRegistry>> {
		self.limiter.as_ref()
	}

	/// Token service used for identity resolution.
	pub fn tokens(&self) -> &TokenService {
		&self.tokens
	}

	/// Runs every per-request stage and returns the identity to attach downstream.
	pub async fn admit(
		&self,
		headers: &HeaderMap,
		peer: Option<IpAddr>,
	) -> Result<Identity, Rejection> {
		self.check_rate(headers, peer)?;
		self.resolve_identity(headers).await
	}

	/// Rate-limit gate. Always passes when the limiter is disabled.
	pub fn check_rate(&self, headers: &HeaderMap, peer: Option<IpAddr>) -> Result<(), Rejection> {
		let Some(limiter) = &self.limiter else {
			return Ok(());
		};
		let key = client_key(headers, peer);

		if limiter.admit(&key) {
			obs::record_outcome(Stage::RateLimit, Outcome::Allowed);

			Ok(())
		} else {
			reject(Stage::RateLimit, Rejection::RateLimitExceeded)
		}
	}

	/// Identity resolution from the `Authorization` header.
	///
	/// Absent header resolves to [`Identity::Anonymous`] without touching the store, as do
	/// malformed headers and implausible tokens, which are rejected instead.
	pub async fn resolve_identity(&self, headers: &HeaderMap) -> Result<Identity, Rejection> {
		let token = match bearer_credential(headers) {
			Ok(Credential::Absent) => {
				obs::record_outcome(Stage::Identity, Outcome::Allowed);

				return Ok(Identity::Anonymous);
			},
			Ok(Credential::Bearer(token)) => token,
			Err(rejection) => return reject(Stage::Identity, rejection),
		};
		let span = StageSpan::new(Stage::Identity);

		match span
			.instrument(self.tokens.resolve_for_authentication(token, TokenScope::Authentication))
			.await
		{
			Ok(subject) => {
				obs::record_outcome(Stage::Identity, Outcome::Allowed);

				Ok(Identity::Authenticated(subject))
			},
			Err(ResolveError::NotFound) => reject(Stage::Identity, Rejection::InvalidCredential),
			Err(ResolveError::Internal(e)) => {
				obs::report_internal(Stage::Identity, &e);
				obs::record_outcome(Stage::Identity, Outcome::Failed);

				Err(Rejection::Internal)
			},
		}
	}
}

fn reject<T>(stage: Stage, rejection: Rejection) -> Result<T, Rejection> {
	obs::report_rejection(stage, rejection.as_str());
	obs::record_outcome(stage, Outcome::Rejected);

	Err(rejection)
}
