//! Token issuance, resolution, and revocation on top of a [`TokenStore`].
//!
//! [`TokenService`] is the only place plaintext tokens exist: it generates them, persists
//! the hash, and hands the plaintext back exactly once. Lookups re-derive the hash from the
//! caller's plaintext and let the store compare expiry at read time. Every store call is
//! bounded by the configured deadline so a stalled backend surfaces as an internal error
//! instead of a hung request.

// std
use std::time::Duration as StdDuration;
// self
use crate::{
	_prelude::*,
	auth::{IssuedToken, Subject, SubjectId, TokenRecord, TokenScope, codec},
	config::{AdmissionConfig, TokenTtls},
	obs::{self, Outcome, Stage, StageSpan},
	store::{StoreFuture, TokenStore},
};

/// Failure modes of a token lookup.
///
/// `NotFound` covers unknown, revoked, expired, and wrong-scope tokens alike so callers cannot
/// learn which one applied.
#[derive(Debug, ThisError)]
pub enum ResolveError {
	/// No live token matches the plaintext and scope.
	#[error("Token is invalid or has expired.")]
	NotFound,
	/// The store failed or timed out.
	#[error(transparent)]
	Internal(#[from] Error),
}

/// Issues, resolves, and revokes scoped tokens.
#[derive(Clone)]
pub struct TokenService {
	store: Arc<dyn TokenStore>,
	ttl: TokenTtls,
	store_timeout: StdDuration,
}
impl TokenService {
	/// Creates a service over `store` using the TTLs and store deadline from `config`.
	///
	/// Fails with [`Error::Config`] when a TTL or the store deadline is unusable.
	pub fn new(store: Arc<dyn TokenStore>, config: &AdmissionConfig) -> Result<Self> {
		config.validate_tokens()?;

		Ok(Self { store, ttl: config.ttl.clone(), store_timeout: config.store_timeout })
	}

	/// Backing store.
	pub fn store(&self) -> &Arc<dyn TokenStore> {
		&self.store
	}

	/// Issues a token for `subject` valid for `ttl`.
	pub async fn issue(
		&self,
		subject: &SubjectId,
		ttl: Duration,
		scope: TokenScope,
	) -> Result<IssuedToken> {
		self.issue_at(subject, ttl, scope, OffsetDateTime::now_utc()).await
	}

	/// Issues a token using the TTL configured for `scope`.
	pub async fn issue_for(&self, subject: &SubjectId, scope: TokenScope) -> Result<IssuedToken> {
		self.issue(subject, self.ttl.for_scope(scope), scope).await
	}

	/// Issues a token whose lifetime starts at `now`.
	pub async fn issue_at(
		&self,
		subject: &SubjectId,
		ttl: Duration,
		scope: TokenScope,
		now: OffsetDateTime,
	) -> Result<IssuedToken> {
		let span = StageSpan::new(Stage::Issue);
		let result = span
			.instrument(async move {
				let (secret, hash) = codec::generate()?;
				let record = TokenRecord::new(hash, subject.to_owned(), scope, now, ttl)?;

				self.bounded(self.store.insert(record.clone())).await?;

				Ok(IssuedToken { secret, record })
			})
			.await;

		self.finish(Stage::Issue, &result);

		result
	}

	/// Resolves a plaintext token to its subject for `scope` using the current clock.
	pub async fn resolve_for_authentication(
		&self,
		plaintext: &str,
		scope: TokenScope,
	) -> Result<Subject, ResolveError> {
		self.resolve_at(plaintext, scope, OffsetDateTime::now_utc()).await
	}

	/// Resolves a plaintext token to its subject for `scope`, treating `now` as the read time.
	pub async fn resolve_at(
		&self,
		plaintext: &str,
		scope: TokenScope,
		now: OffsetDateTime,
	) -> Result<Subject, ResolveError> {
		let hash = codec::hash_of(plaintext);

		self.bounded(self.store.find_subject(&hash, scope, now))
			.await?
			.ok_or(ResolveError::NotFound)
	}

	/// Deletes every token the subject holds for `scope`. A no-op when none exist.
	pub async fn revoke_all(&self, subject: &SubjectId, scope: TokenScope) -> Result<u64> {
		let span = StageSpan::new(Stage::Revoke);
		let result = span.instrument(self.bounded(self.store.delete_all(subject, scope))).await;

		self.finish(Stage::Revoke, &result);

		result
	}

	/// Redeems an activation token: marks its subject activated and burns every activation
	/// token the subject holds.
	pub async fn activate(&self, plaintext: &str) -> Result<Subject, ResolveError> {
		let span = StageSpan::new(Stage::Activate);
		let result = span
			.instrument(async move {
				let subject =
					self.resolve_for_authentication(plaintext, TokenScope::Activation).await?;
				let activated = self
					.bounded(self.store.set_activated(&subject.id, true))
					.await?
					.ok_or(ResolveError::NotFound)?;

				self.bounded(self.store.delete_all(&activated.id, TokenScope::Activation)).await?;

				Ok(activated)
			})
			.await;

		match &result {
			Ok(_) => obs::record_outcome(Stage::Activate, Outcome::Allowed),
			Err(ResolveError::NotFound) => obs::record_outcome(Stage::Activate, Outcome::Rejected),
			Err(ResolveError::Internal(e)) => {
				obs::report_internal(Stage::Activate, e);
				obs::record_outcome(Stage::Activate, Outcome::Failed);
			},
		}

		result
	}

	async fn bounded<T>(&self, fut: StoreFuture<'_, T>) -> Result<T> {
		match tokio::time::timeout(self.store_timeout, fut).await {
			Ok(result) => result.map_err(Error::from),
			Err(_) => Err(Error::StoreTimeout { timeout: self.store_timeout }),
		}
	}

	fn finish<T>(&self, stage: Stage, result: &Result<T>) {
		match result {
			Ok(_) => obs::record_outcome(stage, Outcome::Allowed),
			Err(e) => {
				obs::report_internal(stage, e);
				obs::record_outcome(stage, Outcome::Failed);
			},
		}
	}
}
impl Debug for TokenService {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenService")
			.field("ttl", &self.ttl)
			.field("store_timeout", &self.store_timeout)
			.finish_non_exhaustive()
	}
}
