//! Persisted token records and the one-time issuance result.

// self
use crate::{
	_prelude::*,
	auth::{SubjectId, TokenHash, TokenScope, TokenSecret},
};

/// Current lifecycle status for a token record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenStatus {
	/// Token is currently valid.
	Active,
	/// Token reached its expiry instant.
	Expired,
}

/// Stored form of an issued token. Never carries the plaintext.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
	/// SHA-256 of the plaintext; unique across the store.
	pub hash: TokenHash,
	/// Subject the token authenticates.
	pub subject: SubjectId,
	/// Purpose the token was issued for.
	pub scope: TokenScope,
	/// Issuance instant.
	#[serde(with = "time::serde::rfc3339")]
	pub issued_at: OffsetDateTime,
	/// First instant at which the token is no longer accepted.
	#[serde(with = "time::serde::rfc3339")]
	pub expires_at: OffsetDateTime,
}
impl TokenRecord {
	/// Creates a record valid for `ttl` starting at `issued_at`.
	///
	/// Fails with [`Error::TtlOutOfRange`] when the expiry is not representable.
	pub fn new(
		hash: TokenHash,
		subject: SubjectId,
		scope: TokenScope,
		issued_at: OffsetDateTime,
		ttl: Duration,
	) -> Result<Self> {
		let expires_at = issued_at.checked_add(ttl).ok_or(Error::TtlOutOfRange { ttl })?;

		Ok(Self { hash, subject, scope, issued_at, expires_at })
	}

	/// Computes the lifecycle status at a given instant.
	pub fn status_at(&self, instant: OffsetDateTime) -> TokenStatus {
		if instant >= self.expires_at { TokenStatus::Expired } else { TokenStatus::Active }
	}

	/// Returns `true` if the record has expired at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		matches!(self.status_at(instant), TokenStatus::Expired)
	}

	/// Returns `true` if the record is expired relative to the current clock.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc())
	}

	/// Returns `true` if this record answers a lookup for `scope` at `instant`.
	pub fn matches(&self, scope: TokenScope, instant: OffsetDateTime) -> bool {
		self.scope == scope && !self.is_expired_at(instant)
	}
}

/// Result of issuing a token: the stored record plus the plaintext shown exactly once.
#[derive(Clone, Debug)]
pub struct IssuedToken {
	/// Plaintext to hand to the caller; not retrievable afterwards.
	pub secret: TokenSecret,
	/// Record that was persisted.
	pub record: TokenRecord,
}
impl IssuedToken {
	/// Expiry instant of the issued token.
	pub fn expires_at(&self) -> OffsetDateTime {
		self.record.expires_at
	}
}
