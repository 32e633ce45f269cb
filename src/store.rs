//! Storage contracts and built-in store implementations for token records.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{Subject, SubjectId, TokenHash, TokenRecord, TokenScope},
};

/// Boxed future returned by every [`TokenStore`] operation.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Persistence contract for token hashes and the subjects they authenticate.
///
/// Each method is a single atomic operation against the backend. Expiry is evaluated at
/// read time against the instant supplied by the caller; implementations must not cache
/// validity across calls.
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Persists a new record. Fails with [`StoreError::Conflict`] if the hash already exists.
	fn insert(&self, record: TokenRecord) -> StoreFuture<'_, ()>;

	/// Resolves the subject owning `hash` for `scope`, ignoring records expired at `now`.
	fn find_subject<'a>(
		&'a self,
		hash: &'a TokenHash,
		scope: TokenScope,
		now: OffsetDateTime,
	) -> StoreFuture<'a, Option<Subject>>;

	/// Deletes every record for the subject + scope pair, returning how many were removed.
	fn delete_all<'a>(&'a self, subject: &'a SubjectId, scope: TokenScope)
	-> StoreFuture<'a, u64>;

	/// Flips the subject's activation flag, returning the updated subject if it exists.
	fn set_activated<'a>(
		&'a self,
		subject: &'a SubjectId,
		activated: bool,
	) -> StoreFuture<'a, Option<Subject>>;
}

/// Error type produced by [`TokenStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// A record with the same hash already exists.
	#[error("Token hash already exists.")]
	Conflict,
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Token and subject tables shared by the built-in stores.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StoreSnapshot {
	/// Known subjects keyed by identifier.
	pub subjects: HashMap<SubjectId, Subject>,
	/// Every persisted token record.
	pub tokens: Vec<TokenRecord>,
}

#[derive(Debug, Default)]
struct Tables {
	subjects: HashMap<SubjectId, Subject>,
	tokens: HashMap<TokenHash, TokenRecord>,
}
impl Tables {
	fn from_snapshot(snapshot: StoreSnapshot) -> Self {
		let tokens = snapshot.tokens.into_iter().map(|record| (record.hash, record)).collect();

		Self { subjects: snapshot.subjects, tokens }
	}

	fn to_snapshot(&self) -> StoreSnapshot {
		StoreSnapshot {
			subjects: self.subjects.clone(),
			tokens: self.tokens.values().cloned().collect(),
		}
	}

	fn insert(&mut self, record: TokenRecord) -> Result<(), StoreError> {
		if self.tokens.contains_key(&record.hash) {
			return Err(StoreError::Conflict);
		}

		self.tokens.insert(record.hash, record);

		Ok(())
	}

	fn find_subject(
		&self,
		hash: &TokenHash,
		scope: TokenScope,
		now: OffsetDateTime,
	) -> Option<Subject> {
		self.tokens
			.get(hash)
			.filter(|record| record.matches(scope, now))
			.and_then(|record| self.subjects.get(&record.subject))
			.cloned()
	}

	fn delete_all(&mut self, subject: &SubjectId, scope: TokenScope) -> u64 {
		self.take_all(subject, scope).len() as u64
	}

	fn take_all(&mut self, subject: &SubjectId, scope: TokenScope) -> Vec<TokenRecord> {
		let hashes = self
			.tokens
			.values()
			.filter(|record| record.subject == *subject && record.scope == scope)
			.map(|record| record.hash)
			.collect::<Vec<_>>();

		hashes.iter().filter_map(|hash| self.tokens.remove(hash)).collect()
	}

	fn restore(&mut self, records: Vec<TokenRecord>) {
		self.tokens.extend(records.into_iter().map(|record| (record.hash, record)));
	}

	fn set_activated(&mut self, subject: &SubjectId, activated: bool) -> Option<Subject> {
		self.subjects.get_mut(subject).map(|entry| {
			entry.activated = activated;

			entry.clone()
		})
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::error::Error as StdError;
	// crates.io
	use time::macros;
	// self
	use super::*;
	use crate::auth::codec;

	fn subject(id: &str) -> SubjectId {
		SubjectId::new(id).expect("Subject fixture should be valid.")
	}

	fn record(plaintext: &str, owner: &str, scope: TokenScope) -> TokenRecord {
		TokenRecord::new(
			codec::hash_of(plaintext),
			subject(owner),
			scope,
			macros::datetime!(2025-01-01 00:00 UTC),
			Duration::hours(1),
		)
		.expect("Record fixture should build.")
	}

	#[test]
	fn store_error_converts_into_crate_error_transparently() {
		let store_error = StoreError::Backend { message: "database unreachable".into() };
		let error: Error = store_error.clone().into();

		assert!(matches!(error, Error::Storage(_)));
		assert_eq!(error.to_string(), store_error.to_string());
		assert!(
			StdError::source(&error).is_none(),
			"A transparent variant must not report the store error a second time."
		);
	}

	#[test]
	fn tables_join_tokens_with_subjects() {
		let mut tables = Tables::default();
		let now = macros::datetime!(2025-01-01 00:30 UTC);

		tables.subjects.insert(subject("admin-1"), Subject::new(subject("admin-1"), true));
		tables
			.insert(record("AAECAwQFBgcICQoLDA0ODw", "admin-1", TokenScope::Authentication))
			.expect("First insert should succeed.");
		tables
			.insert(record("BBECAwQFBgcICQoLDA0ODw", "ghost", TokenScope::Authentication))
			.expect("Tokens for unknown subjects may still be stored.");

		let hash = codec::hash_of("AAECAwQFBgcICQoLDA0ODw");

		assert_eq!(
			tables.find_subject(&hash, TokenScope::Authentication, now).map(|s| s.id),
			Some(subject("admin-1"))
		);
		assert_eq!(tables.find_subject(&hash, TokenScope::Activation, now), None);
		assert_eq!(
			tables.find_subject(
				&codec::hash_of("BBECAwQFBgcICQoLDA0ODw"),
				TokenScope::Authentication,
				now
			),
			None,
			"Tokens whose subject is gone must not resolve."
		);
	}

	#[test]
	fn duplicate_hashes_conflict() {
		let mut tables = Tables::default();

		tables
			.insert(record("AAECAwQFBgcICQoLDA0ODw", "admin-1", TokenScope::Authentication))
			.expect("First insert should succeed.");

		assert_eq!(
			tables.insert(record("AAECAwQFBgcICQoLDA0ODw", "admin-2", TokenScope::Activation)),
			Err(StoreError::Conflict)
		);
	}

	#[test]
	fn delete_all_only_touches_the_subject_scope_pair() {
		let mut tables = Tables::default();

		for (plaintext, owner, scope) in [
			("AAECAwQFBgcICQoLDA0ODw", "admin-1", TokenScope::Authentication),
			("BBECAwQFBgcICQoLDA0ODw", "admin-1", TokenScope::Authentication),
			("CCECAwQFBgcICQoLDA0ODw", "admin-1", TokenScope::Activation),
			("DDECAwQFBgcICQoLDA0ODw", "admin-2", TokenScope::Authentication),
		] {
			tables.insert(record(plaintext, owner, scope)).expect("Fixture insert should succeed.");
		}

		assert_eq!(tables.delete_all(&subject("admin-1"), TokenScope::Authentication), 2);
		assert_eq!(tables.delete_all(&subject("admin-1"), TokenScope::Authentication), 0);
		assert_eq!(tables.tokens.len(), 2);
	}

	#[test]
	fn snapshot_round_trips_through_json() {
		let mut tables = Tables::default();

		tables.subjects.insert(subject("admin-1"), Subject::new(subject("admin-1"), false));
		tables
			.insert(record("AAECAwQFBgcICQoLDA0ODw", "admin-1", TokenScope::PasswordReset))
			.expect("Fixture insert should succeed.");

		let payload =
			serde_json::to_string(&tables.to_snapshot()).expect("Snapshot should serialize.");
		let restored = Tables::from_snapshot(
			serde_json::from_str(&payload).expect("Snapshot should deserialize."),
		);

		assert_eq!(restored.tokens.len(), 1);
		assert_eq!(restored.subjects.len(), 1);
		assert!(restored.tokens.contains_key(&codec::hash_of("AAECAwQFBgcICQoLDA0ODw")));
	}
}
