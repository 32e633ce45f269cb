//! Thread-safe in-memory [`TokenStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::{Subject, SubjectId, TokenHash, TokenRecord, TokenScope},
	store::{StoreError, StoreFuture, Tables, TokenStore},
};

type StoreMap = Arc<RwLock<Tables>>;

/// Thread-safe storage backend that keeps records in-process for tests and demos.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Inserts or replaces a subject so its tokens can resolve.
	pub fn upsert_subject(&self, subject: Subject) {
		self.0.write().subjects.insert(subject.id.clone(), subject);
	}

	/// Returns the stored subject, if known.
	pub fn subject(&self, id: &SubjectId) -> Option<Subject> {
		self.0.read().subjects.get(id).cloned()
	}

	/// Number of token records currently held, expired ones included.
	pub fn token_count(&self) -> usize {
		self.0.read().tokens.len()
	}

	/// Returns `true` if a record with this hash is stored.
	pub fn contains(&self, hash: &TokenHash) -> bool {
		self.0.read().tokens.contains_key(hash)
	}

	fn insert_now(map: StoreMap, record: TokenRecord) -> Result<(), StoreError> {
		map.write().insert(record)
	}

	fn find_now(
		map: StoreMap,
		hash: TokenHash,
		scope: TokenScope,
		now: OffsetDateTime,
	) -> Option<Subject> {
		map.read().find_subject(&hash, scope, now)
	}
}
impl TokenStore for MemoryStore {
	fn insert(&self, record: TokenRecord) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move { Self::insert_now(map, record) })
	}

	fn find_subject<'a>(
		&'a self,
		hash: &'a TokenHash,
		scope: TokenScope,
		now: OffsetDateTime,
	) -> StoreFuture<'a, Option<Subject>> {
		let map = self.0.clone();
		let hash = hash.to_owned();

		Box::pin(async move { Ok(Self::find_now(map, hash, scope, now)) })
	}

	fn delete_all<'a>(
		&'a self,
		subject: &'a SubjectId,
		scope: TokenScope,
	) -> StoreFuture<'a, u64> {
		let map = self.0.clone();
		let subject = subject.to_owned();

		Box::pin(async move { Ok(map.write().delete_all(&subject, scope)) })
	}

	fn set_activated<'a>(
		&'a self,
		subject: &'a SubjectId,
		activated: bool,
	) -> StoreFuture<'a, Option<Subject>> {
		let map = self.0.clone();
		let subject = subject.to_owned();

		Box::pin(async move { Ok(map.write().set_activated(&subject, activated)) })
	}
}
