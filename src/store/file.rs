//! Simple file-backed [`TokenStore`] for single-node deployments.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	auth::{Subject, SubjectId, TokenHash, TokenRecord, TokenScope},
	store::{StoreError, StoreFuture, StoreSnapshot, Tables, TokenStore},
};

/// Persists subjects and token hashes to a JSON file after each mutation.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	inner: Arc<RwLock<Tables>>,
}
impl FileStore {
	/// Opens (or creates) a store at the provided path, eagerly loading existing data.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		let snapshot = Self::load_snapshot(&path)?;

		Ok(Self { path, inner: Arc::new(RwLock::new(Tables::from_snapshot(snapshot))) })
	}

	/// Inserts or replaces a subject and persists the change.
	///
	/// On a failed write the previous subject (if any) is put back.
	pub fn upsert_subject(&self, subject: Subject) -> Result<(), StoreError> {
		let mut guard = self.inner.write();
		let id = subject.id.clone();
		let previous = guard.subjects.insert(id.clone(), subject);

		if let Err(e) = self.persist_locked(&guard) {
			match previous {
				Some(previous) => guard.subjects.insert(id, previous),
				None => guard.subjects.remove(&id),
			};

			return Err(e);
		}

		Ok(())
	}

	fn load_snapshot(path: &Path) -> Result<StoreSnapshot, StoreError> {
		if !path.exists() {
			return Ok(StoreSnapshot::default());
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;

		if bytes.is_empty() {
			return Ok(StoreSnapshot::default());
		}

		let mut deserializer = serde_json::Deserializer::from_slice(&bytes);

		serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
			let message =
				format!("Failed to parse {} at `{}`: {}", path.display(), e.path(), e.inner());

			StoreError::Serialization { message }
		})
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn persist_locked(&self, tables: &Tables) -> Result<(), StoreError> {
		Self::ensure_parent_exists(&self.path)?;

		let serialized = serde_json::to_vec_pretty(&tables.to_snapshot()).map_err(|e| {
			StoreError::Serialization { message: format!("Failed to serialize store snapshot: {e}") }
		})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}
}
impl TokenStore for FileStore {
	fn insert(&self, record: TokenRecord) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			let mut guard = self.inner.write();

			guard.insert(record.clone())?;

			if let Err(e) = self.persist_locked(&guard) {
				guard.tokens.remove(&record.hash);

				return Err(e);
			}

			Ok(())
		})
	}

	fn find_subject<'a>(
		&'a self,
		hash: &'a TokenHash,
		scope: TokenScope,
		now: OffsetDateTime,
	) -> StoreFuture<'a, Option<Subject>> {
		Box::pin(async move { Ok(self.inner.read().find_subject(hash, scope, now)) })
	}

	fn delete_all<'a>(
		&'a self,
		subject: &'a SubjectId,
		scope: TokenScope,
	) -> StoreFuture<'a, u64> {
		Box::pin(async move {
			let mut guard = self.inner.write();
			let removed = guard.take_all(subject, scope);

			if removed.is_empty() {
				return Ok(0);
			}
			if let Err(e) = self.persist_locked(&guard) {
				guard.restore(removed);

				return Err(e);
			}

			Ok(removed.len() as u64)
		})
	}

	fn set_activated<'a>(
		&'a self,
		subject: &'a SubjectId,
		activated: bool,
	) -> StoreFuture<'a, Option<Subject>> {
		Box::pin(async move {
			let mut guard = self.inner.write();
			let Some(previous) = guard.subjects.get(subject).map(|entry| entry.activated) else {
				return Ok(None);
			};
			let updated = guard.set_activated(subject, activated);

			if let Err(e) = self.persist_locked(&guard) {
				guard.set_activated(subject, previous);

				return Err(e);
			}

			Ok(updated)
		})
	}
}
