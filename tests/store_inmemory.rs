// crates.io
use time::{Duration, OffsetDateTime, macros};
// self
use token_admission::{
	auth::{Subject, SubjectId, TokenRecord, TokenScope, TokenStatus, codec},
	store::{MemoryStore, StoreError, TokenStore},
};

fn subject_id(value: &str) -> SubjectId {
	SubjectId::new(value).expect("Failed to build subject identifier for memory store tests.")
}

fn issued_at() -> OffsetDateTime {
	macros::datetime!(2025-11-10 12:00 UTC)
}

fn build_record(plaintext: &str, subject: &str, scope: TokenScope) -> TokenRecord {
	TokenRecord::new(
		codec::hash_of(plaintext),
		subject_id(subject),
		scope,
		issued_at(),
		Duration::hours(1),
	)
	.expect("Record fixture should build.")
}

fn seeded_store() -> MemoryStore {
	let store = MemoryStore::default();

	store.upsert_subject(Subject::new(subject_id("admin-1"), true));
	store.upsert_subject(Subject::new(subject_id("admin-2"), false));

	store
}

#[tokio::test]
async fn insert_and_find_round_trip() {
	let store = seeded_store();
	let record = build_record("AAECAwQFBgcICQoLDA0ODw", "admin-1", TokenScope::Authentication);

	store.insert(record.clone()).await.expect("Inserting record fixture should succeed.");

	let subject = store
		.find_subject(&record.hash, TokenScope::Authentication, issued_at())
		.await
		.expect("Lookup should succeed.")
		.expect("Stored record should resolve.");

	assert_eq!(subject, Subject::new(subject_id("admin-1"), true));
	assert_eq!(store.token_count(), 1);
}

#[tokio::test]
async fn duplicate_hash_is_a_conflict() {
	let store = seeded_store();
	let record = build_record("AAECAwQFBgcICQoLDA0ODw", "admin-1", TokenScope::Authentication);

	store.insert(record.clone()).await.expect("First insert should succeed.");

	let err = store.insert(record).await.expect_err("Second insert must conflict.");

	assert_eq!(err, StoreError::Conflict);
	assert_eq!(store.token_count(), 1);
}

#[tokio::test]
async fn lookups_respect_scope_and_expiry() {
	let store = seeded_store();
	let record = build_record("AAECAwQFBgcICQoLDA0ODw", "admin-1", TokenScope::PasswordReset);

	store.insert(record.clone()).await.expect("Insert should succeed.");

	assert!(
		store
			.find_subject(&record.hash, TokenScope::Authentication, issued_at())
			.await
			.expect("Lookup should succeed.")
			.is_none(),
		"Scope mismatch must not resolve."
	);
	assert!(
		store
			.find_subject(&record.hash, TokenScope::PasswordReset, record.expires_at)
			.await
			.expect("Lookup should succeed.")
			.is_none(),
		"A record is expired at its expiry instant."
	);
	assert_eq!(record.status_at(record.expires_at - Duration::SECOND), TokenStatus::Active);
	assert!(store.contains(&record.hash), "Expired records stay until deleted.");
}

#[tokio::test]
async fn tokens_of_unknown_subjects_do_not_resolve() {
	let store = seeded_store();
	let record = build_record("AAECAwQFBgcICQoLDA0ODw", "ghost", TokenScope::Authentication);

	store.insert(record.clone()).await.expect("Insert should succeed.");

	assert!(
		store
			.find_subject(&record.hash, TokenScope::Authentication, issued_at())
			.await
			.expect("Lookup should succeed.")
			.is_none()
	);
}

#[tokio::test]
async fn delete_all_only_touches_the_subject_and_scope() {
	let store = seeded_store();
	let records = [
		build_record("AAAAAAAAAAAAAAAAAAAAAA", "admin-1", TokenScope::Authentication),
		build_record("BBBBBBBBBBBBBBBBBBBBBB", "admin-1", TokenScope::Authentication),
		build_record("CCCCCCCCCCCCCCCCCCCCCC", "admin-1", TokenScope::Activation),
		build_record("DDDDDDDDDDDDDDDDDDDDDD", "admin-2", TokenScope::Authentication),
	];

	for record in &records {
		store.insert(record.clone()).await.expect("Insert should succeed.");
	}

	let removed = store
		.delete_all(&subject_id("admin-1"), TokenScope::Authentication)
		.await
		.expect("Delete should succeed.");

	assert_eq!(removed, 2);
	assert!(!store.contains(&records[0].hash));
	assert!(!store.contains(&records[1].hash));
	assert!(store.contains(&records[2].hash));
	assert!(store.contains(&records[3].hash));
	assert_eq!(
		store
			.delete_all(&subject_id("admin-1"), TokenScope::Authentication)
			.await
			.expect("Repeated delete should succeed."),
		0
	);
}

#[tokio::test]
async fn set_activated_updates_resolved_subjects() {
	let store = seeded_store();
	let record = build_record("AAECAwQFBgcICQoLDA0ODw", "admin-2", TokenScope::Authentication);

	store.insert(record.clone()).await.expect("Insert should succeed.");

	let updated = store
		.set_activated(&subject_id("admin-2"), true)
		.await
		.expect("Activation should succeed.")
		.expect("Known subject should be updated.");

	assert!(updated.activated);
	assert_eq!(
		store
			.find_subject(&record.hash, TokenScope::Authentication, issued_at())
			.await
			.expect("Lookup should succeed.")
			.map(|subject| subject.activated),
		Some(true)
	);
	assert!(
		store
			.set_activated(&subject_id("nobody"), true)
			.await
			.expect("Unknown subject is not an error.")
			.is_none()
	);
}
