//! Request admission for first-party HTTP APIs: scoped bearer tokens that are hashed at rest,
//! plus per-client token-bucket rate limiting with idle eviction, composed into one
//! middleware pipeline.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod admission;
pub mod auth;
pub mod config;
pub mod error;
pub mod limiter;
pub mod obs;
pub mod store;
pub mod tokens;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		admission::AdmissionPipeline,
		auth::{Subject, SubjectId},
		config::AdmissionConfig,
		store::{MemoryStore, TokenStore},
		tokens::TokenService,
	};

	/// Builds a subject identifier, panicking on invalid fixtures.
	pub fn subject_id(value: &str) -> SubjectId {
		SubjectId::new(value).expect("Subject fixture should be a valid identifier.")
	}

	/// Builds a [`TokenService`] backed by an in-memory store that already knows `subjects`.
	pub fn build_test_tokens(
		config: &AdmissionConfig,
		subjects: impl IntoIterator<Item = Subject>,
	) -> (TokenService, Arc<MemoryStore>) {
		let backend = Arc::new(MemoryStore::default());

		for subject in subjects {
			backend.upsert_subject(subject);
		}

		let store: Arc<dyn TokenStore> = backend.clone();

		let tokens = TokenService::new(store, config)
			.expect("Test configuration should build a token service.");

		(tokens, backend)
	}

	/// Constructs an [`AdmissionPipeline`] (plus its shared pieces) for integration tests.
	pub fn build_test_pipeline(
		config: AdmissionConfig,
		subjects: impl IntoIterator<Item = Subject>,
	) -> (AdmissionPipeline, TokenService, Arc<MemoryStore>) {
		let (tokens, backend) = build_test_tokens(&config, subjects);
		let pipeline = AdmissionPipeline::from_config(tokens.clone(), &config.limiter)
			.expect("Test configuration should build an admission pipeline.");

		(pipeline, tokens, backend)
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		net::{IpAddr, SocketAddr},
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};

	pub use crate::error::{Error, Result};
}

#[cfg(test)] use color_eyre as _;
