//! Opaque bearer token generation and hashing.
//!
//! Plaintext tokens are 16 random bytes rendered as unpadded URL-safe base64 (22
//! characters). Only the SHA-256 digest of the plaintext is ever persisted, so a leaked
//! store cannot be replayed as credentials.

// std
use std::hash::{Hash, Hasher};
// crates.io
use base64::{
	Engine as _,
	engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD},
};
use rand::{TryRngCore, rngs::OsRng};
use serde::{Deserializer, Serializer, de::Error as DeError};
use sha2::{Digest, Sha256};
// self
use crate::{_prelude::*, auth::TokenSecret};

/// Random bytes drawn per token.
pub const TOKEN_ENTROPY_BYTES: usize = 16;
/// Character count of an encoded plaintext token.
pub const TOKEN_PLAINTEXT_LEN: usize = 22;

const HASH_LEN: usize = 32;

/// SHA-256 digest identifying a token in storage.
///
/// Equality runs in time independent of where the digests differ.
#[derive(Clone, Copy)]
pub struct TokenHash([u8; HASH_LEN]);
impl TokenHash {
	/// Wraps an existing digest.
	pub const fn from_bytes(bytes: [u8; HASH_LEN]) -> Self {
		Self(bytes)
	}

	/// Returns the raw digest bytes.
	pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
		&self.0
	}

	/// Base64 (no padding) rendering used for persistence.
	pub fn encode(&self) -> String {
		STANDARD_NO_PAD.encode(self.0)
	}

	fn decode(encoded: &str) -> Option<Self> {
		let bytes = STANDARD_NO_PAD.decode(encoded).ok()?;

		<[u8; HASH_LEN]>::try_from(bytes.as_slice()).ok().map(Self)
	}
}
impl PartialEq for TokenHash {
	fn eq(&self, other: &Self) -> bool {
		self.0.iter().zip(other.0.iter()).fold(0_u8, |acc, (lhs, rhs)| acc | (lhs ^ rhs)) == 0
	}
}
impl Eq for TokenHash {}
impl Hash for TokenHash {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.0.hash(state);
	}
}
impl Debug for TokenHash {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenHash").field(&self.encode()).finish()
	}
}
impl Serialize for TokenHash {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&self.encode())
	}
}
impl<'de> Deserialize<'de> for TokenHash {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let encoded = String::deserialize(deserializer)?;

		Self::decode(&encoded)
			.ok_or_else(|| DeError::custom("token hash must be 32 bytes of unpadded base64"))
	}
}

/// Generates a fresh plaintext token and its storage hash from the OS random source.
pub fn generate() -> Result<(TokenSecret, TokenHash)> {
	generate_with(&mut OsRng)
}

/// Generates a token from the provided random source.
///
/// A failing source is reported as [`Error::Entropy`]; issuance must stop rather than fall
/// back to weaker randomness.
pub fn generate_with<R>(rng: &mut R) -> Result<(TokenSecret, TokenHash)>
where
	R: ?Sized + TryRngCore,
{
	let mut raw = [0_u8; TOKEN_ENTROPY_BYTES];

	rng.try_fill_bytes(&mut raw).map_err(|e| Error::Entropy { message: e.to_string() })?;

	let plaintext = URL_SAFE_NO_PAD.encode(raw);
	let hash = hash_of(&plaintext);

	Ok((TokenSecret::new(plaintext), hash))
}

/// Derives the storage hash of a caller-supplied plaintext.
pub fn hash_of(plaintext: &str) -> TokenHash {
	TokenHash(Sha256::digest(plaintext.as_bytes()).into())
}

/// Cheap syntactic check run before any store lookup.
pub fn is_plausible(plaintext: &str) -> bool {
	plaintext.len() == TOKEN_PLAINTEXT_LEN
		&& plaintext.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}
