//! `Authorization` header parsing.

// crates.io
use http::{HeaderMap, header::AUTHORIZATION};
// self
use crate::{admission::Rejection, auth::codec};

/// Credential carried by a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Credential<'a> {
	/// No `Authorization` header; the request proceeds anonymously.
	Absent,
	/// Syntactically plausible bearer token, not yet checked against the store.
	Bearer(&'a str),
}

/// Extracts the bearer token from the first `Authorization` header.
///
/// The header must be exactly `Bearer <token>`: two parts split on a single space, with the
/// case-sensitive `Bearer` scheme. Anything else, including an empty value, is malformed, as
/// is a token that fails [`codec::is_plausible`].
pub fn bearer_credential(headers: &HeaderMap) -> Result<Credential<'_>, Rejection> {
	let Some(value) = headers.get(AUTHORIZATION) else {
		return Ok(Credential::Absent);
	};
	let value = value.to_str().map_err(|_| Rejection::MalformedCredential)?;
	let mut parts = value.split(' ');
	let (Some("Bearer"), Some(token), None) = (parts.next(), parts.next(), parts.next()) else {
		return Err(Rejection::MalformedCredential);
	};

	if !codec::is_plausible(token) {
		return Err(Rejection::MalformedCredential);
	}

	Ok(Credential::Bearer(token))
}
