//! Resolved request identities.

// self
use crate::{_prelude::*, auth::SubjectId};

/// Admin account a valid token resolves to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
	/// Subject identifier.
	pub id: SubjectId,
	/// Whether the account completed activation.
	pub activated: bool,
}
impl Subject {
	/// Creates a subject record.
	pub fn new(id: SubjectId, activated: bool) -> Self {
		Self { id, activated }
	}
}

/// Identity attached to a request once the pipeline resolved its credentials.
///
/// `Anonymous` means no credential was presented, which is distinct from a rejected
/// credential: requests carrying a bad token never reach downstream handlers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Identity {
	/// No `Authorization` header was sent.
	#[default]
	Anonymous,
	/// A valid authentication token resolved to this subject.
	Authenticated(Subject),
}
impl Identity {
	/// Returns `true` for the anonymous identity.
	pub fn is_anonymous(&self) -> bool {
		matches!(self, Identity::Anonymous)
	}

	/// Returns the resolved subject, if any.
	pub fn subject(&self) -> Option<&Subject> {
		match self {
			Identity::Anonymous => None,
			Identity::Authenticated(subject) => Some(subject),
		}
	}
}
impl From<Subject> for Identity {
	fn from(subject: Subject) -> Self {
		Identity::Authenticated(subject)
	}
}
