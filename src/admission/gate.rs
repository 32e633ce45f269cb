//! Per-endpoint authorization gates.

// self
use crate::{
	admission::Rejection,
	auth::{Identity, Subject},
	obs::{self, Outcome, Stage},
};

/// Requirement an endpoint places on the request identity.
///
/// [`Gate::Activated`] implies [`Gate::Authenticated`]: an anonymous request fails it with
/// [`Rejection::AuthenticationRequired`], never [`Rejection::AccountInactive`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Gate {
	/// Any authenticated subject.
	Authenticated,
	/// An authenticated subject whose account is activated.
	Activated,
}
impl Gate {
	/// Checks `identity` against the gate and returns the admitted subject.
	pub fn check(self, identity: &Identity) -> Result<&Subject, Rejection> {
		let result = match (self, identity) {
			(_, Identity::Anonymous) => Err(Rejection::AuthenticationRequired),
			(Gate::Activated, Identity::Authenticated(subject)) if !subject.activated =>
				Err(Rejection::AccountInactive),
			(_, Identity::Authenticated(subject)) => Ok(subject),
		};

		match &result {
			Ok(_) => obs::record_outcome(Stage::Authorization, Outcome::Allowed),
			Err(rejection) => {
				obs::report_rejection(Stage::Authorization, rejection.as_str());
				obs::record_outcome(Stage::Authorization, Outcome::Rejected);
			},
		}

		result
	}
}

/// Rejects anonymous identities.
pub fn require_authenticated(identity: &Identity) -> Result<&Subject, Rejection> {
	Gate::Authenticated.check(identity)
}

/// Rejects anonymous identities and subjects whose account is not activated.
pub fn require_activated(identity: &Identity) -> Result<&Subject, Rejection> {
	Gate::Activated.check(identity)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::auth::SubjectId;

	fn subject(activated: bool) -> Identity {
		let id = SubjectId::new("reader-7").expect("Subject fixture should be valid.");

		Identity::Authenticated(Subject::new(id, activated))
	}

	#[test]
	fn anonymous_fails_both_gates_as_unauthenticated() {
		assert_eq!(
			require_authenticated(&Identity::Anonymous),
			Err(Rejection::AuthenticationRequired)
		);
		assert_eq!(require_activated(&Identity::Anonymous), Err(Rejection::AuthenticationRequired));
	}

	#[test]
	fn inactive_subject_passes_only_the_authenticated_gate() {
		let identity = subject(false);

		assert!(require_authenticated(&identity).is_ok());
		assert_eq!(require_activated(&identity), Err(Rejection::AccountInactive));
	}

	#[test]
	fn activated_subject_passes_both_gates() {
		let identity = subject(true);

		assert_eq!(
			require_activated(&identity).map(|s| &*s.id),
			Ok("reader-7"),
			"Activated gate should hand back the subject."
		);
		assert!(require_authenticated(&identity).is_ok());
	}
}
