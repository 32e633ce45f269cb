//! Token scopes restricting a token to a single functional purpose.

// self
use crate::_prelude::*;

/// Errors emitted when parsing a scope label.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum TokenScopeError {
	/// The label does not name a known scope.
	#[error("Unknown token scope: {label}.")]
	Unknown {
		/// The offending label.
		label: String,
	},
}

/// Functional purpose a token was issued for.
///
/// A token only authenticates requests that check its exact scope; an activation token can
/// never be replayed as a bearer credential.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenScope {
	/// Bearer credential accepted by the admission pipeline.
	Authentication,
	/// One-shot token that activates a freshly created account.
	Activation,
	/// Short-lived token that authorizes a password change.
	PasswordReset,
}
impl TokenScope {
	/// All scopes, in declaration order.
	pub const ALL: [TokenScope; 3] =
		[TokenScope::Authentication, TokenScope::Activation, TokenScope::PasswordReset];

	/// Returns a stable label suitable for storage, span, or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			TokenScope::Authentication => "authentication",
			TokenScope::Activation => "activation",
			TokenScope::PasswordReset => "password-reset",
		}
	}
}
impl Display for TokenScope {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for TokenScope {
	type Err = TokenScopeError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|scope| scope.as_str() == s)
			.ok_or_else(|| TokenScopeError::Unknown { label: s.to_owned() })
	}
}
