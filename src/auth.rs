//! Auth-domain identifiers, token scopes, subjects, and token models.

pub mod id;
pub mod scope;
pub mod subject;
pub mod token;

pub use id::*;
pub use scope::*;
pub use subject::*;
pub use token::{
	codec::{self, *},
	record::*,
	secret::*,
};
