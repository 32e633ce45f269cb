//! Bearer token codec, redacted secrets, and persisted token records.

pub mod codec;
pub mod record;
pub mod secret;
