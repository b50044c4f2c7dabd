//! Credential primitives
//!
//! - [`secret`]: deterministic SHA-256 digest of the login secret

pub mod secret;
