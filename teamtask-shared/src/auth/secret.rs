//! Login secret digest
//!
//! The remote store holds an opaque credential secret per user, and login
//! is an exact-match lookup of email plus secret against the fetched
//! collection. That lookup requires a deterministic digest, so the secret
//! is hashed with unsalted SHA-256: same input, same digest, on any
//! device. This is not a substitute for a real password-hashing scheme;
//! it keeps the plaintext out of the store for a small-team tool whose
//! backing spreadsheet is readable by the team anyway.

use sha2::{Digest, Sha256};

/// Hashes a login secret into its stored form
///
/// # Returns
///
/// Hex-encoded SHA-256 digest (64 characters)
///
/// # Example
///
/// ```
/// use teamtask_shared::auth::secret::hash_secret;
///
/// let digest = hash_secret("super_secret_123");
/// assert_eq!(digest.len(), 64);
///
/// // Same input = same digest (deterministic)
/// assert_eq!(digest, hash_secret("super_secret_123"));
/// ```
pub fn hash_secret(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Checks a submitted secret against a stored digest
pub fn verify_secret(secret: &str, stored_digest: &str) -> bool {
    hash_secret(secret) == stored_digest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_is_deterministic() {
        assert_eq!(hash_secret("abc"), hash_secret("abc"));
        assert_ne!(hash_secret("abc"), hash_secret("abd"));
    }

    #[test]
    fn test_digest_is_hex_sha256() {
        let digest = hash_secret("abc");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
        // Known vector for "abc".
        assert_eq!(
            digest,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_verify_secret() {
        let digest = hash_secret("correct horse");
        assert!(verify_secret("correct horse", &digest));
        assert!(!verify_secret("wrong horse", &digest));
    }
}
