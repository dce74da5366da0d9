//! # cb-auth-simple
//!
//! SHA-256 implementation of `IdentityProvider`.
//! Derives daily anonymous ids and compares delete passwords.

use cb_core::traits::IdentityProvider;
use sha2::{Digest, Sha256};

/// Number of hex characters kept from the digest.
pub const ANON_ID_LEN: usize = 8;

/// Daily pseudonym: the first [`ANON_ID_LEN`] hex chars of sha256(ip ‖ date).
/// Collisions between addresses are accepted; this is not an identity.
pub fn derive_anon_id(ip: &str, date: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(ip.as_bytes());
    hasher.update(date.as_bytes());
    let hash = hex::encode(hasher.finalize());
    hash[..ANON_ID_LEN].to_string()
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SimpleIdentityProvider;

impl SimpleIdentityProvider {
    pub fn new() -> Self {
        Self
    }
}

impl IdentityProvider for SimpleIdentityProvider {
    fn anon_id(&self, ip: &str, date: &str) -> String {
        derive_anon_id(ip, date)
    }

    /// Plaintext, case-sensitive equality. Stored passwords are not hashed,
    /// so switching schemes means migrating existing rows.
    fn verify_delete_password(&self, supplied: &str, stored: &str) -> bool {
        supplied == stored
    }
}
