//! # Password Hashing
//!
//! Salted Argon2id hashes for `mrbs_users.password`.
//!
//! ## Legacy Hashes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Stored value                          verify() result                  │
//! │  ────────────────────────────────────  ───────────────────────────────  │
//! │  $argon2id$v=19$m=19456,t=2,p=1$...    Valid / Invalid                  │
//! │  5f4dcc3b5aa765d61d8327deb882cf99      ValidLegacy / Invalid            │
//! │  (32 hex chars = unsalted MD5)         └─► caller rewrites the hash     │
//! │  anything else                         Invalid                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! New hashes are never written in the MD5 format.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

use crate::error::{CoreError, CoreResult};

/// Outcome of checking a password against a stored hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// Password matches an Argon2 hash.
    Valid,
    /// Password matches a legacy MD5 digest; the hash should be upgraded.
    ValidLegacy,
    /// Password does not match, or the stored hash is unreadable.
    Invalid,
}

/// Hashes a password with Argon2id and a random salt.
///
/// ## Example
/// ```rust
/// use resa_core::password::{hash_password, verify_password, Verification};
///
/// let hash = hash_password("s3cret").unwrap();
/// assert!(hash.starts_with("$argon2id$"));
/// assert_eq!(verify_password("s3cret", &hash), Verification::Valid);
/// ```
pub fn hash_password(password: &str) -> CoreResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| CoreError::PasswordHash(e.to_string()))?;

    Ok(hash.to_string())
}

/// Checks `password` against a stored hash.
pub fn verify_password(password: &str, stored: &str) -> Verification {
    if is_legacy_md5(stored) {
        let digest = format!("{:x}", md5::compute(password.as_bytes()));
        return if digest.eq_ignore_ascii_case(stored) {
            Verification::ValidLegacy
        } else {
            Verification::Invalid
        };
    }

    let parsed = match PasswordHash::new(stored) {
        Ok(h) => h,
        Err(_) => return Verification::Invalid,
    };

    // Parameters come from the hash itself
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Verification::Valid,
        Err(_) => Verification::Invalid,
    }
}

/// Whether a stored hash is an unsalted MD5 hex digest.
pub fn is_legacy_md5(stored: &str) -> bool {
    stored.len() == 32 && stored.bytes().all(|b| b.is_ascii_hexdigit())
}

// =============================================================================
// Unit Tests
// =============================================================================
