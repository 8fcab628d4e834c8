//! Password sealing for student credentials.
//!
//! Plaintext passwords never reach a store: they are replaced by a salted
//! Argon2id hash in PHC string format before any adapter writes them.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{ARGON2ID_IDENT, Argon2};
use zeroize::Zeroizing;

/// Errors raised while sealing a password.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PasswordError {
    /// The hashing primitive rejected the input or its parameters.
    #[error("failed to hash password: {message}")]
    Hashing { message: String },
}

/// Hash a plaintext password with a freshly generated salt.
///
/// # Examples
/// ```
/// use students::domain::password::{is_sealed, seal};
///
/// let sealed = seal("hunter2").expect("hash password");
/// assert!(is_sealed(&sealed));
/// assert_ne!(sealed, "hunter2");
/// ```
pub fn seal(plaintext: &str) -> Result<String, PasswordError> {
    let plaintext = Zeroizing::new(plaintext.as_bytes().to_vec());
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(&plaintext, &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| PasswordError::Hashing {
            message: err.to_string(),
        })
}

/// Return `true` when `candidate` is an Argon2id PHC hash with a salt and
/// an output.
///
/// Any other `$`-prefixed string is treated as plaintext.
pub fn is_sealed(candidate: &str) -> bool {
    PasswordHash::new(candidate).is_ok_and(|hash| {
        hash.algorithm == ARGON2ID_IDENT && hash.salt.is_some() && hash.hash.is_some()
    })
}

/// Check a plaintext password against a sealed hash.
///
/// Returns `false` for malformed hashes rather than failing.
pub fn verify(plaintext: &str, sealed: &str) -> bool {
    PasswordHash::new(sealed)
        .map(|hash| {
            Argon2::default()
                .verify_password(plaintext.as_bytes(), &hash)
                .is_ok()
        })
        .unwrap_or(false)
}

/// Resolve the password value an update should persist.
///
/// An empty payload keeps the stored hash (`None`). A complete Argon2id hash
/// passes through untouched so re-submitting a fetched record is a no-op;
/// anything else is hashed.
pub fn seal_for_update(candidate: &str) -> Result<Option<String>, PasswordError> {
    if candidate.is_empty() {
        return Ok(None);
    }
    if is_sealed(candidate) {
        return Ok(Some(candidate.to_owned()));
    }
    seal(candidate).map(Some)
}
