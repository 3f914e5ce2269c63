//! Password hashing

use bcrypt::{hash, verify, DEFAULT_COST};

use crate::errors::AuthError;

/// Hash `password` with bcrypt at the default cost
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    Ok(hash(password, DEFAULT_COST)?)
}

/// Check `password` against a bcrypt hash
///
/// A malformed hash counts as a mismatch.
pub fn check_password(password: &str, hashed_password: &str) -> bool {
    verify(password, hashed_password).unwrap_or(false)
}
