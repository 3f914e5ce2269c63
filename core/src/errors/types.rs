//! Authentication errors

use thiserror::Error;

/// Failures of the JWT and password helpers
#[derive(Error, Debug)]
pub enum AuthError {
    /// Token missing, malformed, expired, badly signed, or missing the
    /// `sub`/`id` claims
    #[error("Could not validate user.")]
    CouldNotValidate,

    #[error("Token generation failed: {0}")]
    TokenGeneration(#[source] jsonwebtoken::errors::Error),

    #[error("Unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Password hashing failed: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),
}
