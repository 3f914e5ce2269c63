//! Authentication helpers
//!
//! - HS256 access tokens carrying `sub`, `id`, `role` and `exp`
//! - Decoding the current user from a bearer token or a cookie
//! - bcrypt password hashing

mod password;
mod token;

#[cfg(test)]
mod tests;

pub use password::{check_password, hash_password};
pub use token::{AccessClaims, AccessTokenService, CookieIdentity};
