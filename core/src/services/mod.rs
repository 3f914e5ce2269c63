//! Services built on the database layer and the auth configuration.

pub mod auth;
pub mod cache;

pub use auth::{check_password, hash_password, AccessTokenService, CookieIdentity};
pub use cache::{Answer, AnswerCache, HashCache};
