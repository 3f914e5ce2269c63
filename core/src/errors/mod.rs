//! Error types shared by the lifecycle managers and the auth helpers.

mod service_error;
mod types;


pub use service_error::{messages, BoxError, ServiceError};
pub use types::AuthError;

/// Result alias for operations surfaced to callers outside the database layer
pub type ServiceResult<T> = Result<T, ServiceError>;
