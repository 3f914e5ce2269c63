//! # Infrastructure Layer
//!
//! Concrete implementations behind the contracts defined in `wu_core`:
//! - **Database**: an async driver over `sqlx`'s `AnyPool` and a blocking
//!   driver over `postgres` pooled with `r2d2`
//! - **Cache**: Redis client implementing the hash cache capability
//! - **Logging**: the two logging facades (`BuiltinLogging`, `SinkLogging`)
//! - **Bootstrap**: building and closing the application's database manager

pub mod bootstrap;
pub mod cache;
pub mod database;
pub mod logging;

pub use bootstrap::DatabaseBootstrap;

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Database driver error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Redis cache error
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Logging setup error
    #[error("Logging error: {0}")]
    Logging(#[from] logging::LoggingError),

    /// Database lifecycle error surfaced by a manager
    #[error(transparent)]
    Service(#[from] wu_core::ServiceError),
}

impl From<wu_shared::ConfigError> for InfrastructureError {
    fn from(err: wu_shared::ConfigError) -> Self {
        InfrastructureError::Config(err.to_string())
    }
}
