//! Shared configuration and common types for the web utilities workspace
//!
//! This crate provides functionality used across all server modules:
//! - Configuration types (database connection parameters, auth, cache,
//!   server, logging)
//! - Error response structures

pub mod config;
pub mod errors;

// Re-export commonly used items at crate root
pub use config::{
    AppConfig, CacheConfig, ConfigError, ConnectionParameters, DatabaseUrl, Environment,
    JwtConfig, LoggingConfig, MiddlewareConfig, SecretKey, ServerConfig,
};
pub use errors::{error_codes, ErrorResponse};
