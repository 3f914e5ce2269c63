//! Configuration module with business-specific sub-modules
//!
//! This module organizes configuration into logical areas:
//! - `auth` - JWT settings and the signing secret
//! - `cache` - Redis configuration
//! - `database` - Connection parameters and URL derivation
//! - `environment` - Environment detection and logging configuration
//! - `server` - HTTP server and middleware configuration

pub mod auth;
pub mod cache;
pub mod database;
pub mod environment;
pub mod server;
mod source;

use serde::{Deserialize, Serialize};

// Re-export commonly used types
pub use auth::{JwtConfig, SecretKey};
pub use cache::CacheConfig;
pub use database::{ConnectionParameters, DatabaseUrl};
pub use environment::{Environment, LogFormat, LoggingConfig};
pub use server::{MiddlewareConfig, ServerConfig};
pub use source::ConfigError;

/// Application configuration that does not carry secrets
///
/// Database parameters and the JWT secret are loaded separately because
/// they are required values and fail loudly when missing.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Environment configuration
    pub environment: Environment,

    /// Server configuration
    pub server: ServerConfig,

    /// Cache configuration
    pub cache: CacheConfig,

    /// JWT configuration
    #[serde(default)]
    pub jwt: JwtConfig,

    /// Request logging and metrics middleware configuration
    #[serde(default)]
    pub middleware: MiddlewareConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        let env = Environment::default();
        Self {
            environment: env,
            server: ServerConfig::default(),
            cache: CacheConfig::default(),
            jwt: JwtConfig::default(),
            middleware: MiddlewareConfig::default(),
            logging: LoggingConfig::for_environment(env),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment
    pub fn from_env() -> Self {
        let environment = Environment::from_env();
        Self {
            environment,
            server: ServerConfig::from_env(),
            cache: CacheConfig::from_env(),
            jwt: JwtConfig::from_env(),
            middleware: MiddlewareConfig::default(),
            logging: LoggingConfig::for_environment(environment),
        }
    }
}
