//! The single error kind callers see for any database-layer failure

use std::borrow::Cow;
use thiserror::Error;

/// Boxed error preserved as the cause of a [`ServiceError`]
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Canonical messages, one per failing operation
pub mod messages {
    pub const SERVICE_UNAVAILABLE: &str = "service is unavailable";
    pub const ENGINE_NOT_INITIALIZED: &str = "engine is not initialized";
    pub const CLOSE_FAILED: &str = "failed to close database engine";
    pub const CONNECTION_FAILED: &str = "database connection failed";
    pub const SESSION_FAILED: &str = "database session failed";
    pub const SESSIONMAKER_NOT_INITIALIZED: &str = "sessionmaker is not initialized";
}

/// Uniform representation of any underlying database failure or lifecycle
/// misuse.
///
/// Callers can read the message and walk the `source()` chain for
/// diagnostics, but cannot branch on the driver's error type.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct ServiceError {
    message: Cow<'static, str>,
    #[source]
    source: Option<BoxError>,
}

impl ServiceError {
    /// Create an error with a custom message and no cause
    pub fn new(message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Attach the underlying failure as the cause
    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Operation attempted before construction succeeded or after close
    pub fn engine_not_initialized() -> Self {
        Self::new(messages::ENGINE_NOT_INITIALIZED)
    }

    /// Session requested while no session factory is available
    pub fn sessionmaker_not_initialized() -> Self {
        Self::new(messages::SESSIONMAKER_NOT_INITIALIZED)
    }

    /// Engine disposal failed
    pub fn close_failed(source: impl Into<BoxError>) -> Self {
        Self::new(messages::CLOSE_FAILED).with_source(source)
    }

    /// Failure inside a connection scope
    pub fn connection_failed(source: impl Into<BoxError>) -> Self {
        Self::new(messages::CONNECTION_FAILED).with_source(source)
    }

    /// Failure inside a session scope
    pub fn session_failed(source: impl Into<BoxError>) -> Self {
        Self::new(messages::SESSION_FAILED).with_source(source)
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether this error reports misuse of the manager lifecycle rather
    /// than a runtime failure
    pub fn is_lifecycle(&self) -> bool {
        matches!(
            self.message.as_ref(),
            messages::ENGINE_NOT_INITIALIZED | messages::SESSIONMAKER_NOT_INITIALIZED
        )
    }
}

impl Default for ServiceError {
    fn default() -> Self {
        Self::new(messages::SERVICE_UNAVAILABLE)
    }
}
