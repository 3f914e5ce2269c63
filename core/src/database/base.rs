//! Capability traits shared by the sync and async managers

use async_trait::async_trait;

use wu_shared::config::{ConnectionParameters, DatabaseUrl};

use super::{DriverError, ScopeFuture};
use crate::errors::ServiceResult;

/// Holds connection parameters and derives the connection URL
pub trait BaseSessionManager {
    fn connection_parameters(&self) -> &ConnectionParameters;

    /// Derive the URL from the stored parameters.
    ///
    /// Pure: repeated calls return equal URLs.
    fn create_url(&self) -> DatabaseUrl {
        self.connection_parameters().create_url()
    }
}

/// Scoped database access for blocking callers
pub trait SessionManager: BaseSessionManager {
    type Connection;
    type Session;

    /// Dispose the engine and drop both handles
    ///
    /// # Errors
    /// `engine is not initialized` if already closed, `failed to close
    /// database engine` if the engine failed to dispose (the manager is
    /// closed regardless).
    fn close(&self) -> ServiceResult<()>;

    /// Run `block` inside a transaction: commit on success, roll back once
    /// on failure
    fn connect<T, F>(&self, block: F) -> ServiceResult<T>
    where
        F: FnOnce(&mut Self::Connection) -> Result<T, DriverError>;

    /// Run `block` with a fresh session, closed on every exit path
    ///
    /// The session is never committed implicitly.
    fn session<T, F>(&self, block: F) -> ServiceResult<T>
    where
        F: FnOnce(&mut Self::Session) -> Result<T, DriverError>;
}

/// Scoped database access for async callers
///
/// Blocks borrow the connection or session for the lifetime of the future
/// they return, the same shape `sqlx` uses for transaction closures:
///
/// ```ignore
/// manager
///     .connect(|conn| Box::pin(async move { conn.execute("SELECT 1").await }))
///     .await?;
/// ```
#[async_trait]
pub trait AsyncSessionManager: BaseSessionManager {
    type Connection: Send;
    type Session: Send;

    async fn close(&self) -> ServiceResult<()>;

    async fn connect<T, F>(&self, block: F) -> ServiceResult<T>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut Self::Connection) -> ScopeFuture<'c, T> + Send;

    async fn session<T, F>(&self, block: F) -> ServiceResult<T>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut Self::Session) -> ScopeFuture<'c, T> + Send;
}
