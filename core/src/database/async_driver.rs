//! Contracts a database driver running on the async runtime implements

use async_trait::async_trait;
use std::fmt;

use wu_shared::config::DatabaseUrl;

use super::DriverError;

/// Builds the engine and session factory for an [`AsyncDatabaseManager`]
///
/// Engine creation is synchronous: it prepares the pool without
/// connecting.
///
/// [`AsyncDatabaseManager`]: super::AsyncDatabaseManager
pub trait AsyncDriver {
    type Engine: AsyncEngine;
    type SessionFactory: AsyncSessionFactory;

    fn create_engine(&self, url: &DatabaseUrl) -> Result<Self::Engine, DriverError>;

    fn create_sessionmaker(&self, engine: &Self::Engine)
        -> Result<Self::SessionFactory, DriverError>;
}

/// Async counterpart of [`Engine`](super::Engine)
#[async_trait]
pub trait AsyncEngine: Clone + fmt::Display + Send + Sync + 'static {
    type Connection: AsyncConnection;

    async fn begin(&self) -> Result<Self::Connection, DriverError>;

    async fn dispose(&self) -> Result<(), DriverError>;
}

/// Async counterpart of [`Connection`](super::Connection)
///
/// Dropping an unfinished connection (for example when the owning task is
/// cancelled) must still roll back and return it to the pool.
#[async_trait]
pub trait AsyncConnection: Send {
    async fn commit(&mut self) -> Result<(), DriverError>;

    async fn rollback(&mut self) -> Result<(), DriverError>;
}

/// Async counterpart of [`SessionFactory`](super::SessionFactory)
pub trait AsyncSessionFactory: Clone + Send + Sync + 'static {
    type Session: AsyncSession;

    fn create(&self) -> Self::Session;
}

/// Async counterpart of [`Session`](super::Session)
///
/// Dropping an unclosed session must release its connection.
#[async_trait]
pub trait AsyncSession: Send {
    async fn rollback(&mut self) -> Result<(), DriverError>;

    async fn close(&mut self) -> Result<(), DriverError>;
}
