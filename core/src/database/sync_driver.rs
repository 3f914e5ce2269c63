//! Contracts a blocking database driver implements

use std::fmt;

use wu_shared::config::DatabaseUrl;

use super::DriverError;

/// Builds the engine and session factory for a [`SyncDatabaseManager`]
///
/// [`SyncDatabaseManager`]: super::SyncDatabaseManager
pub trait Driver {
    type Engine: Engine;
    type SessionFactory: SessionFactory;

    /// Prepare an engine for `url`. Must not require a reachable database.
    fn create_engine(&self, url: &DatabaseUrl) -> Result<Self::Engine, DriverError>;

    /// Build a session factory bound to `engine`
    fn create_sessionmaker(&self, engine: &Self::Engine)
        -> Result<Self::SessionFactory, DriverError>;
}

/// A configured connection pool for one database endpoint
///
/// Clones share the same pool. `Display` must not reveal credentials; it is
/// logged to correlate failures with the engine.
pub trait Engine: Clone + fmt::Display + Send + Sync + 'static {
    type Connection: Connection;

    /// Acquire a connection with a transaction already begun
    fn begin(&self) -> Result<Self::Connection, DriverError>;

    /// Release every pooled connection
    fn dispose(&self) -> Result<(), DriverError>;
}

/// A connection inside an explicit transaction
///
/// Implementations roll back an unfinished transaction when dropped.
pub trait Connection {
    fn commit(&mut self) -> Result<(), DriverError>;

    fn rollback(&mut self) -> Result<(), DriverError>;
}

/// Produces one new [`Session`] per call
pub trait SessionFactory: Clone + Send + Sync + 'static {
    type Session: Session;

    /// Create a session. No I/O happens until the session is used.
    fn create(&self) -> Self::Session;
}

/// A unit of work with its own transaction, committed only on request
///
/// Implementations release their connection when dropped.
pub trait Session {
    fn rollback(&mut self) -> Result<(), DriverError>;

    /// Discard uncommitted work and return the connection to the pool
    fn close(&mut self) -> Result<(), DriverError>;
}
