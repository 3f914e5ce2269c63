//! Database drivers for the session managers
//!
//! - [`SqlxDriver`]: async, `sqlx` `AnyPool` for PostgreSQL and MySQL
//! - [`PostgresDriver`]: blocking, `postgres` client pooled with `r2d2`
//!
//! Both prepare their pool without connecting, so a manager can be built
//! before the database is reachable.

pub mod postgres_sync;
pub mod sqlx_async;
pub mod statistics;


use std::time::Duration;

pub use postgres_sync::{PostgresConnection, PostgresDriver, PostgresEngine, PostgresSession};
pub use sqlx_async::{SqlxConnection, SqlxDriver, SqlxEngine, SqlxSession};
pub use statistics::PoolStatistics;

/// Pool sizing shared by both drivers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    /// Upper bound on open connections
    pub max_connections: u32,
    /// How long to wait for a free connection
    pub acquire_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            acquire_timeout: Duration::from_secs(30),
        }
    }
}

impl PoolSettings {
    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections.max(1);
        self
    }

    pub fn with_acquire_timeout(mut self, acquire_timeout: Duration) -> Self {
        self.acquire_timeout = acquire_timeout;
        self
    }
}
