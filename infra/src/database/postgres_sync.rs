//! Blocking driver over the `postgres` client pooled with `r2d2`
//!
//! The pool is built unchecked with no minimum idle connections, so
//! creating an engine never connects. Transactions are driven with plain
//! `BEGIN`/`COMMIT`/`ROLLBACK` statements on the pooled client.
//!
//! The `postgres` client runs its own runtime; do not call into this driver
//! from inside an async task.

use anyhow::{anyhow, ensure, Context};
use postgres::types::ToSql;
use postgres::{Client, NoTls, Row};
use r2d2::{Pool, PooledConnection};
use r2d2_postgres::PostgresConnectionManager;
use std::fmt;
use tracing::{info, warn};

use wu_core::database::{Connection, Driver, DriverError, Engine, Session, SessionFactory};
use wu_shared::config::DatabaseUrl;

use super::{PoolSettings, PoolStatistics};

type Manager = PostgresConnectionManager<NoTls>;

const SUPPORTED_BACKENDS: &[&str] = &["postgresql", "postgres"];

/// Builds [`PostgresEngine`]s for PostgreSQL URLs
#[derive(Debug, Clone, Default)]
pub struct PostgresDriver {
    settings: PoolSettings,
}

impl PostgresDriver {
    pub fn new(settings: PoolSettings) -> Self {
        Self { settings }
    }
}

impl Driver for PostgresDriver {
    type Engine = PostgresEngine;
    type SessionFactory = PostgresSessionFactory;

    fn create_engine(&self, url: &DatabaseUrl) -> Result<PostgresEngine, DriverError> {
        ensure!(
            SUPPORTED_BACKENDS.contains(&url.backend_name()),
            "unsupported database backend `{}`",
            url.backend_name()
        );

        let config: postgres::Config = url
            .render_for_backend()
            .parse()
            .with_context(|| format!("invalid database url {}", url))?;

        let pool = Pool::builder()
            .max_size(self.settings.max_connections)
            .min_idle(Some(0))
            .connection_timeout(self.settings.acquire_timeout)
            .build_unchecked(PostgresConnectionManager::new(config, NoTls));

        Ok(PostgresEngine {
            pool,
            label: url.to_string(),
        })
    }

    fn create_sessionmaker(
        &self,
        engine: &PostgresEngine,
    ) -> Result<PostgresSessionFactory, DriverError> {
        Ok(PostgresSessionFactory {
            pool: engine.pool.clone(),
        })
    }
}

/// `r2d2` pool of `postgres` clients; clones share it
#[derive(Clone, Debug)]
pub struct PostgresEngine {
    pool: Pool<Manager>,
    label: String,
}

impl PostgresEngine {
    /// Get connection pool statistics
    pub fn statistics(&self) -> PoolStatistics {
        let state = self.pool.state();
        PoolStatistics {
            connections: state.connections,
            idle_connections: state.idle_connections as usize,
            max_connections: self.pool.max_size(),
        }
    }
}

impl fmt::Display for PostgresEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Engine({})", self.label)
    }
}

impl Engine for PostgresEngine {
    type Connection = PostgresConnection;

    fn begin(&self) -> Result<PostgresConnection, DriverError> {
        let mut client = self.pool.get()?;
        client.batch_execute("BEGIN")?;
        Ok(PostgresConnection { client, open: true })
    }

    /// `r2d2` has no explicit shutdown: idle connections close once the
    /// manager drops its last handle to the pool.
    fn dispose(&self) -> Result<(), DriverError> {
        info!(stats = %self.statistics(), "Closing database connection pool");
        Ok(())
    }
}

/// Pooled client inside a transaction
///
/// Dropping it before commit rolls the transaction back.
pub struct PostgresConnection {
    client: PooledConnection<Manager>,
    open: bool,
}

impl PostgresConnection {
    pub fn client(&mut self) -> &mut Client {
        &mut self.client
    }

    /// Run a statement and return the number of affected rows
    pub fn execute(&mut self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> Result<u64, DriverError> {
        Ok(self.client.execute(sql, params)?)
    }

    pub fn query(&mut self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> Result<Vec<Row>, DriverError> {
        Ok(self.client.query(sql, params)?)
    }

    fn finish(&mut self, statement: &str) -> Result<(), DriverError> {
        if self.open {
            self.open = false;
            self.client.batch_execute(statement)?;
        }
        Ok(())
    }
}

impl Connection for PostgresConnection {
    fn commit(&mut self) -> Result<(), DriverError> {
        self.finish("COMMIT")
    }

    fn rollback(&mut self) -> Result<(), DriverError> {
        self.finish("ROLLBACK")
    }
}

impl Drop for PostgresConnection {
    fn drop(&mut self) {
        if let Err(err) = self.finish("ROLLBACK") {
            warn!(error = %err, "Rollback of abandoned transaction failed");
        }
    }
}

/// Creates [`PostgresSession`]s on the engine's pool
#[derive(Clone)]
pub struct PostgresSessionFactory {
    pool: Pool<Manager>,
}

impl SessionFactory for PostgresSessionFactory {
    type Session = PostgresSession;

    fn create(&self) -> PostgresSession {
        PostgresSession {
            pool: self.pool.clone(),
            client: None,
            in_transaction: false,
        }
    }
}

/// Unit of work that checks out a client and begins a transaction on first
/// use
///
/// Nothing is committed unless [`PostgresSession::commit`] is called.
pub struct PostgresSession {
    pool: Pool<Manager>,
    client: Option<PooledConnection<Manager>>,
    in_transaction: bool,
}

impl PostgresSession {
    /// Client for the session's transaction, beginning it if needed
    pub fn client(&mut self) -> Result<&mut Client, DriverError> {
        if self.client.is_none() {
            self.client = Some(self.pool.get()?);
        }
        let client = self
            .client
            .as_deref_mut()
            .ok_or_else(|| anyhow!("session client unavailable"))?;
        if !self.in_transaction {
            client.batch_execute("BEGIN")?;
            self.in_transaction = true;
        }
        Ok(client)
    }

    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    /// Run a statement and return the number of affected rows
    pub fn execute(&mut self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> Result<u64, DriverError> {
        Ok(self.client()?.execute(sql, params)?)
    }

    pub fn query(&mut self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> Result<Vec<Row>, DriverError> {
        Ok(self.client()?.query(sql, params)?)
    }

    /// Commit the work done so far; the next use begins a new transaction
    pub fn commit(&mut self) -> Result<(), DriverError> {
        self.finish("COMMIT")
    }

    fn finish(&mut self, statement: &str) -> Result<(), DriverError> {
        if !self.in_transaction {
            return Ok(());
        }
        self.in_transaction = false;
        match self.client.as_deref_mut() {
            Some(client) => Ok(client.batch_execute(statement)?),
            None => Ok(()),
        }
    }
}

impl Session for PostgresSession {
    fn rollback(&mut self) -> Result<(), DriverError> {
        self.finish("ROLLBACK")
    }

    fn close(&mut self) -> Result<(), DriverError> {
        let result = self.finish("ROLLBACK");
        self.client = None;
        result
    }
}

impl Drop for PostgresSession {
    fn drop(&mut self) {
        if let Err(err) = self.finish("ROLLBACK") {
            warn!(error = %err, "Rollback of abandoned session failed");
        }
    }
}
