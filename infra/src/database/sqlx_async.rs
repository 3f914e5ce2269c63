//! Async driver over `sqlx`'s `AnyPool`
//!
//! The pool is created with `connect_lazy`, so building an engine performs
//! no network I/O. It must still be built inside a Tokio runtime because the
//! pool spawns its maintenance task.

use anyhow::{anyhow, ensure, Context};
use async_trait::async_trait;
use sqlx::any::{install_default_drivers, AnyPoolOptions};
use sqlx::{Any, AnyConnection, AnyPool, Transaction};
use std::fmt;
use tracing::info;

use wu_core::database::{
    AsyncConnection, AsyncDriver, AsyncEngine, AsyncSession, AsyncSessionFactory, DriverError,
};
use wu_shared::config::DatabaseUrl;

use super::{PoolSettings, PoolStatistics};

const SUPPORTED_BACKENDS: &[&str] = &["postgresql", "postgres", "mysql", "mariadb"];

/// Builds [`SqlxEngine`]s for PostgreSQL and MySQL URLs
#[derive(Debug, Clone, Default)]
pub struct SqlxDriver {
    settings: PoolSettings,
}

impl SqlxDriver {
    pub fn new(settings: PoolSettings) -> Self {
        Self { settings }
    }
}

impl AsyncDriver for SqlxDriver {
    type Engine = SqlxEngine;
    type SessionFactory = SqlxSessionFactory;

    fn create_engine(&self, url: &DatabaseUrl) -> Result<SqlxEngine, DriverError> {
        ensure!(
            SUPPORTED_BACKENDS.contains(&url.backend_name()),
            "unsupported database backend `{}`",
            url.backend_name()
        );
        install_default_drivers();

        let pool = AnyPoolOptions::new()
            .max_connections(self.settings.max_connections)
            .acquire_timeout(self.settings.acquire_timeout)
            .connect_lazy(&url.render_for_backend())
            .with_context(|| format!("invalid database url {}", url))?;

        Ok(SqlxEngine {
            pool,
            label: url.to_string(),
        })
    }

    fn create_sessionmaker(&self, engine: &SqlxEngine) -> Result<SqlxSessionFactory, DriverError> {
        Ok(SqlxSessionFactory {
            pool: engine.pool.clone(),
        })
    }
}

/// Lazily connected pool; clones share it
#[derive(Clone, Debug)]
pub struct SqlxEngine {
    pool: AnyPool,
    label: String,
}

impl SqlxEngine {
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Get connection pool statistics
    pub fn statistics(&self) -> PoolStatistics {
        PoolStatistics {
            connections: self.pool.size(),
            idle_connections: self.pool.num_idle(),
            max_connections: self.pool.options().get_max_connections(),
        }
    }
}

impl fmt::Display for SqlxEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Engine({})", self.label)
    }
}

#[async_trait]
impl AsyncEngine for SqlxEngine {
    type Connection = SqlxConnection;

    async fn begin(&self) -> Result<SqlxConnection, DriverError> {
        let tx = self.pool.begin().await?;
        Ok(SqlxConnection { tx: Some(tx) })
    }

    async fn dispose(&self) -> Result<(), DriverError> {
        info!(stats = %self.statistics(), "Closing database connection pool");
        self.pool.close().await;
        Ok(())
    }
}

/// Pooled connection inside a transaction
///
/// Dropping it before commit rolls the transaction back.
pub struct SqlxConnection {
    tx: Option<Transaction<'static, Any>>,
}

impl SqlxConnection {
    /// Executor for `sqlx` queries inside the transaction
    pub fn executor(&mut self) -> Result<&mut AnyConnection, DriverError> {
        self.tx
            .as_deref_mut()
            .ok_or_else(|| anyhow!("transaction already finished"))
    }

    /// Run a statement and return the number of affected rows
    pub async fn execute(&mut self, sql: &str) -> Result<u64, DriverError> {
        let conn = self.executor()?;
        Ok(sqlx::query(sql).execute(conn).await?.rows_affected())
    }
}

#[async_trait]
impl AsyncConnection for SqlxConnection {
    async fn commit(&mut self) -> Result<(), DriverError> {
        if let Some(tx) = self.tx.take() {
            tx.commit().await?;
        }
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), DriverError> {
        if let Some(tx) = self.tx.take() {
            tx.rollback().await?;
        }
        Ok(())
    }
}

/// Creates [`SqlxSession`]s on the engine's pool
#[derive(Clone)]
pub struct SqlxSessionFactory {
    pool: AnyPool,
}

impl AsyncSessionFactory for SqlxSessionFactory {
    type Session = SqlxSession;

    fn create(&self) -> SqlxSession {
        SqlxSession {
            pool: self.pool.clone(),
            tx: None,
        }
    }
}

/// Unit of work that begins a transaction on first use
///
/// Nothing is committed unless [`SqlxSession::commit`] is called.
pub struct SqlxSession {
    pool: AnyPool,
    tx: Option<Transaction<'static, Any>>,
}

impl SqlxSession {
    /// Executor for the session's transaction, beginning it if needed
    pub async fn connection(&mut self) -> Result<&mut AnyConnection, DriverError> {
        if self.tx.is_none() {
            self.tx = Some(self.pool.begin().await?);
        }
        self.tx
            .as_deref_mut()
            .ok_or_else(|| anyhow!("session transaction unavailable"))
    }

    pub fn in_transaction(&self) -> bool {
        self.tx.is_some()
    }

    /// Run a statement and return the number of affected rows
    pub async fn execute(&mut self, sql: &str) -> Result<u64, DriverError> {
        let conn = self.connection().await?;
        Ok(sqlx::query(sql).execute(conn).await?.rows_affected())
    }

    /// Commit the work done so far; the next use begins a new transaction
    pub async fn commit(&mut self) -> Result<(), DriverError> {
        if let Some(tx) = self.tx.take() {
            tx.commit().await?;
        }
        Ok(())
    }
}

#[async_trait]
impl AsyncSession for SqlxSession {
    async fn rollback(&mut self) -> Result<(), DriverError> {
        if let Some(tx) = self.tx.take() {
            tx.rollback().await?;
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        AsyncSession::rollback(self).await
    }
}
