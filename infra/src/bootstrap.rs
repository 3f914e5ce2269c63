//! Application-wide database manager
//!
//! One [`AsyncDatabaseManager`] is built at startup, shared with request
//! handlers and closed exactly once when the server stops.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info};

use wu_core::{AsyncDatabaseManager, AsyncSessionManager};
use wu_shared::config::ConnectionParameters;

use crate::database::{PoolSettings, SqlxDriver};
use crate::InfrastructureError;

/// Manager type shared by the HTTP layer
pub type AppDatabase = AsyncDatabaseManager<SqlxDriver>;

pub struct DatabaseBootstrap {
    manager: Arc<AppDatabase>,
    closed: AtomicBool,
}

impl DatabaseBootstrap {
    /// Build the manager from `.database.env` and the process environment
    ///
    /// Must run inside a Tokio runtime. No connection is opened here.
    ///
    /// # Returns
    /// * `Err(InfrastructureError::Config)` when a connection parameter is
    ///   missing or malformed
    pub fn init() -> Result<Self, InfrastructureError> {
        let parameters = ConnectionParameters::from_env()?;
        Ok(Self::with_parameters(parameters, PoolSettings::default()))
    }

    /// Build the manager from explicit parameters
    pub fn with_parameters(parameters: ConnectionParameters, settings: PoolSettings) -> Self {
        let manager = AsyncDatabaseManager::new(parameters, &SqlxDriver::new(settings));
        match manager.engine() {
            Some(engine) => info!(engine = %engine, "Database manager ready"),
            None => error!("Database manager started without an engine"),
        }

        Self {
            manager: Arc::new(manager),
            closed: AtomicBool::new(false),
        }
    }

    /// Shared handle for request handlers
    pub fn manager(&self) -> Arc<AppDatabase> {
        Arc::clone(&self.manager)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Close the manager; later calls do nothing
    pub async fn shutdown(&self) -> Result<(), InfrastructureError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        match self.manager.close().await {
            Ok(()) => {
                info!("Database manager closed");
                Ok(())
            }
            Err(err) => {
                error!(error = %err, "Database manager did not close cleanly");
                Err(err.into())
            }
        }
    }
}
