//! Session manager for blocking drivers

use std::marker::PhantomData;

use tracing::{error, info, info_span, warn, Span};

use wu_shared::config::ConnectionParameters;

use super::base::{BaseSessionManager, SessionManager};
use super::handles::{HandleCell, Handles};
use super::sync_driver::{Connection, Driver, Engine, Session, SessionFactory};
use super::DriverError;
use crate::errors::{ServiceError, ServiceResult};

type ConnectionOf<D> = <<D as Driver>::Engine as Engine>::Connection;
type SessionOf<D> = <<D as Driver>::SessionFactory as SessionFactory>::Session;

/// Owns one engine and session factory for a blocking driver.
///
/// Setup failures never surface from [`SyncDatabaseManager::new`]; they are
/// logged and the missing handle makes later operations fail with a
/// [`ServiceError`].
///
/// # Example
/// ```ignore
/// let manager = SyncDatabaseManager::new(params, &PostgresDriver::default());
/// let count: i64 = manager.session(|session| session.query_one_i64("SELECT count(*) FROM users"))?;
/// manager.close()?;
/// ```
pub struct SyncDatabaseManager<D: Driver> {
    parameters: ConnectionParameters,
    handles: HandleCell<D::Engine, D::SessionFactory>,
    span: Span,
    _driver: PhantomData<fn() -> D>,
}

impl<D: Driver> SyncDatabaseManager<D> {
    /// Create the engine and session factory for `parameters`
    ///
    /// # Arguments
    /// * `parameters` - Where the database lives
    /// * `driver` - Builds the engine and factory
    ///
    /// # Returns
    /// An open manager, or one whose operations fail if setup failed
    pub fn new(parameters: ConnectionParameters, driver: &D) -> Self {
        let url = parameters.create_url();
        let span = info_span!("database", service = "database", url = %url);
        let handles = span.in_scope(|| {
            Handles::open(
                || driver.create_engine(&url),
                |engine| driver.create_sessionmaker(engine),
            )
        });

        Self {
            parameters,
            handles: HandleCell::new(handles),
            span,
            _driver: PhantomData,
        }
    }

    /// Logger handle carrying the `service=database` context
    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Current engine, `None` before successful setup or after close
    pub fn engine(&self) -> Option<D::Engine> {
        self.handles.engine()
    }

    /// Current session factory, `None` before successful setup or after close
    pub fn sessionmaker(&self) -> Option<D::SessionFactory> {
        self.handles.sessionmaker()
    }

    pub fn is_open(&self) -> bool {
        self.handles.read().engine.is_some()
    }
}

impl<D: Driver> BaseSessionManager for SyncDatabaseManager<D> {
    fn connection_parameters(&self) -> &ConnectionParameters {
        &self.parameters
    }
}

impl<D: Driver> SessionManager for SyncDatabaseManager<D> {
    type Connection = ConnectionOf<D>;
    type Session = SessionOf<D>;

    fn close(&self) -> ServiceResult<()> {
        let _entered = self.span.enter();

        let Some(engine) = self.handles.take_engine() else {
            error!("Attempted to close a non-existing engine");
            return Err(ServiceError::engine_not_initialized());
        };

        match engine.dispose() {
            Ok(()) => {
                info!("Database engine disposed");
                Ok(())
            }
            Err(err) => {
                error!(error = %format_args!("{:#}", err), "Error while disposing database engine");
                Err(ServiceError::close_failed(err))
            }
        }
    }

    fn connect<T, F>(&self, block: F) -> ServiceResult<T>
    where
        F: FnOnce(&mut Self::Connection) -> Result<T, DriverError>,
    {
        let _entered = self.span.enter();

        let Some(engine) = self.handles.engine() else {
            error!("Engine is not available for connection");
            return Err(ServiceError::engine_not_initialized());
        };

        let mut connection = engine
            .begin()
            .map_err(|err| connection_error(&engine, err))?;

        match block(&mut connection) {
            Ok(value) => {
                connection
                    .commit()
                    .map_err(|err| connection_error(&engine, err))?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = connection.rollback() {
                    warn!(error = %rollback_err, "Rollback after failed block also failed");
                }
                Err(connection_error(&engine, err))
            }
        }
    }

    fn session<T, F>(&self, block: F) -> ServiceResult<T>
    where
        F: FnOnce(&mut Self::Session) -> Result<T, DriverError>,
    {
        let _entered = self.span.enter();

        let Some(factory) = self.handles.sessionmaker() else {
            error!("Sessionmaker is not available");
            return Err(ServiceError::sessionmaker_not_initialized());
        };

        let mut session = factory.create();

        let outcome = match block(&mut session) {
            Ok(value) => Ok(value),
            Err(err) => {
                if let Err(rollback_err) = session.rollback() {
                    warn!(error = %rollback_err, "Session rollback failed");
                }
                Err(err)
            }
        };
        let closed = session.close();

        match (outcome, closed) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(close_err)) => Err(self.session_error(close_err)),
            (Err(err), closed) => {
                if let Err(close_err) = closed {
                    warn!(error = %close_err, "Session close failed");
                }
                Err(self.session_error(err))
            }
        }
    }
}

impl<D: Driver> SyncDatabaseManager<D> {
    fn session_error(&self, err: DriverError) -> ServiceError {
        error!(
            engine = %self.handles.engine_label(),
            error = %format_args!("{:#}", err),
            "Database error while using session"
        );
        ServiceError::session_failed(err)
    }
}

fn connection_error<E: Engine>(engine: &E, err: DriverError) -> ServiceError {
    error!(
        engine = %engine,
        error = %format_args!("{:#}", err),
        "Database error while using connection"
    );
    ServiceError::connection_failed(err)
}
