//! Session manager for async drivers

use async_trait::async_trait;
use std::marker::PhantomData;
use tracing::{error, info, info_span, warn, Instrument, Span};

use wu_shared::config::ConnectionParameters;

use super::async_driver::{AsyncConnection, AsyncDriver, AsyncEngine, AsyncSession, AsyncSessionFactory};
use super::base::{AsyncSessionManager, BaseSessionManager};
use super::handles::{HandleCell, Handles};
use super::{DriverError, ScopeFuture};
use crate::errors::{ServiceError, ServiceResult};

type ConnectionOf<D> = <<D as AsyncDriver>::Engine as AsyncEngine>::Connection;
type SessionOf<D> = <<D as AsyncDriver>::SessionFactory as AsyncSessionFactory>::Session;

/// Owns one engine and session factory for an async driver.
///
/// Construction only prepares the pool, so it is safe to build the manager
/// before the database is reachable. Cancelling a scope drops the
/// connection or session, and the driver releases it.
pub struct AsyncDatabaseManager<D: AsyncDriver> {
    parameters: ConnectionParameters,
    handles: HandleCell<D::Engine, D::SessionFactory>,
    span: Span,
    _driver: PhantomData<fn() -> D>,
}

impl<D: AsyncDriver> AsyncDatabaseManager<D> {
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

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn engine(&self) -> Option<D::Engine> {
        self.handles.engine()
    }

    pub fn sessionmaker(&self) -> Option<D::SessionFactory> {
        self.handles.sessionmaker()
    }

    pub fn is_open(&self) -> bool {
        self.handles.read().engine.is_some()
    }

    async fn dispose(&self) -> ServiceResult<()> {
        let Some(engine) = self.handles.take_engine() else {
            error!("Attempted to close a non-existing engine");
            return Err(ServiceError::engine_not_initialized());
        };

        match engine.dispose().await {
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

    async fn run_in_transaction<T, F>(&self, block: F) -> ServiceResult<T>
    where
        F: for<'c> FnOnce(&'c mut ConnectionOf<D>) -> ScopeFuture<'c, T>,
    {
        let Some(engine) = self.handles.engine() else {
            error!("Engine is not available for connection");
            return Err(ServiceError::engine_not_initialized());
        };

        let mut connection = engine
            .begin()
            .await
            .map_err(|err| connection_error(&engine, err))?;

        let outcome = block(&mut connection).await;
        match outcome {
            Ok(value) => {
                connection
                    .commit()
                    .await
                    .map_err(|err| connection_error(&engine, err))?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = connection.rollback().await {
                    warn!(error = %rollback_err, "Rollback after failed block also failed");
                }
                Err(connection_error(&engine, err))
            }
        }
    }

    async fn run_in_session<T, F>(&self, block: F) -> ServiceResult<T>
    where
        F: for<'c> FnOnce(&'c mut SessionOf<D>) -> ScopeFuture<'c, T>,
    {
        let Some(factory) = self.handles.sessionmaker() else {
            error!("Sessionmaker is not available");
            return Err(ServiceError::sessionmaker_not_initialized());
        };

        let mut session = factory.create();

        let outcome = match block(&mut session).await {
            Ok(value) => Ok(value),
            Err(err) => {
                if let Err(rollback_err) = session.rollback().await {
                    warn!(error = %rollback_err, "Session rollback failed");
                }
                Err(err)
            }
        };
        let closed = session.close().await;

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

    fn session_error(&self, err: DriverError) -> ServiceError {
        error!(
            engine = %self.handles.engine_label(),
            error = %format_args!("{:#}", err),
            "Database error while using session"
        );
        ServiceError::session_failed(err)
    }
}

impl<D: AsyncDriver> BaseSessionManager for AsyncDatabaseManager<D> {
    fn connection_parameters(&self) -> &ConnectionParameters {
        &self.parameters
    }
}

#[async_trait]
impl<D> AsyncSessionManager for AsyncDatabaseManager<D>
where
    D: AsyncDriver + Send + Sync,
{
    type Connection = ConnectionOf<D>;
    type Session = SessionOf<D>;

    async fn close(&self) -> ServiceResult<()> {
        self.dispose().instrument(self.span.clone()).await
    }

    async fn connect<T, F>(&self, block: F) -> ServiceResult<T>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut Self::Connection) -> ScopeFuture<'c, T> + Send,
    {
        self.run_in_transaction(block)
            .instrument(self.span.clone())
            .await
    }

    async fn session<T, F>(&self, block: F) -> ServiceResult<T>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut Self::Session) -> ScopeFuture<'c, T> + Send,
    {
        self.run_in_session(block)
            .instrument(self.span.clone())
            .await
    }
}

fn connection_error<E: AsyncEngine>(engine: &E, err: DriverError) -> ServiceError {
    error!(
        engine = %engine,
        error = %format_args!("{:#}", err),
        "Database error while using connection"
    );
    ServiceError::connection_failed(err)
}
