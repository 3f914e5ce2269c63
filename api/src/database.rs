//! Request-scoped access to the shared database manager

use actix_web::{dev::Payload, web, Error, FromRequest, HttpRequest};
use std::future::{ready, Ready};
use tracing::error;

use wu_core::database::ScopeFuture;
use wu_core::{AsyncSessionManager, ServiceError};
use wu_infra::bootstrap::AppDatabase;
use wu_infra::database::{SqlxConnection, SqlxSession};

use crate::errors::ApiError;

/// Handler argument giving access to the application's manager
///
/// Every `session`/`connect` call runs in its own scope, closed before the
/// call returns, so nothing outlives the request.
#[derive(Clone)]
pub struct Db(web::Data<AppDatabase>);

impl Db {
    pub fn manager(&self) -> &AppDatabase {
        &self.0
    }

    /// Run `block` with a fresh session; failures map to a 503
    pub async fn session<T, F>(&self, block: F) -> Result<T, ApiError>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut SqlxSession) -> ScopeFuture<'c, T> + Send,
    {
        Ok(self.0.session(block).await?)
    }

    /// Run `block` inside a committed-on-success transaction
    pub async fn connect<T, F>(&self, block: F) -> Result<T, ApiError>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut SqlxConnection) -> ScopeFuture<'c, T> + Send,
    {
        Ok(self.0.connect(block).await?)
    }
}

impl FromRequest for Db {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let result = match req.app_data::<web::Data<AppDatabase>>() {
            Some(manager) => Ok(Db(manager.clone())),
            None => {
                error!(path = %req.path(), "Database manager is not registered");
                Err(Error::from(ApiError::Service(
                    ServiceError::engine_not_initialized(),
                )))
            }
        };
        ready(result)
    }
}
