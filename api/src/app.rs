//! Application state and factory

use actix_web::{
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    web, App, Error,
};
use std::sync::Arc;

use wu_core::services::auth::AccessTokenService;
use wu_infra::bootstrap::AppDatabase;
use wu_shared::config::MiddlewareConfig;

use crate::middleware::{CookieAuth, HttpMetrics, JwtAuth, Metrics, RequestLogging};
use crate::routes::{self, DatabaseHealth};

/// Shared handles every worker's application is built from
#[derive(Clone)]
pub struct AppState {
    /// Manager handed to handlers through [`Db`](crate::database::Db)
    pub database: Arc<AppDatabase>,
    /// Check behind `/ready`, the manager itself unless overridden
    pub health: Arc<dyn DatabaseHealth>,
    pub tokens: Arc<AccessTokenService>,
    pub metrics: Arc<HttpMetrics>,
    pub middleware: MiddlewareConfig,
    /// Cookie read by `/api/v1/whoami`
    pub cookie_name: String,
}

impl AppState {
    pub fn new(
        database: Arc<AppDatabase>,
        tokens: Arc<AccessTokenService>,
        metrics: Arc<HttpMetrics>,
        middleware: MiddlewareConfig,
        cookie_name: impl Into<String>,
    ) -> Self {
        let health: Arc<dyn DatabaseHealth> = database.clone();
        Self {
            database,
            health,
            tokens,
            metrics,
            middleware,
            cookie_name: cookie_name.into(),
        }
    }

    pub fn with_health(mut self, health: Arc<dyn DatabaseHealth>) -> Self {
        self.health = health;
        self
    }
}

/// Create and configure the application
pub fn create_app(
    state: AppState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = Error,
        InitError = (),
    >,
> {
    let request_logging = RequestLogging::new(state.middleware.logging_skip_paths.clone());
    let metrics = Metrics::new(
        Arc::clone(&state.metrics),
        state.middleware.metrics_skip_paths.clone(),
    );

    App::new()
        .app_data(web::Data::from(Arc::clone(&state.database)))
        .app_data(web::Data::from(Arc::clone(&state.health)))
        .app_data(web::Data::from(Arc::clone(&state.tokens)))
        .app_data(web::Data::from(Arc::clone(&state.metrics)))
        // Last wrapped runs first: request logging sees the metrics time too
        .wrap(metrics)
        .wrap(request_logging)
        .route("/health", web::get().to(routes::health))
        .route("/ready", web::get().to(routes::ready))
        .route("/metrics", web::get().to(routes::metrics))
        .service(
            web::scope("/api/v1")
                .service(
                    web::resource("/me")
                        .wrap(JwtAuth::new(Arc::clone(&state.tokens)))
                        .route(web::get().to(routes::me)),
                )
                .service(
                    web::resource("/whoami")
                        .wrap(
                            CookieAuth::new(Arc::clone(&state.tokens))
                                .with_cookie_name(&state.cookie_name),
                        )
                        .route(web::get().to(routes::whoami)),
                ),
        )
}
