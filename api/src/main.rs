use actix_web::HttpServer;
use anyhow::Context;
use prometheus::Registry;
use std::sync::Arc;
use tracing::{error, info};

use wu_api::middleware::HttpMetrics;
use wu_api::{create_app, AppState};
use wu_core::services::auth::AccessTokenService;
use wu_infra::logging;
use wu_infra::DatabaseBootstrap;
use wu_shared::config::{AppConfig, SecretKey};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env();

    logging::facade_for(&config.logging)
        .setup()
        .context("logging setup failed")?;
    info!(environment = %config.environment, "Starting web utilities API server");

    let bootstrap = DatabaseBootstrap::init().context("database configuration")?;
    let secret = SecretKey::from_env().context("secret key configuration")?;
    let tokens = AccessTokenService::new(&secret, &config.jwt)?;
    let metrics = HttpMetrics::new(Registry::new(), config.middleware.track_in_progress)?;

    let state = AppState::new(
        bootstrap.manager(),
        Arc::new(tokens),
        Arc::new(metrics),
        config.middleware.clone(),
        config.jwt.cookie_name.clone(),
    );

    let bind_address = config.server.bind_address();
    info!(address = %bind_address, "Server will bind");

    let mut server = HttpServer::new(move || create_app(state.clone()));
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }
    let served = match server.bind(&bind_address) {
        Ok(server) => server.run().await,
        Err(err) => Err(err),
    };

    if let Err(err) = bootstrap.shutdown().await {
        error!(error = %err, "Shutdown left the database manager open");
    }
    served.with_context(|| format!("server on {} failed", bind_address))
}
