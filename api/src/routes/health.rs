//! Liveness and readiness checks

use actix_web::{web, HttpResponse};
use async_trait::async_trait;
use serde_json::json;

use wu_core::{AsyncSessionManager, ServiceResult};
use wu_infra::bootstrap::AppDatabase;

use crate::errors::ApiError;

/// Round trip to the database used by `/ready`
#[async_trait]
pub trait DatabaseHealth: Send + Sync {
    async fn ping(&self) -> ServiceResult<()>;
}

#[async_trait]
impl DatabaseHealth for AppDatabase {
    async fn ping(&self) -> ServiceResult<()> {
        self.session(|session| {
            Box::pin(async move {
                session.execute("SELECT 1").await?;
                Ok(())
            })
        })
        .await
    }
}

/// `GET /health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

/// `GET /ready`: 503 unless a session can run `SELECT 1`
pub async fn ready(database: web::Data<dyn DatabaseHealth>) -> Result<HttpResponse, ApiError> {
    database.ping().await?;
    Ok(HttpResponse::Ok().json(json!({ "status": "ready" })))
}
