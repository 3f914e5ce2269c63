use actix_web::{web, HttpResponse};
use prometheus::TEXT_FORMAT;

use crate::errors::ApiError;
use crate::middleware::HttpMetrics;

/// `GET /metrics` in the Prometheus text exposition format
pub async fn metrics(metrics: web::Data<HttpMetrics>) -> Result<HttpResponse, ApiError> {
    let body = metrics.render().map_err(|err| {
        tracing::error!(error = %err, "Could not encode metrics");
        ApiError::service()
    })?;
    Ok(HttpResponse::Ok().content_type(TEXT_FORMAT).body(body))
}
