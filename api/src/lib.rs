//! # HTTP layer
//!
//! actix-web application exposing health, readiness and metrics endpoints
//! and the JWT-protected user endpoints, with request logging and
//! Prometheus middleware. Handlers reach the shared database manager through
//! the [`Db`] extractor.

pub mod app;
pub mod database;
pub mod errors;
pub mod middleware;
pub mod routes;

pub use app::{create_app, AppState};
pub use database::Db;
pub use errors::ApiError;
