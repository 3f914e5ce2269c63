//! # WebUtils Core
//!
//! Database session lifecycle and the helpers built on top of it.
//! This crate contains the sync and async session managers with the driver
//! contracts they run on, the uniform service error, JWT and password
//! helpers, the answer cache pre-check and the generic CRUD contracts.

pub mod database;
pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use database::{
    AsyncDatabaseManager, AsyncSessionManager, BaseSessionManager, DriverError, SessionManager,
    SyncDatabaseManager, TableName,
};
pub use domain::CurrentUser;
pub use errors::{AuthError, ServiceError, ServiceResult};
