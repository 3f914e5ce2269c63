//! Database session lifecycle
//!
//! Managers own an engine handle and a session factory derived from
//! [`ConnectionParameters`](wu_shared::config::ConnectionParameters) and hand
//! out transaction-scoped connections and sessions:
//! - [`SyncDatabaseManager`] for blocking drivers
//! - [`AsyncDatabaseManager`] for drivers driven by the async runtime
//!
//! A manager moves from open to closed exactly once. After close every
//! operation fails with `engine is not initialized`.
//!
//! Concrete drivers live in the infrastructure crate; this module only
//! defines the contracts they satisfy.

pub mod async_driver;
pub mod async_manager;
pub mod base;
mod handles;
pub mod naming;
pub mod sync_driver;
pub mod sync_manager;

#[cfg(test)]
mod tests;

pub use async_driver::{AsyncConnection, AsyncDriver, AsyncEngine, AsyncSession, AsyncSessionFactory};
pub use async_manager::AsyncDatabaseManager;
pub use base::{AsyncSessionManager, BaseSessionManager, SessionManager};
pub use naming::{default_table_name, TableName};
pub use sync_driver::{Connection, Driver, Engine, Session, SessionFactory};
pub use sync_manager::SyncDatabaseManager;

/// Failure raised by a driver, or by a caller's block inside a scope
pub type DriverError = anyhow::Error;

/// Future returned by the blocks passed to the async scoped operations
pub type ScopeFuture<'c, T> = futures_util::future::BoxFuture<'c, Result<T, DriverError>>;
