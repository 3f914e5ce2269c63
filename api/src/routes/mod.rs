//! HTTP endpoints

pub mod health;
pub mod me;
pub mod metrics;

pub use health::{health, ready, DatabaseHealth};
pub use me::{me, whoami};
pub use metrics::metrics;
