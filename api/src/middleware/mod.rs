pub mod auth;
pub mod metrics;
pub mod request_logging;

pub use auth::{Authenticated, CookieAuth, JwtAuth, MaybeUser, ACCESS_TOKEN_COOKIE};
pub use metrics::{HttpMetrics, Metrics};
pub use request_logging::{RequestId, RequestLogging, REQUEST_ID_HEADER};
