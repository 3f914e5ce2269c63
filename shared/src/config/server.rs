//! Server configuration module

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server host address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Worker threads (0 = number of CPU cores)
    #[serde(default)]
    pub workers: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::from("127.0.0.1"),
            port: 8080,
            workers: 0,
        }
    }
}

impl ServerConfig {
    /// Create a new server configuration
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Create from `SERVER_HOST` / `SERVER_PORT` / `SERVER_WORKERS`
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("SERVER_HOST").unwrap_or(defaults.host),
            port: std::env::var("SERVER_PORT")
                .ok()
                .and_then(|port| port.parse().ok())
                .unwrap_or(defaults.port),
            workers: std::env::var("SERVER_WORKERS")
                .ok()
                .and_then(|workers| workers.parse().ok())
                .unwrap_or(defaults.workers),
        }
    }

    /// Get the bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Request logging and metrics middleware configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MiddlewareConfig {
    /// Paths the request logger ignores
    #[serde(default = "default_logging_skip_paths")]
    pub logging_skip_paths: BTreeSet<String>,

    /// Paths the metrics collector ignores
    #[serde(default = "default_metrics_skip_paths")]
    pub metrics_skip_paths: BTreeSet<String>,

    /// Track requests currently in flight
    #[serde(default = "default_track_in_progress")]
    pub track_in_progress: bool,
}

impl Default for MiddlewareConfig {
    fn default() -> Self {
        Self {
            logging_skip_paths: default_logging_skip_paths(),
            metrics_skip_paths: default_metrics_skip_paths(),
            track_in_progress: default_track_in_progress(),
        }
    }
}

fn default_logging_skip_paths() -> BTreeSet<String> {
    ["/health", "/metrics", "/ready"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_metrics_skip_paths() -> BTreeSet<String> {
    ["/health", "/ready"].into_iter().map(String::from).collect()
}

fn default_track_in_progress() -> bool {
    true
}
