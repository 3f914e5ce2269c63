//! Authentication configuration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use super::source::{load_settings, ConfigError};

/// Default settings file read by [`SecretKey::from_env`]
pub const DEFAULT_SECRET_ENV_FILE: &str = ".secret.env";

/// JWT configuration (everything except the signing secret)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JwtConfig {
    /// Algorithm for JWT signing (default: HS256)
    #[serde(default = "default_algorithm")]
    pub algorithm: String,

    /// Access token expiry time in minutes
    #[serde(default = "default_access_token_minutes")]
    pub access_token_minutes: i64,

    /// Name of the cookie carrying the access token
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            algorithm: default_algorithm(),
            access_token_minutes: default_access_token_minutes(),
            cookie_name: default_cookie_name(),
        }
    }
}

impl JwtConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let access_token_minutes = std::env::var("JWT_ACCESS_TOKEN_MINUTES")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or_else(default_access_token_minutes);

        Self {
            access_token_minutes,
            ..Default::default()
        }
    }

    /// Set access token expiry in minutes
    pub fn with_access_expiry_minutes(mut self, minutes: i64) -> Self {
        self.access_token_minutes = minutes;
        self
    }
}

/// Secret used to sign access tokens
#[derive(Clone, Deserialize)]
pub struct SecretKey {
    secret_key: String,
}

impl SecretKey {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
        }
    }

    /// Load `SECRET_KEY` from `.secret.env`, overridden by the process
    /// environment. The key is required.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_sources(Some(Path::new(DEFAULT_SECRET_ENV_FILE)), std::env::vars())
    }

    /// Load from an explicit settings file and variable set
    pub fn from_sources<I>(env_file: Option<&Path>, vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        load_settings(&["secret_key"], env_file, vars)
    }

    pub fn expose(&self) -> &str {
        &self.secret_key
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(***)")
    }
}

fn default_algorithm() -> String {
    String::from("HS256")
}

fn default_access_token_minutes() -> i64 {
    60
}

fn default_cookie_name() -> String {
    String::from("access_token")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_jwt_config_default() {
        let config = JwtConfig::default();
        assert_eq!(config.algorithm, "HS256");
        assert_eq!(config.access_token_minutes, 60);
        assert_eq!(config.cookie_name, "access_token");
    }

    #[test]
    fn test_jwt_config_builder() {
        let config = JwtConfig::default().with_access_expiry_minutes(15);
        assert_eq!(config.access_token_minutes, 15);
    }

    #[test]
    fn test_secret_key_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "SECRET_KEY=super-secret").unwrap();

        let key = SecretKey::from_sources(Some(file.path()), Vec::new()).unwrap();
        assert_eq!(key.expose(), "super-secret");
        assert_eq!(format!("{:?}", key), "SecretKey(***)");
    }

    #[test]
    fn test_secret_key_is_required() {
        assert!(SecretKey::from_sources(None, Vec::new()).is_err());
    }
}
