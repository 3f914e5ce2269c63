//! Layered settings loading: dotenv-style file first, process environment on top

use serde::de::DeserializeOwned;
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading required settings
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings file {path}: {source}")]
    EnvFile {
        path: String,
        #[source]
        source: dotenvy::Error,
    },

    #[error("invalid settings: {0}")]
    Invalid(#[from] config::ConfigError),
}

/// Collect the allowed `keys` from an optional env file and a set of
/// variables, then deserialize them into `T`.
///
/// Keys are matched case-insensitively. Variables override file values.
/// A missing file is not an error; a missing key is.
pub(crate) fn load_settings<T, I>(
    keys: &[&str],
    env_file: Option<&Path>,
    vars: I,
) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
    I: IntoIterator<Item = (String, String)>,
{
    let mut builder = config::Config::builder();

    if let Some(path) = env_file.filter(|path| path.exists()) {
        let entries = dotenvy::from_path_iter(path).map_err(|source| ConfigError::EnvFile {
            path: path.display().to_string(),
            source,
        })?;
        for entry in entries {
            let (key, value) = entry.map_err(|source| ConfigError::EnvFile {
                path: path.display().to_string(),
                source,
            })?;
            let key = key.to_lowercase();
            if keys.contains(&key.as_str()) {
                builder = builder.set_default(key, value)?;
            }
        }
    }

    for (key, value) in vars {
        let key = key.to_lowercase();
        if keys.contains(&key.as_str()) {
            builder = builder.set_override(key, value)?;
        }
    }

    Ok(builder.build()?.try_deserialize()?)
}
