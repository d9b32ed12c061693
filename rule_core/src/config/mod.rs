//! Engine configuration and activity definition loading

mod engine;
mod registry;

pub use engine::{EngineConfig, UnknownConditionPolicy};
pub use registry::{ActivityRegistry, OwnerConfig};

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error loading engine configuration or activity files
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading '{path:?}': {error}")]
    Io {
        error: std::io::Error,
        path: Option<PathBuf>,
    },
    #[error("Parse error in '{path:?}': {error}")]
    Parse {
        error: toml::de::Error,
        path: Option<PathBuf>,
    },
    #[error("Validation error in '{path:?}': {message}")]
    Validation { message: String, path: Option<PathBuf> },
    #[error("Duplicate activity id '{id}' in '{path:?}'")]
    DuplicateActivity { id: String, path: Option<PathBuf> },
}

pub(crate) fn load_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        error: e,
        path: Some(path.to_path_buf()),
    })?;
    toml::from_str(&content).map_err(|e| ConfigError::Parse {
        error: e,
        path: Some(path.to_path_buf()),
    })
}

pub(crate) fn parse_toml<T: serde::de::DeserializeOwned>(content: &str) -> Result<T, ConfigError> {
    toml::from_str(content).map_err(|e| ConfigError::Parse {
        error: e,
        path: None,
    })
}
