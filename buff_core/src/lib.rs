//! buff_core - Per-actor combat state for the activity rule engine
//!
//! This library provides:
//! - StackStore: layered, timed buff/debuff instances with merge-on-add
//! - BuffCatalog: the known stack ids and their round-end behaviour
//! - PooledResource: primary/bonus boolean slot pools
//! - ActorCombatState: the aggregate the host persists per actor
//! - advance_round: end-of-round expiry, decay and next-round merging

pub mod actor;
pub mod catalog;
pub mod pool;
pub mod round;
pub mod store;
pub mod types;

pub use actor::{ActorCombatState, Health, UsageCounter};
pub use catalog::{builtin_catalog, load_catalog, parse_catalog, BuffCatalog, BuffDef, BuffKind, Lifetime};
pub use pool::{PoolKind, PooledResource};
pub use round::{advance_round, RoundEntry, RoundReport};
pub use store::StackStore;
pub use types::{StackInstance, StackKey, Timing};

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error loading buff configuration
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
    #[error("Validation error: {0}")]
    Validation(String),
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
