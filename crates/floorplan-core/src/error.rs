#![forbid(unsafe_code)]

use std::path::PathBuf;

use thiserror::Error;

use crate::geometry::{GRID_MAX, GRID_MIN};

/// Rejected grid dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GridSpecError {
    #[error("grid {columns}x{rows} outside supported range {GRID_MIN}..={GRID_MAX}")]
    OutOfRange { columns: u16, rows: u16 },
}

/// Failures while loading or validating an [`EditorConfig`](crate::config::EditorConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config value: {message}")]
    Invalid { message: String },
}

impl ConfigError {
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}
