#![forbid(unsafe_code)]

use std::path::PathBuf;

use floorplan_core::ConfigError;
use floorplan_editor::{SessionError, StoreError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("floor plan already exists at {} (use --force to overwrite)", path.display())]
    AlreadyInitialized { path: PathBuf },

    #[error("layout has {count} problem(s)")]
    Invalid { count: usize },

    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),

    #[error("failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),
}

impl CliError {
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Invalid { .. } => 1,
            Self::AlreadyInitialized { .. } => 3,
            Self::Config(_) => 4,
            Self::Store(_) | Self::Session(_) => 5,
            Self::Output(_) | Self::Encode(_) => 6,
        }
    }
}
