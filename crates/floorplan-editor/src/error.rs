#![forbid(unsafe_code)]

use std::path::PathBuf;

use floorplan_core::EntityId;
use thiserror::Error;

/// Failures from a [`LayoutStore`](crate::store::LayoutStore).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed {what}: {source}")]
    Json {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported floor plan schema version {found} (newest supported {supported})")]
    UnsupportedVersion { found: u16, supported: u16 },

    #[error("tables saved but floor plan record failed: {source}")]
    PartialSave {
        #[source]
        source: Box<StoreError>,
    },

    #[error("layout store unavailable: {message}")]
    Unavailable { message: String },
}

impl StoreError {
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

/// Failures from [`EditSession`](crate::session::EditSession) operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("not in edit mode")]
    NotEditing,

    #[error("already in edit mode")]
    AlreadyEditing,

    #[error("a commit is in flight")]
    Busy,

    #[error("{0} not found in draft")]
    UnknownEntity(EntityId),

    #[error("failed to persist layout: {0}")]
    Persist(#[from] StoreError),
}

impl SessionError {
    /// Whether retrying the same action later can succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Busy | Self::Persist(_))
    }
}
