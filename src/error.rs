//! Error handling for sim-vs-obs reconciliation.
//!
//! Only a missing or empty primary simulation output is fatal for a merge.
//! Optional sources degrade to "no contribution" and are logged by the caller.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimObsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No simulated data in {path}: {reason}")]
    MissingPrimaryData { path: PathBuf, reason: String },

    #[error("Could not read source file {path}: {source}")]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid crop name: '{name}'")]
    InvalidCrop { name: String },

    #[error("Treatment metadata unavailable for {path}: {reason}")]
    MetadataUnavailable { path: PathBuf, reason: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl SimObsError {
    /// Create a missing primary data error
    pub fn missing_primary(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MissingPrimaryData {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an unreadable source error
    pub fn unreadable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::SourceUnreadable {
            path: path.into(),
            source,
        }
    }

    /// Create a metadata unavailable error
    pub fn metadata_unavailable(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MetadataUnavailable {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SimObsError>;
