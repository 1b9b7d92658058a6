//! Error handling for the diary store
//!
//! This module provides the error type and result alias returned by every
//! public diary operation. Nothing in the crate swallows these errors; they
//! are handed to the caller, which decides how to present them.

use std::path::{Path, PathBuf};
use std::io;
use thiserror::Error;

use crate::shard::ShardError;

/// Errors that can occur in diary operations
#[derive(Error, Debug)]
pub enum Error {
    /// A file or directory could not be read or written
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A shard document exists but cannot be decoded
    #[error("Malformed shard {path:?}: {message}")]
    MalformedShard {
        path: PathBuf,
        message: String,
    },

    /// The caller supplied an entry that cannot be stored
    #[error("Invalid entry: {0}")]
    InvalidEntry(String),

    /// Asset naming ran out of suffixes
    #[error("Too many assets named {prefix}: no free suffix within {attempts} attempts")]
    TooManyCollisions {
        prefix: String,
        attempts: usize,
    },

    /// A collision decision referred to an asset that is not in the collision set
    #[error("Unknown asset: {0}")]
    UnknownAsset(String),

    /// The file offered as a photo is not a supported image type
    #[error("Unsupported asset type: {0}")]
    UnsupportedAsset(String),

    /// Errors related to configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors related to configuration serialization
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for diary operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new malformed shard error
    pub fn malformed_shard(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::MalformedShard {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new invalid entry error
    pub fn invalid_entry(message: impl Into<String>) -> Self {
        Self::InvalidEntry(message.into())
    }

    /// Create a new collision exhaustion error
    pub fn too_many_collisions(prefix: impl Into<String>, attempts: usize) -> Self {
        Self::TooManyCollisions {
            prefix: prefix.into(),
            attempts,
        }
    }

    /// Create a new unknown asset error
    pub fn unknown_asset(name: impl Into<String>) -> Self {
        Self::UnknownAsset(name.into())
    }

    /// Create a new unsupported asset error
    pub fn unsupported_asset(name: impl Into<String>) -> Self {
        Self::UnsupportedAsset(name.into())
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Convert a shard error, attaching the file it concerns
    pub fn from_shard(err: ShardError, path: &Path) -> Self {
        match err {
            ShardError::Io(err) => Self::Io(err),
            ShardError::Malformed(message) | ShardError::Xml(message) => {
                Self::malformed_shard(path, message)
            }
            err @ ShardError::YearMismatch { .. } => Self::malformed_shard(path, err.to_string()),
        }
    }

    /// Check if this is an I/O error
    pub fn is_io_error(&self) -> bool {
        matches!(self, Self::Io(_))
    }

    /// Check if this is a malformed shard error
    pub fn is_malformed_shard(&self) -> bool {
        matches!(self, Self::MalformedShard { .. })
    }

    /// Check if this is an invalid entry error
    pub fn is_invalid_entry(&self) -> bool {
        matches!(self, Self::InvalidEntry(_))
    }

    /// Check if asset naming gave up
    pub fn is_too_many_collisions(&self) -> bool {
        matches!(self, Self::TooManyCollisions { .. })
    }

    /// Get a user-friendly suggestion for resolving the error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::Io(err) if err.kind() == io::ErrorKind::NotFound => {
                Some("The diary directory or one of its files does not exist".to_string())
            }
            Self::Io(err) if err.kind() == io::ErrorKind::PermissionDenied => {
                Some("You don't have permission to access the diary directory".to_string())
            }
            Self::MalformedShard { path, .. } => Some(format!(
                "{} could not be read. It was left untouched; restore it from a backup or fix it by hand",
                path.display()
            )),
            Self::InvalidEntry(_) => Some("Attach a photo before saving a photo entry".to_string()),
            Self::TooManyCollisions { .. } => {
                Some("Too many photos share this capture time. Pick a different time".to_string())
            }
            Self::UnsupportedAsset(_) => Some("Use a jpg, jpeg, png or bmp image".to_string()),
            _ => None,
        }
    }
}
