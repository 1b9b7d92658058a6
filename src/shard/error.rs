//! Error types for the shard module
//!
//! Defines error types specific to shard encoding, decoding and discovery.

use std::io;
use thiserror::Error;

/// Errors that can occur during shard operations
#[derive(Error, Debug)]
pub enum ShardError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The document is well-formed XML but not a valid shard
    #[error("Malformed shard: {0}")]
    Malformed(String),

    /// The document is not well-formed XML
    #[error("XML error: {0}")]
    Xml(String),

    /// The year in the shard header disagrees with the file name
    #[error("Shard header says year {found}, expected {expected}")]
    YearMismatch {
        expected: i32,
        found: i32,
    },
}

/// Result type for shard operations
pub type ShardResult<T> = std::result::Result<T, ShardError>;

impl ShardError {
    /// Create a new malformed shard error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }

    /// Create a new XML error
    pub fn xml(message: impl Into<String>) -> Self {
        Self::Xml(message.into())
    }

    /// Check if this is an I/O error
    pub fn is_io_error(&self) -> bool {
        matches!(self, Self::Io(_))
    }

    /// Check if the document itself is at fault
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed(_) | Self::Xml(_) | Self::YearMismatch { .. })
    }
}
