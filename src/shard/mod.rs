//! Year-based shards of diary entries
//!
//! Entries are organized into one shard per calendar year. Each shard is a
//! single XML document on disk, rewritten as a whole whenever an entry is
//! added to it.

mod codec;
mod error;
mod locator;
mod util;

pub use codec::{decode, encode, new_empty};
pub use error::{ShardError, ShardResult};
pub use locator::{list_years, nearest_in, nearest_year};
pub use util::{ensure_layout, shard_path, write_atomic};

use crate::entry::Entry;

/// Shard year type
pub type ShardYear = i32;

/// Default file extension for shard documents
pub const SHARD_EXTENSION: &str = "xml";

/// All entries of one calendar year
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shard {
    /// Calendar year; matches the file name
    pub year: ShardYear,
    /// Free-form header text, written once when the shard is created
    pub preamble: String,
    /// Entries in insertion order (not sorted by time)
    pub entries: Vec<Entry>,
}

impl Shard {
    /// Create a shard with no entries
    pub fn new_empty(year: ShardYear, preamble: impl Into<String>) -> Self {
        Self {
            year,
            preamble: preamble.into(),
            entries: Vec::new(),
        }
    }

    /// Append an entry after all existing ones
    pub fn push(&mut self, entry: Entry) {
        self.entries.push(entry);
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the shard has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
