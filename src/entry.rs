//! Diary entries
//!
//! An entry is either a plain text note or a photo with a caption. The kind is
//! a closed enum, so a photo always carries its asset reference and a text
//! entry never does.

use std::path::Path;
use chrono::Timelike;
use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};
use crate::time::{truncate_to_seconds, Timestamp};

/// What kind of record an entry is
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    /// A text entry; the body is the diary text
    Text,
    /// A photo entry; the body is the caption
    Photo {
        /// File name of the photo, relative to the asset directory
        asset_ref: String,
    },
}

/// One diary record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entry {
    /// When the entry was written (or the photo taken)
    pub timestamp: Timestamp,
    /// Diary text for text entries, caption for photos
    pub body: String,
    /// Entry kind
    pub kind: EntryKind,
}

impl Entry {
    /// Create a new text entry
    pub fn text(timestamp: Timestamp, body: impl Into<String>) -> Self {
        Self {
            timestamp: truncate_to_seconds(timestamp),
            body: body.into(),
            kind: EntryKind::Text,
        }
    }

    /// Create a new photo entry.
    ///
    /// Only the file name of `asset_ref` is kept; assets always live in the
    /// diary's asset directory.
    pub fn photo(timestamp: Timestamp, caption: impl Into<String>, asset_ref: impl AsRef<str>) -> Self {
        Self {
            timestamp: truncate_to_seconds(timestamp),
            body: caption.into(),
            kind: EntryKind::Photo {
                asset_ref: basename(asset_ref.as_ref()),
            },
        }
    }

    /// The photo file name, if this is a photo entry
    pub fn asset_ref(&self) -> Option<&str> {
        match &self.kind {
            EntryKind::Text => None,
            EntryKind::Photo { asset_ref } => Some(asset_ref),
        }
    }

    /// Check if this is a photo entry
    pub fn is_photo(&self) -> bool {
        matches!(self.kind, EntryKind::Photo { .. })
    }

    /// The `type` tag used for this entry in shard documents
    pub fn type_tag(&self) -> &'static str {
        match self.kind {
            EntryKind::Text => "text",
            EntryKind::Photo { .. } => "photo",
        }
    }

    /// Check that the entry can be stored.
    ///
    /// Empty text is fine; a photo without a file name is not. Timestamps
    /// are stored to the second, so a sub-second part is rejected rather than
    /// silently dropped.
    pub fn validate(&self) -> Result<()> {
        if self.timestamp.nanosecond() != 0 {
            return Err(Error::invalid_entry(format!(
                "timestamp {} has a sub-second part",
                self.timestamp
            )));
        }
        if let EntryKind::Photo { asset_ref } = &self.kind {
            if asset_ref.trim().is_empty() {
                return Err(Error::invalid_entry(format!(
                    "photo entry at {} has no asset reference",
                    self.timestamp
                )));
            }
        }
        Ok(())
    }

    /// Single-line preview of the body, at most `max_chars` characters long
    pub fn preview(&self, max_chars: usize) -> String {
        let flat = self.body.replace('\n', " ").replace("  ", " ");
        match flat.char_indices().nth(max_chars) {
            Some((cut, _)) => flat[..cut].to_string(),
            None => flat,
        }
    }
}

/// File name component of a path, or the input unchanged if it has none
fn basename(asset_ref: &str) -> String {
    Path::new(asset_ref)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(asset_ref)
        .to_string()
}
