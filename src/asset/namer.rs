//! Names for photo assets
//!
//! A photo is named after its capture time, `IMG_YYYYMMDD_HHMMSS`, followed
//! by an underscore, a numeric suffix and the original extension. Several
//! photos can share a capture second; they get different suffixes. Whether a
//! new photo is really new or a copy of one already stored cannot be decided
//! here, so that question is handed to a [`CollisionResolver`].

use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, info};

use crate::config::CollisionPolicy;
use crate::error::{Error, Result};
use crate::time::Timestamp;

/// How to proceed when assets with the same prefix already exist
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollisionChoice {
    /// Reuse this existing asset; no new bytes are stored
    UseExisting(String),
    /// Store the new photo under a free suffix
    CreateNew,
    /// Store nothing
    Abort,
}

/// Decides what to do about colliding asset names.
///
/// Only called when at least one existing asset shares the new asset's
/// prefix. A dialog, a fixed [`CollisionPolicy`] or a closure all qualify.
pub trait CollisionResolver {
    /// Choose how to proceed given the sorted colliding file names
    fn choose(&mut self, existing: &[String]) -> CollisionChoice;
}

impl<F> CollisionResolver for F
where
    F: FnMut(&[String]) -> CollisionChoice,
{
    fn choose(&mut self, existing: &[String]) -> CollisionChoice {
        self(existing)
    }
}

impl CollisionResolver for CollisionPolicy {
    fn choose(&mut self, existing: &[String]) -> CollisionChoice {
        match self {
            CollisionPolicy::CreateNew => CollisionChoice::CreateNew,
            CollisionPolicy::ReuseFirst => existing
                .first()
                .cloned()
                .map_or(CollisionChoice::CreateNew, CollisionChoice::UseExisting),
            CollisionPolicy::Abort => CollisionChoice::Abort,
        }
    }
}

/// Outcome of naming an asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetName {
    /// File name inside the asset directory
    pub file_name: String,
    /// Whether this names an asset that already exists
    pub reused: bool,
}

impl AssetName {
    fn new(file_name: String) -> Self {
        Self { file_name, reused: false }
    }

    fn existing(file_name: String) -> Self {
        Self { file_name, reused: true }
    }
}

/// Name prefix shared by all assets captured at `timestamp`
pub fn canonical_prefix(timestamp: &Timestamp) -> String {
    format!("IMG_{}", timestamp.format("%Y%m%d_%H%M%S"))
}

/// Sorted names in `asset_dir` that start with `prefix`.
///
/// The match is a plain case-sensitive prefix test. A missing directory has
/// no collisions.
pub fn list_collisions(asset_dir: &Path, prefix: &str) -> Result<Vec<String>> {
    let read_dir = match fs::read_dir(asset_dir) {
        Ok(read_dir) => read_dir,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut names = Vec::new();
    for dir_entry in read_dir {
        let file_name = dir_entry?.file_name();
        if let Some(name) = file_name.to_str() {
            if name.starts_with(prefix) {
                names.push(name.to_string());
            }
        }
    }
    names.sort();

    Ok(names)
}

/// First name `prefix_<k><extension>` not in `existing`, for `k` from zero.
///
/// `extension` may be given with or without its leading dot. Fails with
/// [`Error::TooManyCollisions`] after `max_attempts` candidates.
pub fn allocate_suffix(
    prefix: &str,
    existing: &[String],
    extension: &str,
    max_attempts: usize,
) -> Result<String> {
    let extension = dotted(extension);

    (0..max_attempts)
        .map(|k| format!("{}_{}{}", prefix, k, extension))
        .find(|candidate| !existing.iter().any(|name| name == candidate))
        .ok_or_else(|| Error::too_many_collisions(prefix, max_attempts))
}

/// Name a new asset captured at `timestamp`.
///
/// Without collisions the result is always suffix `_0` and `on_collision` is
/// not consulted. Returns `None` if `on_collision` aborts.
pub fn resolve<R>(
    asset_dir: &Path,
    timestamp: &Timestamp,
    extension: &str,
    max_attempts: usize,
    on_collision: &mut R,
) -> Result<Option<AssetName>>
where
    R: CollisionResolver + ?Sized,
{
    let prefix = canonical_prefix(timestamp);
    let existing = list_collisions(asset_dir, &prefix)?;

    if existing.is_empty() {
        return allocate_suffix(&prefix, &existing, extension, max_attempts)
            .map(|name| Some(AssetName::new(name)));
    }

    debug!(%prefix, count = existing.len(), "Asset name collisions");

    match on_collision.choose(&existing) {
        CollisionChoice::UseExisting(name) => {
            if !existing.contains(&name) {
                return Err(Error::unknown_asset(name));
            }
            debug!(%name, "Reusing existing asset");
            Ok(Some(AssetName::existing(name)))
        }
        CollisionChoice::CreateNew => {
            let name = allocate_suffix(&prefix, &existing, extension, max_attempts)?;
            debug!(%name, "Allocated new asset name");
            Ok(Some(AssetName::new(name)))
        }
        CollisionChoice::Abort => {
            info!(%prefix, "Asset naming aborted");
            Ok(None)
        }
    }
}

fn dotted(extension: &str) -> String {
    if extension.is_empty() || extension.starts_with('.') {
        extension.to_string()
    } else {
        format!(".{}", extension)
    }
}
