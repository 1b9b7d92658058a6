//! Utility functions for shard files
//!
//! Provides helper functions for locating shard files and writing them safely.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::shard::{ShardResult, ShardYear};

/// Get the path for a shard file
pub fn shard_path(shard_dir: &Path, year: ShardYear, extension: &str) -> PathBuf {
    shard_dir.join(format!("{}.{}", year, extension))
}

/// Replace the contents of `path` in one step.
///
/// The bytes go to a temporary file in the same directory which is then
/// renamed over `path`. If anything fails, the previous file is untouched.
/// With `sync`, both the file and (on Unix) its directory are flushed to disk.
pub fn write_atomic(path: &Path, bytes: &[u8], sync: bool) -> ShardResult<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut temp = NamedTempFile::new_in(parent)?;
    temp.write_all(bytes)?;
    temp.flush()?;
    if sync {
        temp.as_file().sync_all()?;
    }
    temp.persist(path).map_err(|e| e.error)?;

    // Make the rename itself durable
    #[cfg(unix)]
    if sync {
        fs::File::open(parent)?.sync_all()?;
    }

    Ok(())
}

/// Create the shard and asset directories below `root` if they don't exist
pub fn ensure_layout(root: &Path, shard_dir: &str, asset_dir: &str) -> ShardResult<(PathBuf, PathBuf)> {
    let shards = root.join(shard_dir);
    let assets = root.join(asset_dir);

    fs::create_dir_all(&shards)?;
    fs::create_dir_all(&assets)?;

    Ok((shards, assets))
}
