//! Configuration for a diary
//!
//! This module provides the options of a diary directory and the session file
//! that remembers which diary was opened last.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use serde::{Serialize, Deserialize};

use crate::error::{Result, Error};
use crate::shard::{write_atomic, ShardYear, SHARD_EXTENSION};

/// What to do with a new photo whose name is already taken, when nobody is
/// around to ask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum CollisionPolicy {
    /// Always store the photo under a fresh suffix
    CreateNew,
    /// Reuse the first existing asset with the same prefix
    ReuseFirst,
    /// Give up and store nothing
    Abort,
}

impl Default for CollisionPolicy {
    fn default() -> Self {
        Self::CreateNew
    }
}

impl std::fmt::Display for CollisionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl CollisionPolicy {
    /// Parse a collision policy from a string
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "create_new" => Ok(Self::CreateNew),
            "reuse_first" => Ok(Self::ReuseFirst),
            "abort" => Ok(Self::Abort),
            _ => Err(Error::config(format!("Unknown collision policy: {}", s))),
        }
    }

    /// Get the name of the collision policy
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateNew => "create_new",
            Self::ReuseFirst => "reuse_first",
            Self::Abort => "abort",
        }
    }
}

/// Configuration options for a diary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[non_exhaustive]
pub struct DiaryConfig {
    /// Root directory of the diary
    pub directory: PathBuf,
    /// Sub-directory holding the yearly shard documents
    pub shard_dir_name: String,
    /// Sub-directory holding photo assets
    pub asset_dir_name: String,
    /// File extension of shard documents, without the dot
    pub shard_extension: String,
    /// Header text of a new shard; `{year}` is replaced by the year
    pub preamble_template: String,
    /// Upper bound on suffixes tried when naming an asset
    pub max_collision_attempts: usize,
    /// Whether to sync shard files to disk before replacing them
    pub sync_writes: bool,
    /// Enable metrics collection
    pub collect_metrics: bool,
    /// Collision handling for callers that cannot ask the user
    pub collision_policy: CollisionPolicy,
}

impl Default for DiaryConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::new(),
            shard_dir_name: "XML".to_string(),
            asset_dir_name: "Img".to_string(),
            shard_extension: SHARD_EXTENSION.to_string(),
            preamble_template: "Diary of the year {year}.".to_string(),
            max_collision_attempts: 10_000,
            sync_writes: true,
            collect_metrics: true,
            collision_policy: CollisionPolicy::default(),
        }
    }
}

impl DiaryConfig {
    /// Create a configuration for the diary in `directory` with default values
    pub fn new<P: AsRef<Path>>(directory: P) -> Self {
        Self::default().with_directory(directory)
    }

    /// Set the root directory
    pub fn with_directory<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.directory = path.as_ref().to_path_buf();
        self
    }

    /// Set the shard sub-directory name
    pub fn with_shard_dir_name(mut self, name: impl Into<String>) -> Self {
        self.shard_dir_name = name.into();
        self
    }

    /// Set the asset sub-directory name
    pub fn with_asset_dir_name(mut self, name: impl Into<String>) -> Self {
        self.asset_dir_name = name.into();
        self
    }

    /// Set the shard file extension
    pub fn with_shard_extension(mut self, extension: impl Into<String>) -> Self {
        self.shard_extension = extension.into();
        self
    }

    /// Set the preamble template
    pub fn with_preamble_template(mut self, template: impl Into<String>) -> Self {
        self.preamble_template = template.into();
        self
    }

    /// Set the maximum number of suffixes tried when naming an asset
    pub fn with_max_collision_attempts(mut self, attempts: usize) -> Self {
        self.max_collision_attempts = attempts;
        self
    }

    /// Set whether to sync writes to disk
    pub fn with_sync_writes(mut self, sync: bool) -> Self {
        self.sync_writes = sync;
        self
    }

    /// Set whether to collect metrics
    pub fn with_collect_metrics(mut self, collect: bool) -> Self {
        self.collect_metrics = collect;
        self
    }

    /// Set the collision policy
    pub fn with_collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.collision_policy = policy;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.directory.as_os_str().is_empty() {
            return Err(Error::config("Diary directory must be set"));
        }

        for (what, name) in [("Shard", &self.shard_dir_name), ("Asset", &self.asset_dir_name)] {
            if !is_plain_name(name) {
                return Err(Error::config(format!(
                    "{} directory name must be a single path component, got '{}'",
                    what, name
                )));
            }
        }

        if self.shard_dir_name == self.asset_dir_name {
            return Err(Error::config(
                "Shard and asset directories must differ"
            ));
        }

        if self.shard_extension.is_empty()
            || self.shard_extension.contains('.')
            || self.shard_extension.contains(['/', '\\'])
        {
            return Err(Error::config(
                "Shard extension must be non-empty and have no dot"
            ));
        }

        if self.max_collision_attempts < 1 {
            return Err(Error::config(
                "Maximum collision attempts must be at least 1"
            ));
        }

        if !self.preamble_template.contains("{year}") {
            return Err(Error::config(
                "Preamble template must contain {year}"
            ));
        }

        Ok(())
    }

    /// Header text for a newly created shard
    pub fn default_preamble(&self, year: ShardYear) -> String {
        self.preamble_template.replace("{year}", &year.to_string())
    }

    /// Directory holding the shard documents
    pub fn shard_dir(&self) -> PathBuf {
        self.directory.join(&self.shard_dir_name)
    }

    /// Directory holding the photo assets
    pub fn asset_dir(&self) -> PathBuf {
        self.directory.join(&self.asset_dir_name)
    }

    /// Create a human-readable string representation of the configuration
    pub fn to_string_pretty(&self) -> String {
        let mut result = String::new();

        result.push_str("=== Diary Configuration ===\n\n");

        result.push_str("Layout:\n");
        result.push_str(&format!("  Directory: {:?}\n", self.directory));
        result.push_str(&format!("  Shard Directory: {}\n", self.shard_dir_name));
        result.push_str(&format!("  Asset Directory: {}\n", self.asset_dir_name));
        result.push_str(&format!("  Shard Extension: {}\n", self.shard_extension));

        result.push_str("\nEntries:\n");
        result.push_str(&format!("  Preamble Template: {}\n", self.preamble_template));

        result.push_str("\nAssets:\n");
        result.push_str(&format!("  Max Collision Attempts: {}\n", self.max_collision_attempts));
        result.push_str(&format!("  Collision Policy: {}\n", self.collision_policy));

        result.push_str("\nReliability Settings:\n");
        result.push_str(&format!("  Sync Writes: {}\n", self.sync_writes));
        result.push_str(&format!("  Collect Metrics: {}\n", self.collect_metrics));

        result
    }

    /// Load configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

fn is_plain_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(std::path::Component::Normal(_)), None)
    )
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionRecord {
    last_directory: PathBuf,
}

/// Remembers the diary directory used last, so the next start can reopen it
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    /// Use the session file at `path`
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Session file in the user's configuration directory, if there is one
    pub fn default_location() -> Option<Self> {
        dirs::config_dir().map(|dir| Self::new(dir.join("diary_rs").join("session.json")))
    }

    /// Path of the session file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The recorded directory, if the file exists and the directory still does
    pub fn load(&self) -> Result<Option<PathBuf>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let record: SessionRecord = serde_json::from_str(&content)?;
        if record.last_directory.is_dir() {
            Ok(Some(record.last_directory))
        } else {
            tracing::debug!(
                "Session directory {:?} no longer exists",
                record.last_directory
            );
            Ok(None)
        }
    }

    /// Record `directory` as the one used last
    pub fn save(&self, directory: &Path) -> Result<()> {
        let record = SessionRecord {
            last_directory: directory.to_path_buf(),
        };
        let content = serde_json::to_vec_pretty(&record)?;
        write_atomic(&self.path, &content, true).map_err(|e| Error::from_shard(e, &self.path))
    }
}
