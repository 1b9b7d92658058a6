//! The diary handle
//!
//! A [`Diary`] ties the entry store, the nearest-entry resolver and asset
//! naming to one directory. It is the whole surface a user interface needs.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::asset::{self, AssetName, CollisionChoice, CollisionResolver};
use crate::config::DiaryConfig;
use crate::entry::Entry;
use crate::error::{Error, Result};
use crate::metrics::DiaryMetrics;
use crate::resolver::{NearestEntryResolver, Neighbours};
use crate::shard::{ensure_layout, ShardYear};
use crate::store::EntryStore;
use crate::time::{truncate_to_seconds, Direction, Timestamp};

/// An open diary directory.
///
/// Calls on one handle run one at a time, in call order. Nothing guards
/// against other processes using the same directory.
#[derive(Debug)]
pub struct Diary {
    config: DiaryConfig,
    store: EntryStore,
    asset_dir: PathBuf,
    metrics: Arc<DiaryMetrics>,
    lock: Mutex<()>,
}

impl Diary {
    /// Open the diary in `directory` with default settings
    pub fn open<P: AsRef<Path>>(directory: P) -> Result<Self> {
        Self::with_config(DiaryConfig::new(directory))
    }

    /// Open a diary with a custom configuration.
    ///
    /// The shard and asset directories are created if missing.
    pub fn with_config(config: DiaryConfig) -> Result<Self> {
        config.validate()?;

        let (shard_dir, asset_dir) = ensure_layout(
            &config.directory,
            &config.shard_dir_name,
            &config.asset_dir_name,
        )
        .map_err(|e| Error::from_shard(e, &config.directory))?;

        let metrics = Arc::new(DiaryMetrics::new(config.collect_metrics));
        let store = EntryStore::from_config(&config, metrics.clone());

        info!(
            directory = %config.directory.display(),
            shards = %shard_dir.display(),
            "Opened diary"
        );

        Ok(Self {
            config,
            store,
            asset_dir,
            metrics,
            lock: Mutex::new(()),
        })
    }

    /// Store an entry in the shard of its year
    pub fn append(&self, entry: &Entry) -> Result<()> {
        let _guard = self.lock.lock();
        self.store.append(entry)
    }

    /// Find the entry closest to `timestamp` strictly in `direction`
    pub fn find_nearest(&self, timestamp: Timestamp, direction: Direction) -> Result<Option<(Timestamp, Entry)>> {
        let _guard = self.lock.lock();
        NearestEntryResolver::new(&self.store).find(timestamp, direction)
    }

    /// Find the closest entries on both sides of `timestamp`
    pub fn neighbours(&self, timestamp: Timestamp) -> Result<Neighbours> {
        let _guard = self.lock.lock();
        NearestEntryResolver::new(&self.store).neighbours(timestamp)
    }

    /// Name the asset for the photo at `source`, captured at `timestamp`.
    ///
    /// The extension of `source` is kept. No bytes are copied; `None` means
    /// `on_collision` aborted.
    pub fn resolve_asset_name<R>(
        &self,
        source: &Path,
        timestamp: &Timestamp,
        on_collision: &mut R,
    ) -> Result<Option<AssetName>>
    where
        R: CollisionResolver + ?Sized,
    {
        let _guard = self.lock.lock();
        self.name_asset(source, timestamp, on_collision)
    }

    /// Copy the photo at `source` into the diary and record a photo entry.
    ///
    /// Without a `timestamp` the capture time is read from the file name, or
    /// else the file's modification time. Bytes are only copied when a new
    /// name was allocated; reusing an existing asset just adds the entry.
    /// Returns `None`, with nothing written, if `on_collision` aborts.
    pub fn import_photo<R>(
        &self,
        source: &Path,
        timestamp: Option<Timestamp>,
        caption: &str,
        on_collision: &mut R,
    ) -> Result<Option<Entry>>
    where
        R: CollisionResolver + ?Sized,
    {
        if !asset::is_supported_image(source) {
            return Err(Error::unsupported_asset(source.display().to_string()));
        }

        let _guard = self.lock.lock();

        let timestamp = match timestamp {
            Some(timestamp) => truncate_to_seconds(timestamp),
            None => asset::capture_time(source)?,
        };

        let name = match self.name_asset(source, &timestamp, on_collision)? {
            Some(name) => name,
            None => return Ok(None),
        };

        let target = self.asset_path(&name.file_name);
        if !name.reused {
            fs::copy(source, &target)?;
        }

        let entry = Entry::photo(timestamp, caption, &name.file_name);
        if let Err(e) = self.store.append(&entry) {
            if !name.reused {
                if let Err(cleanup) = fs::remove_file(&target) {
                    warn!(path = %target.display(), error = %cleanup, "Could not remove copied photo");
                }
            }
            return Err(e);
        }

        info!(asset = %name.file_name, reused = name.reused, "Imported photo");
        Ok(Some(entry))
    }

    /// [`import_photo`](Self::import_photo) deciding collisions with the
    /// configured collision policy
    pub fn import_photo_with_policy(
        &self,
        source: &Path,
        timestamp: Option<Timestamp>,
        caption: &str,
    ) -> Result<Option<Entry>> {
        let mut policy = self.config.collision_policy;
        self.import_photo(source, timestamp, caption, &mut policy)
    }

    fn name_asset<R>(
        &self,
        source: &Path,
        timestamp: &Timestamp,
        on_collision: &mut R,
    ) -> Result<Option<AssetName>>
    where
        R: CollisionResolver + ?Sized,
    {
        let mut collided = false;
        let mut observe = |existing: &[String]| -> CollisionChoice {
            collided = true;
            on_collision.choose(existing)
        };

        let named = asset::resolve(
            &self.asset_dir,
            timestamp,
            &asset::extension_of(source),
            self.config.max_collision_attempts,
            &mut observe,
        )?;

        match &named {
            Some(name) => self.metrics.record_asset_named(collided, name.reused),
            None => self.metrics.record_naming_aborted(),
        }

        Ok(named)
    }

    /// Years that have a shard, in ascending order
    pub fn years(&self) -> Result<Vec<ShardYear>> {
        let _guard = self.lock.lock();
        self.store.years()
    }

    /// Full path of an asset file name
    pub fn asset_path(&self, file_name: &str) -> PathBuf {
        self.asset_dir.join(file_name)
    }

    /// Directory holding the shard documents
    pub fn shard_dir(&self) -> &Path {
        self.store.shard_dir()
    }

    /// Directory holding the photo assets
    pub fn asset_dir(&self) -> &Path {
        &self.asset_dir
    }

    /// Configuration the diary was opened with
    pub fn config(&self) -> &DiaryConfig {
        &self.config
    }

    /// Operation counters
    pub fn metrics(&self) -> &DiaryMetrics {
        &self.metrics
    }
}
