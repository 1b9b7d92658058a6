//! Persistent storage of diary entries in yearly shards
//!
//! Every entry lives in the shard of its timestamp's year. An append reads the
//! whole shard, adds the entry at the end and writes the document back in one
//! atomic replacement, so a reader never sees a half-written shard.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::Datelike;
use tracing::{debug, info};

use crate::config::DiaryConfig;
use crate::entry::Entry;
use crate::error::{Error, Result};
use crate::metrics::DiaryMetrics;
use crate::shard::{self, Shard, ShardError, ShardYear};

/// Reads and writes the shard documents of one diary
#[derive(Debug, Clone)]
pub struct EntryStore {
    config: DiaryConfig,
    shard_dir: PathBuf,
    metrics: Arc<DiaryMetrics>,
}

impl EntryStore {
    /// Create a store for the shards in `shard_dir` with default settings
    pub fn new<P: AsRef<Path>>(shard_dir: P) -> Self {
        let shard_dir = shard_dir.as_ref().to_path_buf();
        Self {
            config: DiaryConfig::default(),
            shard_dir,
            metrics: Arc::new(DiaryMetrics::default()),
        }
    }

    /// Create a store for the diary described by `config`
    pub fn from_config(config: &DiaryConfig, metrics: Arc<DiaryMetrics>) -> Self {
        Self {
            config: config.clone(),
            shard_dir: config.shard_dir(),
            metrics,
        }
    }

    /// Directory holding the shard documents
    pub fn shard_dir(&self) -> &Path {
        &self.shard_dir
    }

    /// File extension of shard documents
    pub fn extension(&self) -> &str {
        &self.config.shard_extension
    }

    /// Metrics shared with the owning diary
    pub fn metrics(&self) -> &DiaryMetrics {
        &self.metrics
    }

    /// Path of the shard document for `year`
    pub fn shard_path(&self, year: ShardYear) -> PathBuf {
        shard::shard_path(&self.shard_dir, year, self.extension())
    }

    /// Load the shard for `year`, or `None` if the year has no document
    pub fn load_existing(&self, year: ShardYear) -> Result<Option<Shard>> {
        let path = self.shard_path(year);

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::Io(e)),
        };

        let document = String::from_utf8(bytes)
            .map_err(|e| Error::malformed_shard(&path, format!("not valid UTF-8: {}", e)))?;
        let shard = shard::decode(&document).map_err(|e| Error::from_shard(e, &path))?;

        if shard.year != year {
            return Err(Error::from_shard(
                ShardError::YearMismatch {
                    expected: year,
                    found: shard.year,
                },
                &path,
            ));
        }

        self.metrics.record_shard_loaded();
        debug!(year, entries = shard.len(), "Loaded shard");

        Ok(Some(shard))
    }

    /// Load the shard for `year`, or start a new empty one.
    ///
    /// A new shard is not written until an entry is appended to it.
    pub fn load_or_create(&self, year: ShardYear) -> Result<Shard> {
        match self.load_existing(year)? {
            Some(shard) => Ok(shard),
            None => {
                debug!(year, "Starting new shard");
                Ok(shard::new_empty(year, self.config.default_preamble(year)))
            }
        }
    }

    /// Append `entry` to the shard of its year
    pub fn append(&self, entry: &Entry) -> Result<()> {
        entry.validate()?;

        let start = Instant::now();
        let year = entry.timestamp.year();
        let path = self.shard_path(year);

        let mut shard = self.load_or_create(year)?;
        let created = shard.is_empty() && !path.exists();
        shard.push(entry.clone());

        let document = shard::encode(&shard).map_err(|e| Error::from_shard(e, &path))?;
        shard::write_atomic(&path, document.as_bytes(), self.config.sync_writes)
            .map_err(|e| Error::from_shard(e, &path))?;

        self.metrics.record_append(document.len(), start.elapsed());

        if created {
            info!(year, path = %path.display(), "Created shard");
        }
        debug!(
            year,
            entries = shard.len(),
            bytes = document.len(),
            "Wrote shard"
        );

        Ok(())
    }

    /// Years that have a shard document, in ascending order
    pub fn years(&self) -> Result<Vec<ShardYear>> {
        let years = shard::list_years(&self.shard_dir, self.extension())
            .map_err(|e| Error::from_shard(e, &self.shard_dir))?;
        Ok(years.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    use crate::time::Timestamp;

    fn ts(y: i32, mo: u32, d: u32, h: u32) -> Timestamp {
        NaiveDate::from_ymd_opt(y, mo, d).unwrap().and_hms_opt(h, 0, 0).unwrap()
    }

    #[test_log::test]
    fn test_append_creates_shard() -> anyhow::Result<()> {
        let temp_dir = tempdir()?;
        let store = EntryStore::new(temp_dir.path().join("XML"));

        assert_eq!(store.load_existing(2023)?, None);

        store.append(&Entry::text(ts(2023, 5, 1, 10), "hello"))?;

        let path = temp_dir.path().join("XML").join("2023.xml");
        assert!(path.is_file());

        let shard = store.load_existing(2023)?.unwrap();
        assert_eq!(shard.year, 2023);
        assert_eq!(shard.preamble, "Diary of the year 2023.");
        assert_eq!(shard.entries, vec![Entry::text(ts(2023, 5, 1, 10), "hello")]);

        Ok(())
    }

    #[test_log::test]
    fn test_appends_keep_insertion_order() -> anyhow::Result<()> {
        let temp_dir = tempdir()?;
        let store = EntryStore::new(temp_dir.path());

        let later = Entry::text(ts(2023, 6, 1, 10), "june");
        let earlier = Entry::photo(ts(2023, 5, 1, 10), "may", "IMG_20230501_100000_0.jpg");
        store.append(&later)?;
        store.append(&earlier)?;

        let shard = store.load_or_create(2023)?;
        assert_eq!(shard.entries, vec![later, earlier]);

        Ok(())
    }

    #[test_log::test]
    fn test_years() -> anyhow::Result<()> {
        let temp_dir = tempdir()?;
        let store = EntryStore::new(temp_dir.path().join("XML"));

        // The directory does not exist yet
        assert!(store.years()?.is_empty());

        store.append(&Entry::text(ts(2022, 1, 1, 0), "a"))?;
        store.append(&Entry::text(ts(2020, 1, 1, 0), "b"))?;
        store.append(&Entry::text(ts(2022, 2, 1, 0), "c"))?;

        assert_eq!(store.years()?, vec![2020, 2022]);
        assert_eq!(store.load_or_create(2022)?.len(), 2);

        Ok(())
    }

    #[test_log::test]
    fn test_load_or_create_does_not_write() -> anyhow::Result<()> {
        let temp_dir = tempdir()?;
        let store = EntryStore::new(temp_dir.path());

        let shard = store.load_or_create(1999)?;
        assert!(shard.is_empty());
        assert_eq!(shard.preamble, "Diary of the year 1999.");
        assert!(!store.shard_path(1999).exists());

        Ok(())
    }

    #[test_log::test]
    fn test_invalid_entry_writes_nothing() -> anyhow::Result<()> {
        let temp_dir = tempdir()?;
        let store = EntryStore::new(temp_dir.path());

        let err = store
            .append(&Entry::photo(ts(2023, 5, 1, 10), "caption", ""))
            .unwrap_err();
        assert!(err.is_invalid_entry());
        assert!(store.years()?.is_empty());

        Ok(())
    }

    #[test_log::test]
    fn test_malformed_shard_is_left_untouched() -> anyhow::Result<()> {
        let temp_dir = tempdir()?;
        let store = EntryStore::new(temp_dir.path());
        let path = store.shard_path(2023);
        fs::write(&path, "<root><head><year>2023")?;

        let err = store.append(&Entry::text(ts(2023, 5, 1, 10), "x")).unwrap_err();
        match &err {
            Error::MalformedShard { path: p, .. } => assert_eq!(p, &path),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(fs::read_to_string(&path)?, "<root><head><year>2023");

        Ok(())
    }

    #[test_log::test]
    fn test_year_mismatch_is_malformed() -> anyhow::Result<()> {
        let temp_dir = tempdir()?;
        let store = EntryStore::new(temp_dir.path());
        fs::write(store.shard_path(2021), "<root><head><year>2020</year></head></root>")?;

        assert!(store.load_existing(2021).unwrap_err().is_malformed_shard());
        Ok(())
    }

    #[test_log::test]
    fn test_non_utf8_shard_is_malformed() -> anyhow::Result<()> {
        let temp_dir = tempdir()?;
        let store = EntryStore::new(temp_dir.path());
        fs::write(store.shard_path(2021), [0xff, 0xfe, 0x00])?;

        assert!(store.load_existing(2021).unwrap_err().is_malformed_shard());
        Ok(())
    }

    #[test_log::test]
    fn test_unreadable_shard_is_io_error() -> anyhow::Result<()> {
        let temp_dir = tempdir()?;
        let store = EntryStore::new(temp_dir.path());
        fs::create_dir(store.shard_path(2023))?;

        assert!(store.load_existing(2023).unwrap_err().is_io_error());
        assert!(store.load_or_create(2023).unwrap_err().is_io_error());
        let err = store.append(&Entry::text(ts(2023, 5, 1, 10), "x")).unwrap_err();
        assert!(err.is_io_error());

        // The directory is not mistaken for a shard
        assert!(store.years()?.is_empty());
        Ok(())
    }

    #[test_log::test]
    fn test_sub_second_timestamp_is_rejected() -> anyhow::Result<()> {
        let temp_dir = tempdir()?;
        let store = EntryStore::new(temp_dir.path());

        let precise = Entry {
            timestamp: ts(2023, 3, 1, 1) + chrono::Duration::milliseconds(500),
            body: "x".to_string(),
            kind: crate::entry::EntryKind::Text,
        };
        assert!(store.append(&precise).unwrap_err().is_invalid_entry());
        assert!(store.years()?.is_empty());

        // Whatever is appended is what comes back
        let exact = Entry::text(ts(2023, 3, 1, 1), "x");
        store.append(&exact)?;
        assert_eq!(store.load_or_create(2023)?.entries.last(), Some(&exact));
        Ok(())
    }

    #[test_log::test]
    fn test_negative_year_round_trip() -> anyhow::Result<()> {
        let temp_dir = tempdir()?;
        let store = EntryStore::new(temp_dir.path());

        let ancient = NaiveDate::from_ymd_opt(-5, 3, 1).unwrap().and_hms_opt(1, 0, 0).unwrap();
        let entry = Entry::text(ancient, "bc");
        store.append(&entry)?;
        store.append(&Entry::text(ts(2019, 1, 1, 0), "modern"))?;

        assert_eq!(store.years()?, vec![-5, 2019]);
        assert_eq!(store.load_existing(-5)?.unwrap().entries, vec![entry.clone()]);

        let resolver = crate::resolver::NearestEntryResolver::new(&store);
        let found = resolver.find(ts(2019, 1, 1, 0), crate::time::Direction::Earlier)?;
        assert_eq!(found, Some((ancient, entry)));
        Ok(())
    }

    #[test_log::test]
    fn test_metrics_follow_appends() -> anyhow::Result<()> {
        let temp_dir = tempdir()?;
        let metrics = Arc::new(DiaryMetrics::default());
        let config = DiaryConfig::new(temp_dir.path()).with_sync_writes(false);
        let store = EntryStore::from_config(&config, metrics.clone());

        store.append(&Entry::text(ts(2023, 5, 1, 10), "hello"))?;

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.appends, 1);
        assert!(snapshot.bytes_written > 0);
        assert_eq!(store.shard_dir(), temp_dir.path().join("XML"));

        Ok(())
    }
}
