//! Operation counters for a diary handle
//!
//! All counters are relaxed atomics: they are statistics, not synchronization.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use serde::{Serialize, Deserialize};

/// Performance metrics collector for a diary
#[derive(Debug)]
pub struct DiaryMetrics {
    /// Whether recording is enabled at all
    enabled: bool,

    // Store
    /// Number of entries appended
    append_count: AtomicUsize,
    /// Total bytes of shard documents written
    bytes_written: AtomicUsize,
    /// Total time spent in appends, in nanoseconds
    write_duration_ns: AtomicU64,
    /// Number of shard documents decoded
    shards_loaded: AtomicUsize,

    // Resolver
    /// Number of nearest-entry lookups
    lookup_count: AtomicUsize,
    /// Lookups that found nothing in either the query year or any other year
    lookup_misses: AtomicUsize,
    /// Shards scanned during lookups
    shards_scanned: AtomicUsize,
    /// Times a lookup moved on to another year
    year_hops: AtomicUsize,

    // Assets
    /// Asset names handed out
    assets_named: AtomicUsize,
    /// Namings that found existing assets with the same prefix
    collision_sets: AtomicUsize,
    /// Namings the caller aborted
    namings_aborted: AtomicUsize,
    /// Namings that reused an existing asset
    assets_reused: AtomicUsize,

    /// Start time of the metrics collector
    start_time: Instant,
}

/// Point-in-time copy of all counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub appends: usize,
    pub bytes_written: usize,
    pub write_duration: Duration,
    pub shards_loaded: usize,
    pub lookups: usize,
    pub lookup_misses: usize,
    pub shards_scanned: usize,
    pub year_hops: usize,
    pub assets_named: usize,
    pub collision_sets: usize,
    pub namings_aborted: usize,
    pub assets_reused: usize,
}

impl Default for DiaryMetrics {
    fn default() -> Self {
        Self::new(true)
    }
}

impl DiaryMetrics {
    /// Create a new metrics collector; a disabled one records nothing
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            append_count: AtomicUsize::new(0),
            bytes_written: AtomicUsize::new(0),
            write_duration_ns: AtomicU64::new(0),
            shards_loaded: AtomicUsize::new(0),
            lookup_count: AtomicUsize::new(0),
            lookup_misses: AtomicUsize::new(0),
            shards_scanned: AtomicUsize::new(0),
            year_hops: AtomicUsize::new(0),
            assets_named: AtomicUsize::new(0),
            collision_sets: AtomicUsize::new(0),
            namings_aborted: AtomicUsize::new(0),
            assets_reused: AtomicUsize::new(0),
            start_time: Instant::now(),
        }
    }

    /// Check if recording is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn add(&self, counter: &AtomicUsize, amount: usize) {
        if self.enabled {
            counter.fetch_add(amount, Ordering::Relaxed);
        }
    }

    /// Record one append and the size of the shard written for it
    pub fn record_append(&self, bytes: usize, duration: Duration) {
        self.add(&self.append_count, 1);
        self.add(&self.bytes_written, bytes);
        if self.enabled {
            self.write_duration_ns
                .fetch_add(u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX), Ordering::Relaxed);
        }
    }

    /// Record a shard document being decoded
    pub fn record_shard_loaded(&self) {
        self.add(&self.shards_loaded, 1);
    }

    /// Record a finished lookup
    pub fn record_lookup(&self, found: bool) {
        self.add(&self.lookup_count, 1);
        if !found {
            self.add(&self.lookup_misses, 1);
        }
    }

    /// Record a shard being scanned by a lookup
    pub fn record_shard_scanned(&self) {
        self.add(&self.shards_scanned, 1);
    }

    /// Record a lookup moving on to another year
    pub fn record_year_hop(&self) {
        self.add(&self.year_hops, 1);
    }

    /// Record the outcome of asset naming
    pub fn record_asset_named(&self, had_collisions: bool, reused: bool) {
        self.add(&self.assets_named, 1);
        if had_collisions {
            self.add(&self.collision_sets, 1);
        }
        if reused {
            self.add(&self.assets_reused, 1);
        }
    }

    /// Record asset naming aborted by the caller
    pub fn record_naming_aborted(&self) {
        self.add(&self.collision_sets, 1);
        self.add(&self.namings_aborted, 1);
    }

    /// Get the number of appends
    pub fn get_append_count(&self) -> usize {
        self.append_count.load(Ordering::Relaxed)
    }

    /// Get the total time spent appending
    pub fn get_write_duration(&self) -> Duration {
        Duration::from_nanos(self.write_duration_ns.load(Ordering::Relaxed))
    }

    /// Get the number of lookups
    pub fn get_lookup_count(&self) -> usize {
        self.lookup_count.load(Ordering::Relaxed)
    }

    /// Get uptime of the metrics collector
    pub fn get_uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Copy all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            appends: self.append_count.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            write_duration: self.get_write_duration(),
            shards_loaded: self.shards_loaded.load(Ordering::Relaxed),
            lookups: self.lookup_count.load(Ordering::Relaxed),
            lookup_misses: self.lookup_misses.load(Ordering::Relaxed),
            shards_scanned: self.shards_scanned.load(Ordering::Relaxed),
            year_hops: self.year_hops.load(Ordering::Relaxed),
            assets_named: self.assets_named.load(Ordering::Relaxed),
            collision_sets: self.collision_sets.load(Ordering::Relaxed),
            namings_aborted: self.namings_aborted.load(Ordering::Relaxed),
            assets_reused: self.assets_reused.load(Ordering::Relaxed),
        }
    }

    /// Reset all metrics
    pub fn reset(&self) {
        for counter in [
            &self.append_count,
            &self.bytes_written,
            &self.shards_loaded,
            &self.lookup_count,
            &self.lookup_misses,
            &self.shards_scanned,
            &self.year_hops,
            &self.assets_named,
            &self.collision_sets,
            &self.namings_aborted,
            &self.assets_reused,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
        self.write_duration_ns.store(0, Ordering::Relaxed);
    }

    /// Get a report of all metrics
    pub fn get_report(&self) -> String {
        let snapshot = self.snapshot();
        let mut report = String::new();

        report.push_str("=== Diary Metrics Report ===\n\n");
        report.push_str(&format!("Uptime: {:?}\n\n", self.get_uptime()));

        report.push_str("Store:\n");
        report.push_str(&format!("  Appends: {}\n", snapshot.appends));
        report.push_str(&format!("  Bytes Written: {}\n", snapshot.bytes_written));
        report.push_str(&format!("  Shards Loaded: {}\n", snapshot.shards_loaded));
        if snapshot.appends > 0 {
            let avg_write = snapshot.write_duration.as_micros() / snapshot.appends as u128;
            report.push_str(&format!("  Avg. Append Time: {}µs\n", avg_write));
        }

        report.push_str("\nLookups:\n");
        report.push_str(&format!("  Lookups: {}\n", snapshot.lookups));
        report.push_str(&format!("  Misses: {}\n", snapshot.lookup_misses));
        report.push_str(&format!("  Shards Scanned: {}\n", snapshot.shards_scanned));
        report.push_str(&format!("  Year Hops: {}\n", snapshot.year_hops));

        report.push_str("\nAssets:\n");
        report.push_str(&format!("  Named: {}\n", snapshot.assets_named));
        report.push_str(&format!("  Collision Sets: {}\n", snapshot.collision_sets));
        report.push_str(&format!("  Reused: {}\n", snapshot.assets_reused));
        report.push_str(&format!("  Aborted: {}\n", snapshot.namings_aborted));

        report
    }
}
