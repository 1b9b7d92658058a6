//! Nearest-entry lookup across shards
//!
//! A lookup first scans the shard of the query's own year. If nothing lies on
//! the requested side of the query there, it moves to the closest year with a
//! shard in that direction and scans again, until it finds an entry or runs
//! out of years. Years without a shard are skipped, however many there are.

use chrono::Datelike;
use tracing::{debug, trace};

use crate::entry::Entry;
use crate::error::{Error, Result};
use crate::shard::{nearest_year, Shard};
use crate::store::EntryStore;
use crate::time::{Direction, Timestamp};

/// Pick the entry closest to `bound` that lies strictly on the `direction`
/// side of it.
///
/// Entries are not assumed to be sorted. When several entries share the best
/// timestamp, the first one in stored order wins.
pub fn scan(shard: &Shard, bound: Timestamp, direction: Direction) -> Option<&Entry> {
    let mut best: Option<&Entry> = None;

    for entry in &shard.entries {
        if !direction.admits(&entry.timestamp, &bound) {
            continue;
        }
        match best {
            Some(current) if !direction.improves(&entry.timestamp, &current.timestamp) => {}
            _ => best = Some(entry),
        }
    }

    best
}

/// The closest entries on both sides of a point in time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Neighbours {
    /// Latest entry strictly before the point
    pub earlier: Option<(Timestamp, Entry)>,
    /// Earliest entry strictly after the point
    pub later: Option<(Timestamp, Entry)>,
}

/// Finds the entry nearest to a timestamp, looking into other years as needed
#[derive(Debug, Clone, Copy)]
pub struct NearestEntryResolver<'a> {
    store: &'a EntryStore,
}

impl<'a> NearestEntryResolver<'a> {
    /// Create a resolver over the shards of `store`
    pub fn new(store: &'a EntryStore) -> Self {
        Self { store }
    }

    /// Find the entry closest to `timestamp` strictly in `direction`.
    ///
    /// Returns the entry's timestamp together with the entry, or `None` if no
    /// shard holds an entry on that side.
    pub fn find(&self, timestamp: Timestamp, direction: Direction) -> Result<Option<(Timestamp, Entry)>> {
        let metrics = self.store.metrics();
        let mut year = timestamp.year();
        let mut shard = self.store.load_existing(year)?;

        loop {
            if let Some(shard) = &shard {
                metrics.record_shard_scanned();
                if let Some(entry) = scan(shard, timestamp, direction) {
                    trace!(year, found = %entry.timestamp, "Nearest entry found");
                    metrics.record_lookup(true);
                    return Ok(Some((entry.timestamp, entry.clone())));
                }
            }

            let next = nearest_year(self.store.shard_dir(), self.store.extension(), year, direction)
                .map_err(|e| Error::from_shard(e, self.store.shard_dir()))?;

            match next {
                Some(next) => {
                    debug!(from = year, to = next, %direction, "Looking in adjacent shard");
                    metrics.record_year_hop();
                    year = next;
                    shard = self.store.load_existing(year)?;
                }
                None => {
                    metrics.record_lookup(false);
                    return Ok(None);
                }
            }
        }
    }

    /// Find the closest entries before and after `timestamp`
    pub fn neighbours(&self, timestamp: Timestamp) -> Result<Neighbours> {
        Ok(Neighbours {
            earlier: self.find(timestamp, Direction::Earlier)?,
            later: self.find(timestamp, Direction::Later)?,
        })
    }
}
