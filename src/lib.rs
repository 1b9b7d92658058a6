//! # diary_rs
//!
//! Storage core of a personal diary. Entries are kept in one XML document per
//! calendar year; photos are copied next to them under names derived from
//! their capture time.
//!
//! ```no_run
//! use diary_rs::{Diary, Direction, Entry};
//! use chrono::NaiveDate;
//!
//! # fn main() -> diary_rs::Result<()> {
//! let diary = Diary::open("/home/me/Diary")?;
//! let now = NaiveDate::from_ymd_opt(2023, 5, 1).unwrap().and_hms_opt(10, 0, 0).unwrap();
//! diary.append(&Entry::text(now, "hello"))?;
//!
//! if let Some((at, entry)) = diary.find_nearest(now, Direction::Earlier)? {
//!     println!("{}: {}", at, entry.preview(40));
//! }
//! # Ok(())
//! # }
//! ```

pub mod asset;
pub mod config;
pub mod diary;
pub mod entry;
pub mod error;
pub mod metrics;
pub mod resolver;
pub mod shard;
pub mod store;
pub mod time;

pub use asset::{AssetName, CollisionChoice, CollisionResolver};
pub use config::{CollisionPolicy, DiaryConfig, SessionFile};
pub use diary::Diary;
pub use entry::{Entry, EntryKind};
pub use error::{Error, Result};
pub use metrics::{DiaryMetrics, MetricsSnapshot};
pub use resolver::{NearestEntryResolver, Neighbours};
pub use shard::{Shard, ShardError, ShardResult, ShardYear};
pub use store::EntryStore;
pub use time::{Direction, Timestamp};
