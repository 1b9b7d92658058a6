//! Writes a few entries into a throwaway diary and walks through them.
//!
//! Run with `RUST_LOG=debug` to see what the store does.

use chrono::NaiveDate;
use diary_rs::{CollisionPolicy, Diary, DiaryConfig, Direction, Entry, SessionFile};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let workspace = tempfile::tempdir()?;
    let root = workspace.path().join("Diary");

    let config = DiaryConfig::new(&root)
        .with_collision_policy(CollisionPolicy::CreateNew)
        .with_sync_writes(false);
    println!("{}", config.to_string_pretty());

    let diary = Diary::with_config(config)?;

    let at = |y, mo, d, h, mi| {
        NaiveDate::from_ymd_opt(y, mo, d)
            .and_then(|date| date.and_hms_opt(h, mi, 0))
            .ok_or_else(|| anyhow::anyhow!("invalid date"))
    };

    diary.append(&Entry::text(at(2021, 12, 24, 18, 0)?, "Christmas eve.\nSnow, finally."))?;
    diary.append(&Entry::text(at(2023, 5, 1, 10, 0)?, "hello"))?;

    let photo = workspace.path().join("IMG_20230501_110000.jpg");
    std::fs::write(&photo, b"not really a jpeg")?;
    if let Some(entry) = diary.import_photo_with_policy(&photo, None, "At the lake")? {
        println!("Imported {:?}", entry.asset_ref());
    }

    println!("Years: {:?}", diary.years()?);

    // 2022 has no shard; both lookups jump over it
    let query = at(2022, 6, 1, 12, 0)?;
    for direction in [Direction::Earlier, Direction::Later] {
        match diary.find_nearest(query, direction)? {
            Some((when, entry)) => println!(
                "{} entry: {} - {}",
                direction,
                diary_rs::time::display_timestamp(&when),
                entry.preview(30)
            ),
            None => println!("No {} entry", direction),
        }
    }

    let session = SessionFile::new(workspace.path().join("session.json"));
    session.save(&root)?;
    println!("Last diary: {:?}", session.load()?);

    println!("{}", diary.metrics().get_report());

    Ok(())
}
