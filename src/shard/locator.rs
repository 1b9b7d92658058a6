//! Discovery of shard files
//!
//! The set of years is never cached: it is read from the directory on every
//! call, so files added or removed by hand are picked up immediately.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::Path;

use crate::shard::{ShardResult, ShardYear};
use crate::time::Direction;

/// List the years that have a shard file in `dir`.
///
/// Only file names of the form `<year>.<extension>` count, where the year is
/// digits with an optional leading minus. A directory that does not exist
/// holds no shards.
pub fn list_years(dir: &Path, extension: &str) -> ShardResult<BTreeSet<ShardYear>> {
    let read_dir = match fs::read_dir(dir) {
        Ok(read_dir) => read_dir,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeSet::new()),
        Err(e) => return Err(e.into()),
    };

    let mut years = BTreeSet::new();

    for dir_entry in read_dir {
        let dir_entry = dir_entry?;
        if !dir_entry.file_type()?.is_file() {
            continue;
        }

        let file_name = dir_entry.file_name();
        if let Some(year) = file_name.to_str().and_then(|name| year_of(name, extension)) {
            years.insert(year);
        }
    }

    Ok(years)
}

/// Find the closest year with a shard strictly before or after `target`
pub fn nearest_year(
    dir: &Path,
    extension: &str,
    target: ShardYear,
    direction: Direction,
) -> ShardResult<Option<ShardYear>> {
    let years = list_years(dir, extension)?;
    Ok(nearest_in(&years, target, direction))
}

/// Pick the closest year strictly before or after `target` from a set
pub fn nearest_in(
    years: &BTreeSet<ShardYear>,
    target: ShardYear,
    direction: Direction,
) -> Option<ShardYear> {
    match direction {
        Direction::Earlier => years.range(..target).next_back().copied(),
        Direction::Later => years
            .range((std::ops::Bound::Excluded(target), std::ops::Bound::Unbounded))
            .next()
            .copied(),
    }
}

fn year_of(file_name: &str, extension: &str) -> Option<ShardYear> {
    let stem = file_name.strip_suffix(extension)?.strip_suffix('.')?;
    let digits = stem.strip_prefix('-').unwrap_or(stem);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    stem.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    fn touch(dir: &Path, name: &str) -> io::Result<()> {
        File::create(dir.join(name)).map(|_| ())
    }

    #[test]
    fn test_year_of() {
        assert_eq!(year_of("2023.xml", "xml"), Some(2023));
        assert_eq!(year_of("0999.xml", "xml"), Some(999));
        assert_eq!(year_of("2023.XML", "xml"), None);
        assert_eq!(year_of("2023.xml.bak", "xml"), None);
        assert_eq!(year_of(".2023.xml.tmp", "xml"), None);
        assert_eq!(year_of("notes.xml", "xml"), None);
        assert_eq!(year_of("-5.xml", "xml"), Some(-5));
        assert_eq!(year_of("-.xml", "xml"), None);
        assert_eq!(year_of("--5.xml", "xml"), None);
        assert_eq!(year_of("+5.xml", "xml"), None);
        assert_eq!(year_of(".xml", "xml"), None);
        assert_eq!(year_of("2023xml", "xml"), None);
        assert_eq!(year_of("99999999999.xml", "xml"), None);
    }

    #[test]
    fn test_list_years() -> ShardResult<()> {
        let temp_dir = tempdir()?;
        let dir = temp_dir.path();

        for name in ["2021.xml", "2018.xml", "2020.xml", "notes.txt", "2019.txt", "2022.xml.bak"] {
            touch(dir, name)?;
        }
        fs::create_dir(dir.join("2017.xml"))?;

        let years = list_years(dir, "xml")?;
        assert_eq!(years.into_iter().collect::<Vec<_>>(), vec![2018, 2020, 2021]);

        Ok(())
    }

    #[test]
    fn test_missing_directory_is_empty() -> ShardResult<()> {
        let temp_dir = tempdir()?;
        let years = list_years(&temp_dir.path().join("XML"), "xml")?;
        assert!(years.is_empty());

        let nearest = nearest_year(&temp_dir.path().join("XML"), "xml", 2020, Direction::Earlier)?;
        assert_eq!(nearest, None);
        Ok(())
    }

    #[test]
    fn test_nearest_in_skips_gaps() {
        let years: BTreeSet<_> = [2018, 2021].into_iter().collect();

        assert_eq!(nearest_in(&years, 2021, Direction::Earlier), Some(2018));
        assert_eq!(nearest_in(&years, 2020, Direction::Earlier), Some(2018));
        assert_eq!(nearest_in(&years, 2018, Direction::Earlier), None);
        assert_eq!(nearest_in(&years, 2018, Direction::Later), Some(2021));
        assert_eq!(nearest_in(&years, 2019, Direction::Later), Some(2021));
        assert_eq!(nearest_in(&years, 2021, Direction::Later), None);
        assert_eq!(nearest_in(&BTreeSet::new(), 2021, Direction::Later), None);
    }

    #[test]
    fn test_nearest_year_reads_directory() -> ShardResult<()> {
        let temp_dir = tempdir()?;
        let dir = temp_dir.path();
        touch(dir, "2018.xml")?;
        touch(dir, "2021.xml")?;

        assert_eq!(nearest_year(dir, "xml", 2021, Direction::Earlier)?, Some(2018));

        // New files are seen without any refresh
        touch(dir, "2020.xml")?;
        assert_eq!(nearest_year(dir, "xml", 2021, Direction::Earlier)?, Some(2020));

        Ok(())
    }
}
