//! Staleness scanning of exploded ePub directories.

use std::path::{Path, PathBuf};

use filetime::FileTime;
use walkdir::WalkDir;

use crate::error::Result;
use crate::mtime;

/// Outcome of scanning one exploded ePub directory.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ScanResult {
    /// Whether the archive has to be rebuilt.
    pub needs_rebuild: bool,
    /// Every regular file under the directory, in lexicographic order.
    /// Empty when no rebuild is needed.
    pub files: Vec<PathBuf>,
    /// Newest normalized mtime seen, if the directory holds any file.
    pub newest: Option<FileTime>,
}

/// Walks `src_dir` and decides whether the archive stamped `reference` is out of date.
///
/// Every file is passed through [`mtime::normalize`], so a scan may touch files whose
/// timestamps zip cannot store. A missing `reference` (no archive yet) always needs a
/// rebuild, even when the directory holds no files.
///
/// # Errors
/// Returns an error if the walk fails or a file cannot be stat'ed or touched.
pub fn scan(src_dir: &Path, reference: Option<FileTime>, force: bool) -> Result<ScanResult> {
    let mut files = vec![];
    let mut newest: Option<FileTime> = None;
    let mut stale = false;

    for entry in WalkDir::new(src_dir).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_dir() || !entry.path().is_file() {
            continue;
        }
        let path = entry.into_path();
        let file_mtime = mtime::normalize(&path)?;
        if reference.is_some_and(|archive_mtime| file_mtime > archive_mtime) {
            stale = true;
        }
        newest = newest.max(Some(file_mtime));
        files.push(path);
    }

    let needs_rebuild = force || stale || reference.is_none();
    if !needs_rebuild {
        files.clear();
    }
    Ok(ScanResult {
        needs_rebuild,
        files,
        newest,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn book(mtime: i64) -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("OEBPS/Text")).unwrap();
        for name in ["mimetype", "OEBPS/content.opf", "OEBPS/Text/ch1.xhtml"] {
            let path = root.join(name);
            fs::write(&path, name).unwrap();
            filetime::set_file_mtime(&path, FileTime::from_unix_time(mtime, 0)).unwrap();
        }
        temp_dir
    }

    #[test]
    fn test_scan_without_archive_rebuilds() -> Result<()> {
        let dir = book(1_600_000_000);
        let result = scan(dir.path(), None, false)?;
        assert!(result.needs_rebuild);
        let rel: Vec<_> = result
            .files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            rel,
            vec![
                PathBuf::from("OEBPS/Text/ch1.xhtml"),
                PathBuf::from("OEBPS/content.opf"),
                PathBuf::from("mimetype"),
            ]
        );
        assert_eq!(result.newest, Some(FileTime::from_unix_time(1_600_000_000, 0)));
        Ok(())
    }

    #[test]
    fn test_scan_up_to_date() -> Result<()> {
        let dir = book(1_600_000_000);
        let reference = Some(FileTime::from_unix_time(1_700_000_000, 0));
        let result = scan(dir.path(), reference, false)?;
        assert!(!result.needs_rebuild);
        assert!(result.files.is_empty());
        Ok(())
    }

    #[test]
    fn test_scan_equal_mtime_is_not_stale() -> Result<()> {
        let dir = book(1_600_000_000);
        let reference = Some(FileTime::from_unix_time(1_600_000_000, 0));
        assert!(!scan(dir.path(), reference, false)?.needs_rebuild);
        Ok(())
    }

    #[test]
    fn test_scan_one_newer_file_rebuilds_everything() -> Result<()> {
        let dir = book(1_600_000_000);
        let touched = dir.path().join("OEBPS/content.opf");
        filetime::set_file_mtime(&touched, FileTime::from_unix_time(1_800_000_000, 0)).unwrap();

        let reference = Some(FileTime::from_unix_time(1_700_000_000, 0));
        let result = scan(dir.path(), reference, false)?;
        assert!(result.needs_rebuild);
        assert_eq!(result.files.len(), 3);
        assert_eq!(result.newest, Some(FileTime::from_unix_time(1_800_000_000, 0)));
        Ok(())
    }

    #[test]
    fn test_scan_force() -> Result<()> {
        let dir = book(1_600_000_000);
        let reference = Some(FileTime::from_unix_time(1_700_000_000, 0));
        let result = scan(dir.path(), reference, true)?;
        assert!(result.needs_rebuild);
        assert_eq!(result.files.len(), 3);
        Ok(())
    }

    #[test]
    fn test_scan_normalizes_ancient_files() -> Result<()> {
        let dir = book(0);
        let reference = Some(FileTime::from_unix_time(1_000_000_000, 0));
        let result = scan(dir.path(), reference, false)?;
        // Touched files are now newer than any archive written before the scan.
        assert!(result.needs_rebuild);
        for file in &result.files {
            assert!(mtime::modified(file)? >= mtime::zip_mtime_floor());
        }
        Ok(())
    }

    #[test]
    fn test_scan_empty_directory() -> Result<()> {
        let dir = TempDir::new().unwrap();
        let fresh = scan(dir.path(), None, false)?;
        assert!(fresh.needs_rebuild);
        assert!(fresh.files.is_empty());
        assert_eq!(fresh.newest, None);

        let existing = scan(dir.path(), Some(FileTime::now()), false)?;
        assert!(!existing.needs_rebuild);
        Ok(())
    }
}
