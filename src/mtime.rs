//! Modification-time helpers.
//!
//! Zip entries carry DOS timestamps, which cannot represent anything before 1980.
//! Files synced from iCloud occasionally come back with a zero or otherwise bogus
//! mtime, so before a file is compared or archived its timestamp is lifted to
//! "now" when it falls below [`ZIP_MTIME_MIN`].

use std::fs;
use std::io;
use std::path::Path;

use filetime::FileTime;
use tracing::info;

use crate::constants::ZIP_MTIME_MIN;
use crate::error::{BackupError, Result};

/// The lowest timestamp an archived file may carry.
pub fn zip_mtime_floor() -> FileTime {
    FileTime::from_unix_time(ZIP_MTIME_MIN, 0)
}

/// Returns the file's modification time, touching the file first if zip tools would reject it.
///
/// # Errors
/// Returns an error if the file cannot be stat'ed or its mtime cannot be updated.
pub fn normalize(path: &Path) -> Result<FileTime> {
    let mtime = modified(path)?;
    if mtime >= zip_mtime_floor() {
        return Ok(mtime);
    }

    info!(path = %path.display(), "updating mtime for zip compatibility");
    filetime::set_file_mtime(path, FileTime::now()).map_err(|e| BackupError::io(path, e))?;
    modified(path)
}

/// Returns the modification time of `path`, following symlinks.
pub fn modified(path: &Path) -> Result<FileTime> {
    let metadata = fs::metadata(path).map_err(|e| BackupError::io(path, e))?;
    Ok(FileTime::from_last_modification_time(&metadata))
}

/// Returns the modification time of `path`, or `None` if nothing exists there yet.
pub fn modified_if_exists(path: &Path) -> Result<Option<FileTime>> {
    match fs::metadata(path) {
        Ok(metadata) => Ok(Some(FileTime::from_last_modification_time(&metadata))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(BackupError::io(path, e)),
    }
}
