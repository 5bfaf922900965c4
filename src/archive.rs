//! Re-packing exploded ePub directories into zip archives.
//!
//! A new archive is written to a staging file beside the destination and renamed
//! over it only after the zip has been finalized and synced. The staging file is a
//! [`NamedTempFile`], so every early return removes it and leaves the previous
//! archive untouched.

use std::fs::{self, File};
use std::io::{self, BufReader, Write};
use std::path::{Component, Path, PathBuf};

use chrono::{Datelike, Local, TimeZone, Timelike};
use filetime::FileTime;
use tempfile::{Builder, NamedTempFile};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::constants::{DEFLATE_LEVEL, MIMETYPE};
use crate::error::{BackupError, Result};

/// Builds `dest` from `files`, naming each entry by its path relative to `src_root`.
///
/// A root-level `mimetype` is written first; the rest keep the order given.
///
/// # Errors
/// Returns an error if any file cannot be read or the archive cannot be written or
/// moved into place. `dest` is left as it was in that case.
pub fn build(dest: &Path, src_root: &Path, files: &[PathBuf]) -> Result<()> {
    let mut staging = staging_file(dest)?;
    let staging_path = staging.path().to_path_buf();

    let mut zip = ZipWriter::new(staging.as_file_mut());
    for path in order_entries(src_root, files) {
        let name = entry_name(src_root, path)?;
        debug!(entry = %name, "adding {}", path.display());
        add_entry(&mut zip, &name, path).map_err(|e| match e {
            AddError::Io(e) => BackupError::io(path, e),
            AddError::Zip(e) => BackupError::zip(&staging_path, e),
        })?;
    }
    let file = zip
        .finish()
        .map_err(|e| BackupError::zip(&staging_path, e))?;
    file.flush().map_err(|e| BackupError::io(&staging_path, e))?;
    file.sync_all()
        .map_err(|e| BackupError::io(&staging_path, e))?;

    keep_previous_permissions(dest, &staging_path)?;
    staging
        .persist(dest)
        .map_err(|e| BackupError::io(dest, e.error))?;
    Ok(())
}

/// Creates the staging file next to `dest`.
///
/// `Book.epub` stages as `.Book.<random>.epub_new`, which can never be mistaken for an archive.
fn staging_file(dest: &Path) -> Result<NamedTempFile> {
    let parent = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let stem = dest
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let suffix = match dest.extension() {
        Some(ext) => format!(".{}_new", ext.to_string_lossy()),
        None => ".new".to_string(),
    };
    let prefix = format!(".{stem}.");
    let mut builder = Builder::new();
    builder.prefix(&prefix).suffix(&suffix);
    // Created like any other new file: 0666 less the umask.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    builder
        .tempfile_in(parent)
        .map_err(|e| BackupError::io(parent, e))
}

/// Moves the root-level `mimetype` to the front, keeping everything else in order.
fn order_entries<'a>(src_root: &Path, files: &'a [PathBuf]) -> Vec<&'a PathBuf> {
    let root_mimetype = src_root.join(MIMETYPE);
    let (mut ordered, rest): (Vec<_>, Vec<_>) =
        files.iter().partition(|path| **path == root_mimetype);
    ordered.extend(rest);
    ordered
}

/// Zip entry name for `path`: relative to `src_root`, `/`-separated.
fn entry_name(src_root: &Path, path: &Path) -> Result<String> {
    let rel = path.strip_prefix(src_root).map_err(|_| {
        BackupError::io(
            path,
            io::Error::new(io::ErrorKind::InvalidInput, "file is outside the ePub directory"),
        )
    })?;
    let mut parts = Vec::new();
    for component in rel.components() {
        if let Component::Normal(part) = component {
            let part = part.to_str().ok_or_else(|| {
                BackupError::io(
                    path,
                    io::Error::new(io::ErrorKind::InvalidInput, "file name is not valid UTF-8"),
                )
            })?;
            parts.push(part);
        }
    }
    Ok(parts.join("/"))
}

enum AddError {
    Io(io::Error),
    Zip(zip::result::ZipError),
}

impl From<io::Error> for AddError {
    fn from(e: io::Error) -> Self {
        AddError::Io(e)
    }
}

impl From<zip::result::ZipError> for AddError {
    fn from(e: zip::result::ZipError) -> Self {
        AddError::Zip(e)
    }
}

fn add_entry<W: io::Write + io::Seek>(
    zip: &mut ZipWriter<W>,
    name: &str,
    path: &Path,
) -> std::result::Result<(), AddError> {
    let file = File::open(path)?;
    let metadata = file.metadata()?;
    let options = entry_options(path, &metadata);
    zip.start_file(name, options)?;
    let mut reader = BufReader::new(file);
    io::copy(&mut reader, zip)?;
    Ok(())
}

fn entry_options(path: &Path, metadata: &fs::Metadata) -> SimpleFileOptions {
    let is_mimetype = path.file_name().is_some_and(|name| name == MIMETYPE);
    let options = if is_mimetype {
        SimpleFileOptions::default().compression_method(CompressionMethod::Stored)
    } else {
        SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(DEFLATE_LEVEL))
    };
    let options = options.last_modified_time(dos_time(FileTime::from_last_modification_time(
        metadata,
    )));

    #[cfg(unix)]
    let options = {
        use std::os::unix::fs::PermissionsExt;
        options.unix_permissions(metadata.permissions().mode() & 0o777)
    };
    options
}

/// Converts a file mtime into the local-time DOS timestamp stored in the zip.
fn dos_time(mtime: FileTime) -> DateTime {
    Local
        .timestamp_opt(mtime.unix_seconds(), mtime.nanoseconds())
        .earliest()
        .and_then(|t| {
            DateTime::from_date_and_time(
                u16::try_from(t.year()).ok()?,
                t.month() as u8,
                t.day() as u8,
                t.hour() as u8,
                t.minute() as u8,
                t.second() as u8,
            )
            .ok()
        })
        .unwrap_or_default()
}

/// Carries the mode of the archive being replaced over to its successor.
fn keep_previous_permissions(dest: &Path, staging_path: &Path) -> Result<()> {
    let previous = match fs::metadata(dest) {
        Ok(metadata) => metadata.permissions(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(BackupError::io(dest, e)),
    };
    fs::set_permissions(staging_path, previous).map_err(|e| BackupError::io(staging_path, e))
}
