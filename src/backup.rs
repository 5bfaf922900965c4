//! Backup of a single top-level library entry.

use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::Path;

use filetime::FileTime;
use tracing::debug;

use crate::archive;
use crate::constants::EPUB_SUFFIX;
use crate::error::{BackupError, Result};
use crate::mirror::MirrorCopy;
use crate::mtime;
use crate::scan;

/// How a top-level source entry is backed up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A directory holding the unpacked contents of an ePub.
    ExplodedArchive,
    /// Anything else; mirrored as is.
    Other,
}

impl EntryKind {
    /// Classifies `path`. Only directories whose extension is exactly `suffix` are exploded archives.
    pub fn classify(path: &Path, suffix: &str) -> Result<Self> {
        if path.extension() != Some(OsStr::new(suffix)) {
            return Ok(EntryKind::Other);
        }
        let metadata = fs::metadata(path).map_err(|e| BackupError::io(path, e))?;
        if metadata.is_dir() {
            Ok(EntryKind::ExplodedArchive)
        } else {
            Ok(EntryKind::Other)
        }
    }
}

/// What happened to an entry that needed work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// The exploded directory was packed into a fresh archive.
    Built,
    /// The entry was handed to the mirror copy.
    Copied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Updated(Action),
    Skipped,
}

impl Outcome {
    pub fn is_updated(&self) -> bool {
        matches!(self, Outcome::Updated(_))
    }
}

/// Options that apply to every entry of a run.
#[derive(Debug, Clone)]
pub struct BackupOptions {
    /// Rebuild and copy even when nothing changed.
    pub force: bool,
    /// Passed on to the mirror copy.
    pub verbose: bool,
    /// Decide what would happen without writing anything.
    pub dry_run: bool,
    /// Extension that marks exploded archive directories.
    pub archive_suffix: String,
}

impl Default for BackupOptions {
    fn default() -> Self {
        Self {
            force: false,
            verbose: false,
            dry_run: false,
            archive_suffix: EPUB_SUFFIX.to_string(),
        }
    }
}

/// Backs up one top-level source entry into `dest_dir`.
///
/// Exploded archives are rebuilt into `dest_dir/<name>` when any file is newer than the
/// existing archive. Other entries are mirrored when their own mtime is newer than the
/// destination's.
///
/// # Errors
/// Returns an error if the entry cannot be inspected, scanned, archived or copied.
pub fn backup_entry(
    entry: &Path,
    dest_dir: &Path,
    opts: &BackupOptions,
    mirror: &dyn MirrorCopy,
) -> Result<Outcome> {
    let name = entry.file_name().ok_or_else(|| {
        BackupError::io(
            entry,
            io::Error::new(io::ErrorKind::InvalidInput, "entry has no file name"),
        )
    })?;
    let dest = dest_dir.join(name);

    match EntryKind::classify(entry, &opts.archive_suffix)? {
        EntryKind::ExplodedArchive => backup_exploded(entry, &dest, opts),
        EntryKind::Other => backup_other(entry, &dest, dest_dir, opts, mirror),
    }
}

fn backup_exploded(src_dir: &Path, dest: &Path, opts: &BackupOptions) -> Result<Outcome> {
    let archive_mtime = mtime::modified_if_exists(dest)?;
    let scanned = scan::scan(src_dir, archive_mtime, opts.force)?;
    if !scanned.needs_rebuild {
        return Ok(Outcome::Skipped);
    }
    debug!(files = scanned.files.len(), "archiving {}", src_dir.display());
    if !opts.dry_run {
        archive::build(dest, src_dir, &scanned.files)?;
        // The archive must not be older than any file in it; the kernel's own write
        // stamp can lag FileTime::now() used by the normalizer.
        let now = FileTime::now();
        let stamp = scanned.newest.map_or(now, |newest| newest.max(now));
        filetime::set_file_mtime(dest, stamp).map_err(|e| BackupError::io(dest, e))?;
    }
    Ok(Outcome::Updated(Action::Built))
}

fn backup_other(
    src: &Path,
    dest: &Path,
    dest_dir: &Path,
    opts: &BackupOptions,
    mirror: &dyn MirrorCopy,
) -> Result<Outcome> {
    let src_mtime = mtime::modified(src)?;
    let newer = match mtime::modified_if_exists(dest)? {
        Some(dest_mtime) => src_mtime > dest_mtime,
        None => true,
    };
    if !opts.force && !newer {
        return Ok(Outcome::Skipped);
    }
    if !opts.dry_run {
        mirror.mirror(src, dest_dir, opts.verbose)?;
    }
    Ok(Outcome::Updated(Action::Copied))
}
