//! Driving a whole backup run: every top-level entry in order, then the optional prune.

use std::collections::BTreeSet;
use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::backup::{self, BackupOptions, Outcome};
use crate::error::{BackupError, Result};
use crate::mirror::MirrorCopy;
use crate::report::Reporter;

/// Options for [`run`].
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub backup: BackupOptions,
    /// Delete destination entries that are no longer in the source.
    pub prune: bool,
}

/// Result of backing up one top-level entry.
#[derive(Debug)]
pub struct EntryReport {
    pub name: String,
    pub result: Result<Outcome>,
}

/// What a run did.
#[derive(Debug, Default)]
pub struct RunReport {
    pub entries: Vec<EntryReport>,
    /// Destination entries removed (or that would be, in a dry run).
    pub pruned: Vec<PathBuf>,
    pub prune_failures: Vec<(PathBuf, BackupError)>,
}

impl RunReport {
    pub fn updated(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(&e.result, Ok(outcome) if outcome.is_updated()))
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &BackupError)> {
        self.entries
            .iter()
            .filter_map(|e| e.result.as_ref().err().map(|err| (e.name.as_str(), err)))
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some() || !self.prune_failures.is_empty()
    }
}

/// Backs up every top-level entry of `source` into `dest`, then prunes if asked.
///
/// A failing entry is recorded in the report and the run moves on to the next one.
///
/// # Errors
/// Returns an error only if `source` cannot be listed, `dest` cannot be created or
/// listed for pruning, or progress cannot be written.
pub fn run<W: Write>(
    source: &Path,
    dest: &Path,
    opts: &RunOptions,
    mirror: &dyn MirrorCopy,
    reporter: &mut Reporter<W>,
) -> Result<RunReport> {
    let entries = list_entries(source)?;
    if !opts.backup.dry_run {
        fs::create_dir_all(dest).map_err(|e| BackupError::io(dest, e))?;
    }

    let mut report = RunReport::default();
    for entry in &entries {
        let name = entry
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let result = backup::backup_entry(entry, dest, &opts.backup, mirror);
        if let Err(e) = &result {
            warn!(entry = %name, "backup failed: {e}");
        }
        reporter.entry(&name, &result).map_err(BackupError::Report)?;
        report.entries.push(EntryReport { name, result });
    }
    reporter.finish().map_err(BackupError::Report)?;

    if opts.prune {
        let source_names: BTreeSet<OsString> = entries
            .iter()
            .filter_map(|p| p.file_name().map(|n| n.to_os_string()))
            .collect();
        if source_names.is_empty() {
            warn!(source = %source.display(), "source is empty, refusing to prune");
        } else {
            prune(&source_names, dest, opts.backup.dry_run, reporter, &mut report)?;
        }
    }

    reporter
        .summary(report.failures())
        .map_err(BackupError::Report)?;
    Ok(report)
}

/// Lists the immediate children of `dir`, sorted by name.
pub fn list_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(BackupError::NotADirectory(dir.to_path_buf()));
    }
    let mut entries = fs::read_dir(dir)
        .map_err(|e| BackupError::io(dir, e))?
        .map(|entry| entry.map(|e| e.path()).map_err(|e| BackupError::io(dir, e)))
        .collect::<Result<Vec<_>>>()?;
    entries.sort();
    Ok(entries)
}

/// Destination entries whose names do not appear among `source_names`. Top level only.
pub fn prune_set(source_names: &BTreeSet<OsString>, dest: &Path) -> Result<Vec<PathBuf>> {
    if !dest.exists() {
        return Ok(vec![]);
    }
    Ok(list_entries(dest)?
        .into_iter()
        .filter(|path| {
            path.file_name()
                .is_some_and(|name| !source_names.contains(name))
        })
        .collect())
}

fn prune<W: Write>(
    source_names: &BTreeSet<OsString>,
    dest: &Path,
    dry_run: bool,
    reporter: &mut Reporter<W>,
    report: &mut RunReport,
) -> Result<()> {
    let extra = prune_set(source_names, dest)?;
    debug!(count = extra.len(), "pruning {}", dest.display());
    for path in extra {
        let removed = if dry_run { Ok(()) } else { remove_entry(&path) };
        match removed {
            Ok(()) => {
                reporter.removed(&path).map_err(BackupError::Report)?;
                report.pruned.push(path);
            }
            Err(e) => {
                reporter
                    .remove_failed(&path, &e)
                    .map_err(BackupError::Report)?;
                report.prune_failures.push((path, e));
            }
        }
    }
    Ok(())
}

fn remove_entry(path: &Path) -> Result<()> {
    let metadata = fs::symlink_metadata(path).map_err(|e| BackupError::io(path, e))?;
    let removed = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    removed.map_err(|e| BackupError::io(path, e))
}
