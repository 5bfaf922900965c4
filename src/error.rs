//! Error type shared by every stage of a backup run.

use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use thiserror::Error;

/// Unified result type for all fallible operations in bochord.
pub type Result<T> = std::result::Result<T, BackupError>;

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("failed to write archive {}: {source}", .path.display())]
    Zip {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("mirror copy of {} exited with {status}", .path.display())]
    MirrorFailed { path: PathBuf, status: ExitStatus },

    #[error("failed to start mirror program '{program}': {source}")]
    MirrorSpawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("source path '{}' is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("invalid config file {}: {message}", .path.display())]
    Config { path: PathBuf, message: String },

    #[error("failed to write progress output: {0}")]
    Report(#[source] io::Error),
}

impl BackupError {
    /// Wraps an I/O error with the path it happened on.
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        BackupError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub(crate) fn zip(path: impl AsRef<Path>, source: zip::result::ZipError) -> Self {
        BackupError::Zip {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}
