//! Mirror copy of entries that are not exploded ePubs.

use std::path::Path;
use std::process::Command;

use tracing::debug;

use crate::constants::MIRROR_PROGRAM;
use crate::error::{BackupError, Result};

/// Copies a file or directory tree into a destination directory, preserving attributes.
pub trait MirrorCopy {
    /// Mirrors `src` into `dest_dir`, so the copy ends up at `dest_dir/<name of src>`.
    fn mirror(&self, src: &Path, dest_dir: &Path, verbose: bool) -> Result<()>;
}

/// Delegates to `rsync -aP`.
#[derive(Debug, Clone)]
pub struct Rsync {
    program: String,
}

impl Rsync {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for Rsync {
    fn default() -> Self {
        Self::new(MIRROR_PROGRAM)
    }
}

impl MirrorCopy for Rsync {
    fn mirror(&self, src: &Path, dest_dir: &Path, verbose: bool) -> Result<()> {
        let verbosity = if verbose { "-v" } else { "-q" };
        debug!(program = %self.program, "mirroring {}", src.display());
        let status = Command::new(&self.program)
            .arg("-aP")
            .arg(verbosity)
            .arg(src)
            .arg(dest_dir)
            .status()
            .map_err(|source| BackupError::MirrorSpawn {
                program: self.program.clone(),
                source,
            })?;
        if !status.success() {
            return Err(BackupError::MirrorFailed {
                path: src.to_path_buf(),
                status,
            });
        }
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_mirror_success_status() {
        let rsync = Rsync::new("true");
        assert!(rsync.mirror(Path::new("notes.txt"), Path::new("dest"), false).is_ok());
    }

    #[test]
    fn test_mirror_failure_status() {
        let rsync = Rsync::new("false");
        let res = rsync.mirror(Path::new("notes.txt"), Path::new("dest"), true);
        assert!(matches!(res, Err(BackupError::MirrorFailed { .. })));
    }

    #[test]
    fn test_mirror_missing_program() {
        let rsync = Rsync::new("bochord-no-such-program");
        let res = rsync.mirror(Path::new("notes.txt"), Path::new("dest"), false);
        match res {
            Err(BackupError::MirrorSpawn { program, .. }) => {
                assert_eq!(program, "bochord-no-such-program")
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
