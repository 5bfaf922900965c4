//! Configuration for a backup run.
//!
//! Defaults can be kept in a TOML file in the user's config directory; command-line
//! flags win over the file, and built-in defaults fill whatever neither sets.
//!
//! ```toml
//! source = "~/Books/Exploded"
//! archive_suffix = "epub"
//! mirror_program = "/opt/homebrew/bin/rsync"
//! prune = true
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::backup::BackupOptions;
use crate::cli::Cli;
use crate::constants::{CONFIG_NAME, EPUB_SUFFIX, ICLOUD_BOOK_DIR, MIRROR_PROGRAM, PKG_NAME};
use crate::error::{BackupError, Result};
use crate::runner::RunOptions;

/// Settings read from the config file. Every key is optional.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Source directory.
    pub source: Option<PathBuf>,
    /// Extension of exploded archive directories.
    pub archive_suffix: Option<String>,
    /// Program used for the mirror copy.
    pub mirror_program: Option<String>,
    /// Prune by default.
    pub prune: bool,
    /// Force by default.
    pub force: bool,
}

impl Settings {
    /// Loads settings from `path`, or from the default config file when `path` is `None`.
    ///
    /// A missing default config file yields the defaults; a missing explicit one is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (file_path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (config_file(), false),
        };
        let toml_str = match fs::read_to_string(&file_path) {
            Ok(s) => s,
            Err(e) if e.kind() == io::ErrorKind::NotFound && !required => {
                return Ok(Settings::default());
            }
            Err(e) => return Err(BackupError::io(&file_path, e)),
        };
        toml::from_str(&toml_str).map_err(|e| BackupError::Config {
            path: file_path,
            message: e.to_string(),
        })
    }
}

/// Fully resolved configuration of one run.
#[derive(Debug, Clone)]
pub struct Config {
    pub source: PathBuf,
    pub dest: PathBuf,
    pub mirror_program: String,
    pub run: RunOptions,
}

impl Config {
    /// Merges command-line flags over `settings`.
    pub fn resolve(cli: Cli, settings: Settings) -> Self {
        let source = cli
            .source
            .or_else(|| settings.source.map(|p| expand_home(&p)))
            .unwrap_or_else(default_source);
        let backup = BackupOptions {
            force: cli.force || settings.force,
            verbose: cli.verbose,
            dry_run: cli.dry_run,
            archive_suffix: settings
                .archive_suffix
                .unwrap_or_else(|| EPUB_SUFFIX.to_string()),
        };
        Config {
            source,
            dest: cli.dest,
            mirror_program: settings
                .mirror_program
                .unwrap_or_else(|| MIRROR_PROGRAM.to_string()),
            run: RunOptions {
                backup,
                prune: cli.prune || settings.prune,
            },
        }
    }
}

/// Returns the absolute path to the configuration file.
pub fn config_file() -> PathBuf {
    config_dir().join(CONFIG_NAME)
}

/// Returns the configuration directory for the application, platform-specific.
#[cfg(not(target_os = "macos"))]
fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(PKG_NAME)
}

/// Returns the configuration directory for the application, platform-specific.
#[cfg(target_os = "macos")]
fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join(PKG_NAME)
}

/// The iCloud Books library of the current user.
pub fn default_source() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("~"))
        .join(ICLOUD_BOOK_DIR)
}

/// Replaces a leading `~` or `$HOME` with the user's home directory.
fn expand_home(path: &Path) -> PathBuf {
    let Some(home) = dirs::home_dir() else {
        return path.to_path_buf();
    };
    let Some(input) = path.to_str() else {
        return path.to_path_buf();
    };
    for prefix in ["~", "$HOME"] {
        if input == prefix {
            return home;
        }
        if let Some(rest) = input.strip_prefix(prefix).and_then(|r| r.strip_prefix('/')) {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}
