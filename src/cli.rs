//! Command-line interface definition for bochord.

use std::path::PathBuf;

use clap::Parser;

/// Backup books from macOS Books to usable ePubs.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None, override_usage = "bochord [OPTIONS] <backup_path>")]
pub struct Cli {
    /// Force re-archive even if no file updates.
    #[arg(short, long)]
    pub force: bool,
    /// Be verbose.
    #[arg(short, long)]
    pub verbose: bool,
    /// Prune documents from destination if missing from source.
    #[arg(short, long)]
    pub prune: bool,
    /// Source directory (default: the iCloud Books library).
    #[arg(short, long)]
    pub source: Option<PathBuf>,
    /// Config file (default: bochord/config.toml in the user config directory).
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Show what would be archived, copied and pruned without changing anything.
    #[arg(long)]
    pub dry_run: bool,
    /// Backup destination path.
    #[arg(value_name = "backup_path")]
    pub dest: PathBuf,
}
