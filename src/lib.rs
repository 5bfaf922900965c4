//! bochord: back up an Apple Books library to usable ePubs.
//!
//! iCloud keeps ePubs exploded on disk, one directory per book. Each such directory is
//! re-packed into a single archive at the destination, but only when something in it is
//! newer than the archive already there. Everything else in the library is mirrored with
//! rsync, and destination entries that vanished from the source can be pruned.

pub mod archive;
pub mod backup;
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod mirror;
pub mod mtime;
pub mod report;
pub mod runner;
pub mod scan;
pub mod sysexits;

pub use error::{BackupError, Result};
