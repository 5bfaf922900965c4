/// Package name.
pub(crate) const PKG_NAME: &str = env!("CARGO_PKG_NAME");
/// Default configuration file name.
pub(crate) const CONFIG_NAME: &str = "config.toml";
/// Suffix of exploded ePub directories and of the archives built from them.
pub const EPUB_SUFFIX: &str = "epub";
/// Name of the entry that must be stored uncompressed at the front of an ePub.
pub const MIMETYPE: &str = "mimetype";
/// Oldest modification time (seconds since the Unix epoch) zip tools accept.
/// One day after 1980-01-01 so local timezone offsets cannot push it below the DOS epoch.
pub const ZIP_MTIME_MIN: i64 = 315_644_400;
/// Deflate level used for every entry except `mimetype`.
pub(crate) const DEFLATE_LEVEL: i64 = 9;
/// Default mirror-copy program.
pub(crate) const MIRROR_PROGRAM: &str = "rsync";
/// Where iCloud keeps the Books library, relative to the home directory.
pub(crate) const ICLOUD_BOOK_DIR: &str = "Library/Mobile Documents/iCloud~com~apple~iBooks/Documents";
