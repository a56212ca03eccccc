//! Defaults applied when a request does not configure a value.

/// Content types accepted when no allow-list is configured.
pub const DEFAULT_ALLOWED_TYPES: [&str; 4] = ["jpeg", "png", "gif", "jpg"];

/// Storage directory used when none is configured.
pub const DEFAULT_STORAGE_DIR: &str = "images";

/// Permission bits for storage directories created by the pipeline.
pub const DEFAULT_DIR_MODE: u32 = 0o755;

/// Permission bits given to stored files.
pub const DEFAULT_FILE_MODE: u32 = 0o644;

/// Number of leading bytes read when sniffing a file's type.
pub const SNIFF_LEN: usize = 4096;
