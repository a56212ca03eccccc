//! Constants used throughout the uploadimg core crate.
//!
//! Pipeline defaults (storage directory, directory mode, allow-list) live in
//! `uploadimg_files` and are re-exported here so callers only need one import.

pub use uploadimg_files::{
    DEFAULT_ALLOWED_TYPES, DEFAULT_DIR_MODE, DEFAULT_FILE_MODE, DEFAULT_STORAGE_DIR,
};

/// Default bind address for the REST server.
pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:3000";

/// Largest upload accepted by the server, in bytes, when no limit is configured.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 1_000_000;

/// Form field carrying the uploaded file when no field name is configured.
pub const DEFAULT_FIELD_NAME: &str = "pictures";

/// Largest permission value accepted for storage directories.
pub const MAX_DIR_MODE: u32 = 0o7777;
