//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. The intent is to avoid reading process-wide environment variables
//! during request handling, which can lead to inconsistent behaviour in multi-threaded runtimes
//! and test harnesses.
//!
//! The `*_from_env_value` helpers take the raw value of one variable, so binaries do the
//! `std::env::var` lookups and everything here stays testable.

use crate::constants::{
    DEFAULT_ALLOWED_TYPES, DEFAULT_DIR_MODE, DEFAULT_FIELD_NAME, DEFAULT_MAX_UPLOAD_BYTES,
    DEFAULT_STORAGE_DIR, MAX_DIR_MODE,
};
use crate::{ConfigError, ConfigResult};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    storage_dir: PathBuf,
    dir_mode: u32,
    allowed_types: Vec<String>,
    max_upload_bytes: u64,
    field_name: String,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    pub fn new(
        storage_dir: PathBuf,
        dir_mode: u32,
        allowed_types: Vec<String>,
        max_upload_bytes: u64,
        field_name: String,
    ) -> ConfigResult<Self> {
        if storage_dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidInput(
                "storage_dir cannot be empty".into(),
            ));
        }

        if dir_mode > MAX_DIR_MODE {
            return Err(ConfigError::DirModeOutOfRange(dir_mode));
        }

        if allowed_types.is_empty() || allowed_types.iter().any(|t| t.trim().is_empty()) {
            return Err(ConfigError::InvalidInput(
                "allowed_types must list at least one non-empty type".into(),
            ));
        }

        if max_upload_bytes == 0 {
            return Err(ConfigError::InvalidInput(
                "max_upload_bytes must be greater than zero".into(),
            ));
        }

        if field_name.trim().is_empty() {
            return Err(ConfigError::InvalidInput(
                "field_name cannot be empty".into(),
            ));
        }

        Ok(Self {
            storage_dir,
            dir_mode,
            allowed_types,
            max_upload_bytes,
            field_name,
        })
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    /// Permission bits for storage directories the pipeline creates.
    pub fn dir_mode(&self) -> u32 {
        self.dir_mode
    }

    pub fn allowed_types(&self) -> &[String] {
        &self.allowed_types
    }

    /// Server-side upload size limit in bytes.
    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_bytes
    }

    /// Form field that carries the uploaded file.
    pub fn field_name(&self) -> &str {
        &self.field_name
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            dir_mode: DEFAULT_DIR_MODE,
            allowed_types: default_allowed_types(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            field_name: DEFAULT_FIELD_NAME.into(),
        }
    }
}

fn default_allowed_types() -> Vec<String> {
    DEFAULT_ALLOWED_TYPES.iter().map(|t| t.to_string()).collect()
}

/// Trim `value`, treating empty/whitespace as unset.
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse the storage directory from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`DEFAULT_STORAGE_DIR`].
pub fn storage_dir_from_env_value(value: Option<String>) -> PathBuf {
    non_blank(value)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_DIR))
}

/// Parse octal directory permission bits (`755`, `0755` or `0o755`) from an optional string.
///
/// If `value` is `None` or empty/whitespace, returns [`DEFAULT_DIR_MODE`].
pub fn dir_mode_from_env_value(value: Option<String>) -> ConfigResult<u32> {
    let Some(value) = non_blank(value) else {
        return Ok(DEFAULT_DIR_MODE);
    };

    let digits = value.strip_prefix("0o").unwrap_or(value.as_str());
    let mode = u32::from_str_radix(digits, 8).map_err(|source| ConfigError::InvalidDirMode {
        value: value.clone(),
        source,
    })?;

    if mode > MAX_DIR_MODE {
        return Err(ConfigError::DirModeOutOfRange(mode));
    }

    Ok(mode)
}

/// Parse a comma-separated allow-list from an optional string value.
///
/// Entries are trimmed and blanks dropped. If nothing is left, returns the default
/// allow-list.
pub fn allowed_types_from_env_value(value: Option<String>) -> Vec<String> {
    let parsed: Vec<String> = non_blank(value)
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    if parsed.is_empty() {
        default_allowed_types()
    } else {
        parsed
    }
}

/// Parse the server upload size limit from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`DEFAULT_MAX_UPLOAD_BYTES`].
pub fn max_upload_bytes_from_env_value(value: Option<String>) -> ConfigResult<u64> {
    non_blank(value)
        .map(|v| {
            v.parse::<u64>()
                .map_err(|source| ConfigError::InvalidMaxUploadBytes { value: v, source })
        })
        .transpose()
        .map(|parsed| parsed.unwrap_or(DEFAULT_MAX_UPLOAD_BYTES))
}

/// Parse the upload form field name from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`DEFAULT_FIELD_NAME`].
pub fn field_name_from_env_value(value: Option<String>) -> String {
    non_blank(value).unwrap_or_else(|| DEFAULT_FIELD_NAME.into())
}
