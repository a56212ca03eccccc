//! Uploaded-file descriptors as handed over by the web layer.
//!
//! A descriptor records where the web layer spooled the file, what the client claimed about
//! it, and whether the transfer itself succeeded. Field names follow the conventional form
//! upload layout (`name`, `type`, `tmp_name`, `size`, `error`) so descriptors can be
//! deserialised straight from JSON.

use crate::files::UploadRequest;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

/// Transfer status reported by the web layer for one uploaded file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum TransportCode {
    /// The file arrived intact.
    #[default]
    Ok,
    /// The file exceeds the server's size limit.
    IniSize,
    /// The file exceeds the limit declared by the form.
    FormSize,
    /// Only part of the file arrived.
    Partial,
    /// No file was sent.
    NoFile,
    /// The server has no temporary directory.
    NoTmpDir,
    /// The server could not write the file to disk.
    CantWrite,
    /// A server extension stopped the transfer.
    Extension,
}

/// A numeric status code outside the known set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown upload status code: {0}")]
pub struct UnknownTransportCode(pub i64);

impl TransportCode {
    /// Maps a numeric status code (`0`-`4`, `6`-`8`) to a [`TransportCode`].
    ///
    /// # Errors
    ///
    /// Returns [`UnknownTransportCode`] for any other value, including the unused `5`.
    pub fn from_code(code: i64) -> Result<Self, UnknownTransportCode> {
        match code {
            0 => Ok(Self::Ok),
            1 => Ok(Self::IniSize),
            2 => Ok(Self::FormSize),
            3 => Ok(Self::Partial),
            4 => Ok(Self::NoFile),
            6 => Ok(Self::NoTmpDir),
            7 => Ok(Self::CantWrite),
            8 => Ok(Self::Extension),
            other => Err(UnknownTransportCode(other)),
        }
    }

    /// Returns the numeric status code.
    pub fn code(self) -> i64 {
        match self {
            Self::Ok => 0,
            Self::IniSize => 1,
            Self::FormSize => 2,
            Self::Partial => 3,
            Self::NoFile => 4,
            Self::NoTmpDir => 6,
            Self::CantWrite => 7,
            Self::Extension => 8,
        }
    }

    /// Returns `true` when the transfer succeeded.
    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }

    /// Returns the human-readable message for a failed transfer, or `None` for [`Self::Ok`].
    pub fn message(self) -> Option<&'static str> {
        match self {
            Self::Ok => None,
            Self::IniSize => Some("Image is larger than the specified amount set by the server"),
            Self::FormSize => {
                Some("Image is larger than the specified amount specified by browser")
            }
            Self::Partial => Some("Image could not be fully uploaded. Please try again later"),
            Self::NoFile => Some("Image is not found"),
            Self::NoTmpDir => {
                Some("Can't write to disk, due to server configuration ( No tmp dir found )")
            }
            Self::CantWrite => {
                Some("Failed to write file to disk. Please check you file permissions")
            }
            Self::Extension => Some("A server extension has halted this file upload process"),
        }
    }
}

impl fmt::Display for TransportCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl TryFrom<i64> for TransportCode {
    type Error = UnknownTransportCode;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        Self::from_code(code)
    }
}

impl From<TransportCode> for i64 {
    fn from(code: TransportCode) -> Self {
        code.code()
    }
}

/// One uploaded file as described by the web layer.
///
/// The declared `name`, `mime_type` and `size` come from the client and are not trusted for
/// validation; the pipeline sniffs the real type from the bytes at `tmp_name`.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct UploadedFile {
    /// Original file name declared by the client
    #[serde(default)]
    pub name: String,

    /// MIME type declared by the client
    #[serde(rename = "type", default)]
    pub mime_type: String,

    /// Where the web layer spooled the file, if it got that far
    #[serde(default)]
    pub tmp_name: Option<PathBuf>,

    /// Declared size in bytes
    #[serde(default)]
    pub size: u64,

    /// Transfer status
    #[serde(default)]
    pub error: TransportCode,
}

impl UploadedFile {
    /// Describes a successfully transferred file spooled at `tmp_name`.
    pub fn new(tmp_name: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            tmp_name: Some(tmp_name.into()),
            size,
            ..Self::default()
        }
    }

    /// Describes a transfer that failed with `error` before a file was spooled.
    pub fn failed(error: TransportCode) -> Self {
        Self {
            error,
            ..Self::default()
        }
    }

    /// Sets the client-declared original name.
    pub fn with_original_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the client-declared MIME type.
    pub fn with_declared_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }
}

/// Uploaded files keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct UploadedFiles(HashMap<String, UploadedFile>);

impl UploadedFiles {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the descriptor for `field`.
    pub fn insert(&mut self, field: impl Into<String>, file: UploadedFile) {
        self.0.insert(field.into(), file);
    }

    /// Returns `true` if a descriptor exists for `field`.
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Returns the descriptor for `field`.
    pub fn get(&self, field: &str) -> Option<&UploadedFile> {
        self.0.get(field)
    }

    /// Starts an upload request for the descriptor under `field`.
    ///
    /// Returns `None` when the field is absent. A descriptor carrying a failed transport
    /// status still yields a request; its translated message is available from
    /// [`UploadRequest::error`] and the request will refuse to upload.
    pub fn select(&self, field: &str) -> Option<UploadRequest> {
        self.get(field).cloned().map(UploadRequest::new)
    }
}

impl FromIterator<(String, UploadedFile)> for UploadedFiles {
    fn from_iter<I: IntoIterator<Item = (String, UploadedFile)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
