//! uploadimg file pipeline
//!
//! This crate takes one uploaded file, as described by the web layer, through the
//! validate-name-store pipeline:
//!
//! 1. refuse the request if the transport reported an error,
//! 2. sniff the real image type from the file's leading bytes,
//! 3. check the type against an allow-list,
//! 4. resolve a name (caller-supplied and sanitised, or generated),
//! 5. resolve and prepare the storage directory,
//! 6. move the file to `<directory>/<name>.<type>`.
//!
//! The declared MIME type and original name sent by the client are never trusted.
//!
//! ## Storage layout
//!
//! Files are stored flat; there is no sharding and no metadata sidecar:
//!
//! ```text
//! images/
//! ├── 2012.jpeg
//! ├── demo.png
//! └── 20260111T143522.045123Z-550e8400_hkqegnmfipjlo.gif
//! ```
//!
//! ## Example Usage
//!
//! ```no_run
//! use std::path::Path;
//! use uploadimg_files::{UploadedFile, UploadedFiles};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut files = UploadedFiles::new();
//! files.insert("pictures", UploadedFile::new("/tmp/upload-1234", 17438));
//!
//! let request = files
//!     .select("pictures")
//!     .ok_or("no file was sent")?
//!     .with_name(Some("2012"))
//!     .with_storage_directory(Some(Path::new("images")), None);
//!
//! let stored = request.upload()?;
//! assert_eq!(stored.full_path(), "images/2012.jpeg");
//! # Ok(())
//! # }
//! ```

mod constants;
mod descriptor;
mod files;
pub mod sniff;

pub use constants::{
    DEFAULT_ALLOWED_TYPES, DEFAULT_DIR_MODE, DEFAULT_FILE_MODE, DEFAULT_STORAGE_DIR,
};
pub use descriptor::{TransportCode, UnknownTransportCode, UploadedFile, UploadedFiles};
pub use files::{
    prepare_directory, FileMover, RenameMover, StoredImage, UploadRequest, UploadSummary,
};
pub use sniff::ImageType;

/// Errors that end an upload attempt
///
/// Every variant is terminal and carries the exact message shown to the uploader.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    /// The web layer reported a failed transfer
    #[error("{}", .0.message().unwrap_or("Upload failed, Unknown error occurred"))]
    Transport(TransportCode),

    /// The sniffed type is not in the allow-list
    #[error("Invalid File! Only ({}) image types are allowed", .allowed.join(", "))]
    InvalidType { allowed: Vec<String> },

    /// The storage directory did not exist and could not be created
    #[error("Error! Folder {dir} could not be created")]
    DirectoryCreation { dir: String },

    /// The storage directory exists but cannot be written to
    #[error("The images directory '{dir}' is not writable!")]
    DirectoryNotWritable { dir: String },

    /// Naming, directory resolution or the final move failed
    #[error("Upload failed, Unknown error occurred")]
    MoveFailed,

    /// The descriptor reported success but has no temporary file
    #[error("Upload failed, no temporary file was received")]
    MissingTemporaryFile,
}

impl UploadError {
    /// Returns `true` when the uploader, not the server, is at fault.
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::Transport(code) => matches!(
                code,
                TransportCode::IniSize
                    | TransportCode::FormSize
                    | TransportCode::Partial
                    | TransportCode::NoFile
            ),
            Self::InvalidType { .. } | Self::MissingTemporaryFile => true,
            Self::DirectoryCreation { .. }
            | Self::DirectoryNotWritable { .. }
            | Self::MoveFailed => false,
        }
    }
}
