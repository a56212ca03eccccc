//! Request and response bodies shared by the uploadimg APIs.

use serde::{Deserialize, Serialize};
use uploadimg_files::{StoredImage, UploadError, UploadSummary};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// A stored upload, as returned by `POST /upload`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UploadRes {
    /// Name the file was stored under, without extension
    #[schema(example = "2012")]
    pub name: String,
    /// Sniffed image type, also the file extension
    #[schema(example = "jpeg")]
    pub mime: String,
    /// Size in bytes
    pub size: u64,
    /// Storage directory
    #[schema(example = "images")]
    pub location: String,
    /// `<location>/<name>.<mime>`
    #[schema(example = "images/2012.jpeg")]
    pub fullpath: String,
}

impl From<UploadSummary> for UploadRes {
    fn from(summary: UploadSummary) -> Self {
        Self {
            name: summary.name,
            mime: summary.mime,
            size: summary.size,
            location: summary.location,
            fullpath: summary.fullpath,
        }
    }
}

impl From<&StoredImage> for UploadRes {
    fn from(stored: &StoredImage) -> Self {
        stored.summary().into()
    }
}

/// An upload that was refused or failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    #[schema(example = "Invalid File! Only (jpeg, png, gif, jpg) image types are allowed")]
    pub error: String,
}

impl From<&UploadError> for ErrorRes {
    fn from(err: &UploadError) -> Self {
        Self {
            error: err.to_string(),
        }
    }
}

/// Multipart body accepted by `POST /upload`. Only used for the OpenAPI document.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UploadForm {
    /// The image file. The field name is configurable and defaults to `pictures`.
    #[schema(value_type = String, format = Binary)]
    pub pictures: Vec<u8>,
    /// Name to store the file under, without extension
    pub name: Option<String>,
    /// Size limit declared by the form, in bytes
    #[serde(rename = "MAX_FILE_SIZE")]
    pub max_file_size: Option<u64>,
}
