//! # uploadimg Core
//!
//! Startup configuration and the upload service that the REST server and CLI share.
//!
//! - [`CoreConfig`] is resolved once at startup (storage directory, directory mode,
//!   allow-list, size limit, form field name) and passed into [`UploadService`].
//! - [`UploadService`] applies that configuration to each request and runs it through the
//!   `uploadimg_files` pipeline, logging the outcome.
//!
//! **No API concerns**: multipart parsing, HTTP status codes and CLI output belong in
//! `api-rest` and `uploadimg-cli`.

pub mod config;
pub mod constants;
mod error;
mod service;

pub use config::CoreConfig;
pub use constants::*;
pub use error::{ConfigError, ConfigResult};
pub use service::UploadService;

// Re-export the pipeline types the outer surfaces need.
pub use uploadimg_files::{
    sniff, ImageType, StoredImage, TransportCode, UploadError, UploadRequest, UploadSummary,
    UploadedFile, UploadedFiles,
};
