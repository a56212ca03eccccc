//! Upload service used by the REST and CLI surfaces.

use crate::config::CoreConfig;
use std::sync::Arc;
use uploadimg_files::{
    StoredImage, TransportCode, UploadError, UploadRequest, UploadedFile, UploadedFiles,
};

/// Runs uploads through the pipeline using the startup configuration.
///
/// The service holds no per-request state; cloning it is cheap.
#[derive(Clone, Debug)]
pub struct UploadService {
    cfg: Arc<CoreConfig>,
}

impl UploadService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.cfg
    }

    /// Stores the file submitted under the configured field name.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::Transport`] with [`TransportCode::NoFile`] when the field is
    /// absent, otherwise whatever the pipeline reports.
    pub fn store(
        &self,
        files: &UploadedFiles,
        desired_name: Option<&str>,
    ) -> Result<StoredImage, UploadError> {
        let request = files
            .select(self.cfg.field_name())
            .ok_or(UploadError::Transport(TransportCode::NoFile))?;

        self.run(request, desired_name)
    }

    /// Stores a single descriptor.
    ///
    /// # Errors
    ///
    /// Whatever the pipeline reports.
    pub fn store_file(
        &self,
        file: UploadedFile,
        desired_name: Option<&str>,
    ) -> Result<StoredImage, UploadError> {
        self.run(UploadRequest::new(file), desired_name)
    }

    /// Applies the configured allow-list and storage directory to `request`.
    pub fn prepare(&self, request: UploadRequest, desired_name: Option<&str>) -> UploadRequest {
        request
            .with_allowed_types(self.cfg.allowed_types().iter().cloned())
            .with_name(desired_name)
            .with_storage_directory(Some(self.cfg.storage_dir()), Some(self.cfg.dir_mode()))
    }

    fn run(
        &self,
        request: UploadRequest,
        desired_name: Option<&str>,
    ) -> Result<StoredImage, UploadError> {
        let declared = request.file().name.clone();

        match self.prepare(request, desired_name).upload() {
            Ok(stored) => {
                tracing::info!(
                    original = %declared,
                    full_path = %stored.full_path(),
                    mime = %stored.mime(),
                    size = stored.size(),
                    "upload stored"
                );
                Ok(stored)
            }
            Err(err) => {
                if err.is_client_error() {
                    tracing::warn!(original = %declared, "upload rejected: {}", err);
                } else {
                    tracing::error!(original = %declared, "upload failed: {}", err);
                }
                Err(err)
            }
        }
    }
}
