//! The validate-name-store pipeline
//!
//! An [`UploadRequest`] is built from one [`UploadedFile`] descriptor, configured with
//! chained `with_*` calls and consumed by [`UploadRequest::upload`]. The request moves
//! through these states:
//!
//! ```text
//! UploadedFiles ──select──▶ UploadRequest ──upload──▶ Ok(StoredImage)
//!                              │                  └──▶ Err(UploadError)
//!                              └── error() holds at most one live error
//! ```
//!
//! Ownership encodes the state machine: once `upload` has run there is no request left to
//! retry. A caller wanting another attempt selects the descriptor again.
//!
//! A configuration call that fails (a storage directory that cannot be created, say)
//! records its error on the request instead of returning it. The most recent error wins,
//! and `upload` refuses to run while one is recorded.

use crate::constants::{
    DEFAULT_ALLOWED_TYPES, DEFAULT_DIR_MODE, DEFAULT_FILE_MODE, DEFAULT_STORAGE_DIR,
};
use crate::descriptor::UploadedFile;
use crate::sniff::{self, ImageType};
use crate::UploadError;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use uploadimg_types::FileStem;
use uploadimg_uuid::GeneratedName;

/// Moves an uploaded file from its temporary location to its final path.
pub trait FileMover {
    /// Moves `from` to `to`, replacing anything already at `to`.
    fn move_file(&self, from: &Path, to: &Path) -> io::Result<()>;
}

impl<F> FileMover for F
where
    F: Fn(&Path, &Path) -> io::Result<()>,
{
    fn move_file(&self, from: &Path, to: &Path) -> io::Result<()> {
        self(from, to)
    }
}

/// The default [`FileMover`].
///
/// Sets [`DEFAULT_FILE_MODE`] on the file, then renames it. When the rename fails
/// (typically because the temporary directory is on another filesystem) the file is copied
/// and the original removed.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenameMover;

impl FileMover for RenameMover {
    fn move_file(&self, from: &Path, to: &Path) -> io::Result<()> {
        set_file_mode(from, DEFAULT_FILE_MODE)?;

        match fs::rename(from, to) {
            Ok(()) => Ok(()),
            Err(_) => copy_then_remove(from, to, |path| fs::remove_file(path)),
        }
    }
}

/// Copies `from` to `to`, then removes `from` with `remove`.
///
/// If either step fails whatever was written to `to` is deleted again.
fn copy_then_remove<R>(from: &Path, to: &Path, remove: R) -> io::Result<()>
where
    R: FnOnce(&Path) -> io::Result<()>,
{
    if let Err(err) = fs::copy(from, to).and_then(|_| remove(from)) {
        let _ = fs::remove_file(to);
        return Err(err);
    }

    Ok(())
}

#[cfg(unix)]
fn set_file_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_file_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}

/// Pipeline state for one upload attempt.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    file: UploadedFile,
    name: Option<FileStem>,
    location: Option<PathBuf>,
    allowed_types: Vec<String>,
    error: Option<UploadError>,
}

impl UploadRequest {
    /// Starts a request for `file`.
    ///
    /// A failed transport status is recorded as the request's error straight away.
    pub fn new(file: UploadedFile) -> Self {
        let error = (!file.error.is_ok()).then_some(UploadError::Transport(file.error));

        Self {
            file,
            name: None,
            location: None,
            allowed_types: DEFAULT_ALLOWED_TYPES.iter().map(|t| t.to_string()).collect(),
            error,
        }
    }

    /// Replaces the allow-list of image types.
    ///
    /// Entries are compared with sniffed types ignoring ASCII case.
    pub fn with_allowed_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the name the file is stored under, without extension.
    ///
    /// The name is sanitised (see [`FileStem`]). `None`, or a name with nothing usable
    /// left after sanitising, leaves the name unset and one is generated at upload time.
    pub fn with_name(mut self, name: Option<&str>) -> Self {
        self.name = name.and_then(|n| FileStem::new(n).ok());
        self
    }

    /// Sets the storage directory, creating it with `mode` permission bits if needed.
    ///
    /// `None` selects [`DEFAULT_STORAGE_DIR`] and [`DEFAULT_DIR_MODE`] respectively. If
    /// the directory cannot be created or written to, the error is recorded on the request
    /// and the location is left as it was.
    pub fn with_storage_directory(mut self, dir: Option<&Path>, mode: Option<u32>) -> Self {
        let dir = dir.unwrap_or_else(|| Path::new(DEFAULT_STORAGE_DIR));

        match prepare_directory(dir, mode.unwrap_or(DEFAULT_DIR_MODE)) {
            Ok(()) => self.location = Some(dir.to_path_buf()),
            Err(err) => self.error = Some(err),
        }
        self
    }

    /// The descriptor this request was built from.
    pub fn file(&self) -> &UploadedFile {
        &self.file
    }

    /// The sanitised name, if one has been set.
    pub fn name(&self) -> Option<&FileStem> {
        self.name.as_ref()
    }

    /// The prepared storage directory, if one has been set.
    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    pub fn allowed_types(&self) -> &[String] {
        &self.allowed_types
    }

    /// The live error, or `None` when the request can still be uploaded.
    pub fn error(&self) -> Option<&UploadError> {
        self.error.as_ref()
    }

    /// Sniffs the type of the temporary file.
    ///
    /// Returns `None` when there is no temporary file, it cannot be read, or its signature
    /// is not recognised.
    pub fn mime(&self) -> Option<ImageType> {
        let tmp_name = self.file.tmp_name.as_deref()?;
        sniff::sniff_path(tmp_name).ok().flatten()
    }

    /// Runs the pipeline with the default [`RenameMover`].
    ///
    /// # Errors
    ///
    /// See [`Self::upload_with`].
    pub fn upload(self) -> Result<StoredImage, UploadError> {
        self.upload_with(&RenameMover)
    }

    /// Validates, names and stores the file, moving it with `mover`.
    ///
    /// # Errors
    ///
    /// Returns the recorded error if there is one, then:
    /// - [`UploadError::MissingTemporaryFile`] if the descriptor has no temporary path
    /// - [`UploadError::InvalidType`] if the sniffed type is not allowed, or unrecognised
    /// - [`UploadError::MoveFailed`] if naming, preparing the default directory or the
    ///   move itself fails
    pub fn upload_with(self, mover: &dyn FileMover) -> Result<StoredImage, UploadError> {
        let Self {
            file,
            name,
            location,
            allowed_types,
            error,
        } = self;

        if let Some(err) = error {
            return Err(err);
        }

        let tmp_name = file.tmp_name.ok_or(UploadError::MissingTemporaryFile)?;

        let mime = sniff::sniff_path(&tmp_name)
            .ok()
            .flatten()
            .filter(|ty| is_allowed(&allowed_types, *ty))
            .ok_or_else(|| UploadError::InvalidType {
                allowed: allowed_types,
            })?;

        let name = match name {
            Some(name) => name,
            None => FileStem::new(GeneratedName::generate().to_string())
                .map_err(|_| UploadError::MoveFailed)?,
        };

        let location = match location {
            Some(location) => location,
            None => {
                let dir = PathBuf::from(DEFAULT_STORAGE_DIR);
                prepare_directory(&dir, DEFAULT_DIR_MODE)
                    .map_err(|_| UploadError::MoveFailed)?;
                dir
            }
        };

        let target = location.join(format!("{}.{}", name, mime));
        mover
            .move_file(&tmp_name, &target)
            .map_err(|_| UploadError::MoveFailed)?;

        let stored = StoredImage {
            full_path: format!("{}/{}.{}", location.display(), name, mime),
            name,
            mime,
            size: file.size,
            location,
        };

        tracing::debug!(
            full_path = %stored.full_path,
            mime = %stored.mime,
            size = stored.size,
            "stored upload"
        );

        Ok(stored)
    }
}

fn is_allowed(allowed_types: &[String], ty: ImageType) -> bool {
    allowed_types
        .iter()
        .any(|allowed| allowed.trim().eq_ignore_ascii_case(ty.as_str()))
}

/// Makes sure `dir` exists and is writable, creating it recursively with `mode` if absent.
///
/// # Errors
///
/// - [`UploadError::DirectoryCreation`] if the directory did not exist and could not be
///   created
/// - [`UploadError::DirectoryNotWritable`] if it is not a directory or a file cannot be
///   created inside it
pub fn prepare_directory(dir: &Path, mode: u32) -> Result<(), UploadError> {
    if !dir.exists() {
        create_dir_all(dir, mode).map_err(|_| UploadError::DirectoryCreation {
            dir: dir.display().to_string(),
        })?;
        tracing::debug!(
            dir = %dir.display(),
            mode = %format!("{:o}", mode),
            "created storage directory"
        );
    }

    let writable = dir.is_dir()
        && tempfile::Builder::new()
            .prefix(".uploadimg-write-check")
            .tempfile_in(dir)
            .is_ok();

    if !writable {
        return Err(UploadError::DirectoryNotWritable {
            dir: dir.display().to_string(),
        });
    }

    Ok(())
}

#[cfg(unix)]
fn create_dir_all(dir: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;

    fs::DirBuilder::new().recursive(true).mode(mode).create(dir)
}

#[cfg(not(unix))]
fn create_dir_all(dir: &Path, _mode: u32) -> io::Result<()> {
    fs::DirBuilder::new().recursive(true).create(dir)
}

/// A successfully stored upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    name: FileStem,
    mime: ImageType,
    size: u64,
    location: PathBuf,
    full_path: String,
}

impl StoredImage {
    /// The name the file was stored under, without extension.
    pub fn name(&self) -> &FileStem {
        &self.name
    }

    /// The sniffed type, also used as the extension.
    pub fn mime(&self) -> ImageType {
        self.mime
    }

    /// Size in bytes as declared by the web layer.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    /// `<location>/<name>.<mime>`
    pub fn full_path(&self) -> &str {
        &self.full_path
    }

    /// Flat key-value summary of the stored file.
    pub fn summary(&self) -> UploadSummary {
        UploadSummary {
            name: self.name.to_string(),
            mime: self.mime.to_string(),
            size: self.size,
            location: self.location.display().to_string(),
            fullpath: self.full_path.clone(),
        }
    }

    /// The summary as a JSON object with keys `name`, `mime`, `size`, `location`,
    /// `fullpath`, in that order.
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.summary()).expect("upload summary is always serialisable")
    }
}

/// Flat summary of a stored upload.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct UploadSummary {
    pub name: String,
    pub mime: String,
    pub size: u64,
    pub location: String,
    pub fullpath: String,
}
