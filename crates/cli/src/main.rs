use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uploadimg_core::{
    config::{allowed_types_from_env_value, dir_mode_from_env_value},
    sniff, CoreConfig, StoredImage, UploadError, UploadService, UploadedFile, DEFAULT_FIELD_NAME,
    DEFAULT_MAX_UPLOAD_BYTES,
};

#[derive(Parser)]
#[command(name = "uploadimg")]
#[command(about = "Validate, name and store image uploads")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Store an image the way the upload endpoint would
    Upload {
        /// Image file to store
        file: PathBuf,
        /// Name to store the file under, without extension (generated if omitted)
        #[arg(long)]
        name: Option<String>,
        /// Storage directory
        #[arg(long, default_value = uploadimg_core::DEFAULT_STORAGE_DIR)]
        dir: PathBuf,
        /// Permission bits for a newly created storage directory, in octal
        #[arg(long)]
        mode: Option<String>,
        /// Comma-separated allow-list of image types
        #[arg(long)]
        allow: Option<String>,
        /// Move the file into storage instead of copying it
        #[arg(long = "move")]
        move_file: bool,
        /// Print the JSON summary instead of the stored path
        #[arg(long)]
        json: bool,
    },
    /// Print the detected image type of a file
    Sniff {
        /// File to inspect
        file: PathBuf,
    },
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Quiet unless RUST_LOG asks for more; stdout is reserved for results.
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Some(Commands::Upload {
            file,
            name,
            dir,
            mode,
            allow,
            move_file,
            json,
        }) => {
            let cfg = CoreConfig::new(
                dir,
                dir_mode_from_env_value(mode)?,
                allowed_types_from_env_value(allow),
                DEFAULT_MAX_UPLOAD_BYTES,
                DEFAULT_FIELD_NAME.into(),
            )?;
            let service = UploadService::new(Arc::new(cfg));

            match upload(&service, &file, name.as_deref(), move_file)? {
                Ok(stored) if json => println!("{}", stored.to_json()),
                Ok(stored) => println!("{}", stored.full_path()),
                Err(e) => {
                    eprintln!("{}", e);
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
        Some(Commands::Sniff { file }) => match sniff::sniff_path(&file)? {
            Some(image_type) => println!("{}", image_type),
            None => println!("unrecognized"),
        },
        None => {
            println!("No command given. Use --help for usage.");
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Runs `file` through the pipeline.
///
/// Without `move_file` the pipeline works on a temporary copy, so the source is left alone.
/// The outer error covers making that copy; the inner result is the pipeline's.
fn upload(
    service: &UploadService,
    file: &Path,
    name: Option<&str>,
    move_file: bool,
) -> std::io::Result<Result<StoredImage, UploadError>> {
    let original = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let (tmp_name, _copy) = if move_file {
        (file.to_path_buf(), None)
    } else {
        let copy = tempfile::NamedTempFile::new()?.into_temp_path();
        std::fs::copy(file, &copy)?;
        (copy.to_path_buf(), Some(copy))
    };

    let size = std::fs::metadata(&tmp_name)?.len();
    let descriptor = UploadedFile::new(tmp_name, size).with_original_name(original);

    Ok(service.store_file(descriptor, name))
}
