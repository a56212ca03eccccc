use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use uploadimg_core::{
    CoreConfig, DEFAULT_REST_ADDR, UploadService,
    config::{
        allowed_types_from_env_value, dir_mode_from_env_value, field_name_from_env_value,
        max_upload_bytes_from_env_value, storage_dir_from_env_value,
    },
};

/// Main entry point for the uploadimg server
///
/// Serves the upload form, the upload endpoint and the health check over REST, with
/// OpenAPI/Swagger documentation at `/swagger-ui`.
///
/// # Environment Variables
/// - `UPLOADIMG_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `UPLOADIMG_STORAGE_DIR`: Directory uploads are stored in (default: "images")
/// - `UPLOADIMG_DIR_MODE`: Octal permission bits for a created storage directory (default: "755")
/// - `UPLOADIMG_ALLOWED_TYPES`: Comma-separated image types (default: "jpeg,png,gif,jpg")
/// - `UPLOADIMG_MAX_UPLOAD_BYTES`: Server upload size limit (default: "1000000")
/// - `UPLOADIMG_FIELD_NAME`: Form field carrying the file (default: "pictures")
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration is invalid, or server startup or runtime fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("uploadimg=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr =
        std::env::var("UPLOADIMG_REST_ADDR").unwrap_or_else(|_| DEFAULT_REST_ADDR.into());

    let cfg = Arc::new(CoreConfig::new(
        storage_dir_from_env_value(std::env::var("UPLOADIMG_STORAGE_DIR").ok()),
        dir_mode_from_env_value(std::env::var("UPLOADIMG_DIR_MODE").ok())?,
        allowed_types_from_env_value(std::env::var("UPLOADIMG_ALLOWED_TYPES").ok()),
        max_upload_bytes_from_env_value(std::env::var("UPLOADIMG_MAX_UPLOAD_BYTES").ok())?,
        field_name_from_env_value(std::env::var("UPLOADIMG_FIELD_NAME").ok()),
    )?);

    tracing::info!("++ Starting uploadimg REST on {}", rest_addr);
    tracing::info!(
        "++ Storing {} uploads in {}",
        cfg.allowed_types().join(", "),
        cfg.storage_dir().display()
    );

    let app = api_rest::router(UploadService::new(cfg));

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
