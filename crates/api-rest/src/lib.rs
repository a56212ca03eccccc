//! # API REST
//!
//! REST API implementation for uploadimg.
//!
//! Handles:
//! - HTTP endpoints with axum (`GET /`, `POST /upload`, `GET /health`)
//! - Translating a `multipart/form-data` body into an uploaded-file descriptor
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, status codes, CORS)
//!
//! The pipeline itself runs on tokio's blocking pool. Uses `api-shared` for wire types.

#![warn(rust_2018_idioms)]

use axum::{
    extract::{multipart::Field, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{Html, Json},
    routing::{get, post},
    Router,
};
use tempfile::{NamedTempFile, TempPath};
use tokio::io::AsyncWriteExt;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use api_shared::{ErrorRes, HealthRes, HealthService, UploadForm, UploadRes};
use uploadimg_core::{TransportCode, UploadError, UploadService, UploadedFile, UploadedFiles};

/// Slack allowed on top of the upload limit for multipart framing and the text fields.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Application state shared across REST API handlers
#[derive(Clone)]
pub struct AppState {
    upload_service: UploadService,
}

#[derive(OpenApi)]
#[openapi(
    paths(health, upload),
    components(schemas(HealthRes, UploadRes, ErrorRes, UploadForm))
)]
pub struct ApiDoc;

/// Builds the REST router around `upload_service`.
pub fn router(upload_service: UploadService) -> Router {
    let body_limit = usize::try_from(upload_service.config().max_upload_bytes())
        .unwrap_or(usize::MAX)
        .saturating_add(FORM_OVERHEAD_BYTES);

    Router::new()
        .route("/", get(form))
        .route("/health", get(health))
        .route(
            "/upload",
            post(upload).layer(DefaultBodyLimit::max(body_limit)),
        )
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(AppState { upload_service })
}

/// Upload form page
///
/// A plain `multipart/form-data` form posting to `/upload`.
async fn form(State(state): State<AppState>) -> Html<String> {
    let cfg = state.upload_service.config();
    Html(format!(
        r#"<form method="POST" action="/upload" enctype="multipart/form-data">
    <input type="hidden" name="MAX_FILE_SIZE" value="{max}"/>
    <input type="text" name="name" placeholder="name (optional)"/>
    <input type="file" name="{field}" accept="image/*"/>
    <input type="submit" value="upload"/>
</form>
"#,
        max = cfg.max_upload_bytes(),
        field = cfg.field_name(),
    ))
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks.
async fn health() -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    post,
    path = "/upload",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Image stored", body = UploadRes),
        (status = 400, description = "Upload refused", body = ErrorRes),
        (status = 500, description = "Upload failed on the server", body = ErrorRes)
    )
)]
/// Validate, name and store one uploaded image
///
/// The file part is spooled to a temporary file, then handed to the pipeline which sniffs
/// its type, checks the allow-list and moves it into the storage directory. An optional
/// `name` field sets the stored name; otherwise one is generated.
///
/// # Returns
/// * `Ok(Json<UploadRes>)` - Summary of the stored file
/// * `Err((StatusCode, Json<ErrorRes>))` - 400 when the upload is refused, 500 when the
///   server failed to store it
async fn upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadRes>, (StatusCode, Json<ErrorRes>)> {
    let cfg = state.upload_service.config();
    let form = read_form(multipart, cfg.field_name(), cfg.max_upload_bytes()).await;

    let service = state.upload_service.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        let ReceivedForm {
            files,
            desired_name,
            spool,
        } = form;
        let result = service.store(&files, desired_name.as_deref());
        // Removes the spooled file if the pipeline did not move it.
        drop(spool);
        result
    })
    .await;

    match outcome {
        Ok(Ok(stored)) => Ok(Json(UploadRes::from(&stored))),
        Ok(Err(err)) => Err(error_response(&err)),
        Err(e) => {
            tracing::error!("Upload task error: {:?}", e);
            Err(error_response(&UploadError::MoveFailed))
        }
    }
}

fn error_response(err: &UploadError) -> (StatusCode, Json<ErrorRes>) {
    let status = if err.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(ErrorRes::from(err)))
}

/// The parts of an upload form the pipeline cares about.
struct ReceivedForm {
    files: UploadedFiles,
    desired_name: Option<String>,
    spool: Option<TempPath>,
}

/// Reads the multipart body into a descriptor collection.
///
/// Transfer problems are not errors here: they become a descriptor carrying the matching
/// [`TransportCode`], and the pipeline turns that into the response.
async fn read_form(
    mut multipart: Multipart,
    field_name: &str,
    max_upload_bytes: u64,
) -> ReceivedForm {
    let mut form = ReceivedForm {
        files: UploadedFiles::new(),
        desired_name: None,
        spool: None,
    };
    let mut form_limit: Option<u64> = None;

    loop {
        let mut field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                tracing::warn!("Failed to read multipart body: {}", err);
                form.files
                    .insert(field_name, UploadedFile::failed(transport_code_for(&err)));
                break;
            }
        };

        let name = field.name().unwrap_or_default().to_owned();

        if name == field_name {
            let original = field.file_name().unwrap_or_default().to_owned();
            let declared = field.content_type().unwrap_or_default().to_owned();

            let file = match spool_field(&mut field, max_upload_bytes, form_limit).await {
                Ok((path, size)) => {
                    let file = UploadedFile::new(path.to_path_buf(), size);
                    form.spool = Some(path);
                    file
                }
                Err(code) => UploadedFile::failed(code),
            };

            form.files.insert(
                field_name,
                file.with_original_name(original).with_declared_type(declared),
            );
        } else if name == "name" {
            form.desired_name = field.text().await.ok();
        } else if name == "MAX_FILE_SIZE" {
            form_limit = field
                .text()
                .await
                .ok()
                .and_then(|v| v.trim().parse().ok());
        }
    }

    form
}

/// Streams one file part into a temporary file, enforcing the size limits.
async fn spool_field(
    field: &mut Field<'_>,
    max_upload_bytes: u64,
    form_limit: Option<u64>,
) -> Result<(TempPath, u64), TransportCode> {
    let spool = NamedTempFile::new().map_err(|e| {
        tracing::error!("Failed to create spool file: {}", e);
        TransportCode::NoTmpDir
    })?;

    let mut out = spool
        .reopen()
        .map(tokio::fs::File::from_std)
        .map_err(|_| TransportCode::CantWrite)?;

    let mut size = 0u64;
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|err| transport_code_for(&err))?
    {
        size += chunk.len() as u64;

        if size > max_upload_bytes {
            return Err(TransportCode::IniSize);
        }
        if form_limit.is_some_and(|limit| size > limit) {
            return Err(TransportCode::FormSize);
        }

        out.write_all(&chunk).await.map_err(|e| {
            tracing::error!("Failed to write spool file: {}", e);
            TransportCode::CantWrite
        })?;
    }
    out.flush().await.map_err(|_| TransportCode::CantWrite)?;

    if size == 0 {
        return Err(TransportCode::NoFile);
    }

    Ok((spool.into_temp_path(), size))
}

fn transport_code_for(err: &axum::extract::multipart::MultipartError) -> TransportCode {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        TransportCode::IniSize
    } else {
        TransportCode::Partial
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use std::path::PathBuf;
    use std::sync::Arc;
    use tempfile::TempDir;
    use tower::ServiceExt;
    use uploadimg_core::CoreConfig;

    const BOUNDARY: &str = "uploadimg-test-boundary";

    const JPEG_BYTES: &[u8] = &[
        0xff, 0xd8, 0xff, 0xe0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0x01, 0x01, 0x00,
        0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0xff, 0xd9,
    ];

    enum Part<'a> {
        Text(&'a str, &'a str),
        File(&'a str, &'a str, &'a [u8]),
    }

    fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            match part {
                Part::Text(name, value) => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                            .as_bytes(),
                    );
                    body.extend_from_slice(value.as_bytes());
                }
                Part::File(name, file_name, bytes) => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                             Content-Type: image/jpeg\r\n\r\n",
                            name, file_name
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(bytes);
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    fn app(store: &TempDir, max_upload_bytes: u64) -> (Router, PathBuf) {
        let storage_dir = store.path().join("images");
        let cfg = CoreConfig::new(
            storage_dir.clone(),
            0o755,
            vec!["jpeg".into(), "png".into(), "gif".into(), "jpg".into()],
            max_upload_bytes,
            "pictures".into(),
        )
        .unwrap();
        (
            router(UploadService::new(Arc::new(cfg))),
            storage_dir,
        )
    }

    async fn post_upload(app: Router, parts: &[Part<'_>]) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/upload")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(parts)))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let store = TempDir::new().unwrap();
        let (app, _) = app(&store, 1_000_000);

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: HealthRes = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, HealthService::check_health());
    }

    #[tokio::test]
    async fn test_form_page_names_file_field() {
        let store = TempDir::new().unwrap();
        let (app, _) = app(&store, 1_000_000);

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains(r#"name="pictures""#));
        assert!(html.contains(r#"name="MAX_FILE_SIZE" value="1000000""#));
    }

    #[tokio::test]
    async fn test_upload_stores_named_jpeg() {
        let store = TempDir::new().unwrap();
        let (app, storage_dir) = app(&store, 1_000_000);

        let (status, body) = post_upload(
            app,
            &[
                Part::Text("name", "2012"),
                Part::File("pictures", "monkey.jpg", JPEG_BYTES),
            ],
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let stored = storage_dir.join("2012.jpeg");
        assert_eq!(body["name"], "2012");
        assert_eq!(body["mime"], "jpeg");
        assert_eq!(body["size"], JPEG_BYTES.len() as u64);
        assert_eq!(body["fullpath"], stored.display().to_string());
        assert_eq!(std::fs::read(&stored).unwrap(), JPEG_BYTES);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_uploaded_file_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let store = TempDir::new().unwrap();
        let (app, storage_dir) = app(&store, 1_000_000);

        let (status, _) = post_upload(
            app,
            &[
                Part::Text("name", "m"),
                Part::File("pictures", "m.jpg", JPEG_BYTES),
            ],
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let metadata = std::fs::metadata(storage_dir.join("m.jpeg")).unwrap();
        assert_eq!(metadata.permissions().mode() & 0o777, 0o644);
    }

    #[tokio::test]
    async fn test_upload_rejects_non_image() {
        let store = TempDir::new().unwrap();
        let (app, _) = app(&store, 1_000_000);

        let (status, body) = post_upload(
            app,
            &[Part::File("pictures", "notes.jpg", b"definitely not an image")],
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            "Invalid File! Only (jpeg, png, gif, jpg) image types are allowed"
        );
    }

    #[tokio::test]
    async fn test_upload_without_file_field() {
        let store = TempDir::new().unwrap();
        let (app, _) = app(&store, 1_000_000);

        let (status, body) = post_upload(app, &[Part::Text("name", "lonely")]).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Image is not found");
    }

    #[tokio::test]
    async fn test_upload_empty_file_part() {
        let store = TempDir::new().unwrap();
        let (app, _) = app(&store, 1_000_000);

        let (status, body) = post_upload(app, &[Part::File("pictures", "", b"")]).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Image is not found");
    }

    #[tokio::test]
    async fn test_upload_over_form_limit() {
        let store = TempDir::new().unwrap();
        let (app, _) = app(&store, 1_000_000);

        let (status, body) = post_upload(
            app,
            &[
                Part::Text("MAX_FILE_SIZE", "8"),
                Part::File("pictures", "monkey.jpg", JPEG_BYTES),
            ],
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            "Image is larger than the specified amount specified by browser"
        );
    }

    #[tokio::test]
    async fn test_upload_over_server_limit() {
        let store = TempDir::new().unwrap();
        let (app, storage_dir) = app(&store, 16);

        let (status, body) =
            post_upload(app, &[Part::File("pictures", "monkey.jpg", JPEG_BYTES)]).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            "Image is larger than the specified amount set by the server"
        );
        assert_eq!(std::fs::read_dir(&storage_dir).unwrap().count(), 0);
    }
}
