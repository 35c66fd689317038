//! Web UI and HTTP API.
//!
//! Endpoints:
//! - GET /             - upload form
//! - POST /convert     - convert and render a page with a download link
//! - POST /api/convert - convert and answer with the DOCX itself
//! - GET /health       - liveness check

use std::fmt;
use std::net::SocketAddr;

use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use pdf2cursive::{process_upload, Deliverable, FontSpec, DOCX_MIME_TYPE};

use crate::page::{self, Outcome};

/// Server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub max_upload_bytes: usize,
}

pub fn router(config: &ServerConfig) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/convert", post(convert_form))
        .route("/api/convert", post(convert_api))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
}

pub async fn serve(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let app = router(&config);
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    log::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::warn!("failed to listen for shutdown signal: {}", e);
    }
}

// ============================================================================
// Upload handling
// ============================================================================

/// A validated submission.
struct Upload {
    data: Vec<u8>,
    spec: FontSpec,
}

/// Why a submission never reached the pipeline.
#[derive(Debug)]
enum UploadError {
    MissingFile,
    Multipart(MultipartError),
    Input(pdf2cursive::Error),
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadError::MissingFile => f.write_str("Please upload a PDF file."),
            UploadError::Multipart(e) => write!(f, "Failed to read upload: {}", e),
            UploadError::Input(e) => write!(f, "{}", e),
        }
    }
}

/// Read the `file`, `font` and `size` fields. Font and size fall back to
/// their defaults when absent.
async fn read_upload(mut multipart: Multipart) -> Result<Upload, UploadError> {
    let mut data = None;
    let mut font = None;
    let mut size = None;

    while let Some(field) = multipart.next_field().await.map_err(UploadError::Multipart)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let bytes = field.bytes().await.map_err(UploadError::Multipart)?;
                log::debug!("received upload of {} bytes", bytes.len());
                data = Some(bytes.to_vec());
            }
            "font" => font = Some(field.text().await.map_err(UploadError::Multipart)?),
            "size" => size = Some(field.text().await.map_err(UploadError::Multipart)?),
            other => log::debug!("ignoring form field '{}'", other),
        }
    }

    let mut spec = FontSpec::default();
    if let Some(font) = font {
        spec.font = font.parse().map_err(UploadError::Input)?;
    }
    if let Some(size) = size {
        spec.size = size.parse().map_err(UploadError::Input)?;
    }

    match data {
        Some(data) if !data.is_empty() => Ok(Upload { data, spec }),
        _ => Err(UploadError::MissingFile),
    }
}

/// Run the blocking pipeline off the async runtime. The error string is
/// ready for display.
async fn run_pipeline(upload: Upload) -> Result<Deliverable, String> {
    let Upload { data, spec } = upload;
    let joined = tokio::task::spawn_blocking(move || process_upload(&data, &spec)).await;
    match joined {
        Ok(Ok(deliverable)) => Ok(deliverable),
        Ok(Err(e)) => Err(failure_message(&e)),
        Err(e) => Err(failure_message(&e)),
    }
}

fn failure_message(e: &dyn fmt::Display) -> String {
    log::error!("conversion failed: {}", e);
    format!("An error occurred: {}", e)
}

// ============================================================================
// Handlers
// ============================================================================

async fn index() -> Html<String> {
    Html(page::render(Outcome::Idle))
}

/// POST /convert
async fn convert_form(multipart: Multipart) -> (StatusCode, Html<String>) {
    let upload = match read_upload(multipart).await {
        Ok(upload) => upload,
        Err(e) => {
            let message = e.to_string();
            return (StatusCode::BAD_REQUEST, Html(page::render(Outcome::Failed(&message))));
        }
    };

    match run_pipeline(upload).await {
        Ok(deliverable) => (
            StatusCode::OK,
            Html(page::render(Outcome::Converted(&deliverable))),
        ),
        Err(message) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Html(page::render(Outcome::Failed(&message))),
        ),
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn api_error(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorResponse { error })).into_response()
}

/// POST /api/convert
async fn convert_api(multipart: Multipart) -> Response {
    let upload = match read_upload(multipart).await {
        Ok(upload) => upload,
        Err(e) => {
            return api_error(StatusCode::BAD_REQUEST, format!("An error occurred: {}", e))
        }
    };

    match run_pipeline(upload).await {
        Ok(deliverable) => {
            let disposition = format!("attachment; filename=\"{}\"", deliverable.file_name);
            (
                [
                    (header::CONTENT_TYPE, DOCX_MIME_TYPE.to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                deliverable.data,
            )
                .into_response()
        }
        Err(message) => api_error(StatusCode::UNPROCESSABLE_ENTITY, message),
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}
