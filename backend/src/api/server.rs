//! HTTP Server for the Data Sweeper API.
//!
//! The server is stateless: every request carries its files and options, and
//! nothing is kept once the response is sent.
//!
//! # API Endpoints
//!
//! | Method | Path              | Description                                   |
//! |--------|-------------------|-----------------------------------------------|
//! | GET    | `/health`         | Health check                                  |
//! | POST   | `/api/upload`     | Upload files, get previews + cleaning reports |
//! | POST   | `/api/download`   | Upload one file, get the cleaned export       |
//! | GET    | `/api/logs`       | SSE stream for real-time logs                 |
//!
//! Multipart fields: `file` (repeatable for `/api/upload`), `remove_duplicates`,
//! `fill_missing` (`true`/`1`/`on`/`yes`), `delimiter` (one character) and, for
//! `/api/download`, `format` (`csv` or `xlsx`).

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_info, log_warning, LOG_BROADCASTER};
use super::types::{error_response, UploadResponse};
use crate::config::AppConfig;
use crate::error::{IngestError, PipelineError, ServerError, ServerResult};
use crate::models::{CleaningRequest, ExportTarget};
use crate::parser::ParseOptions;
use crate::transform::pipeline::{failure_count, process_batch, process_file, ProcessOptions, Upload};

/// Shared, read-only server state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: AppConfig,
}

/// Build the application router.
pub fn router(config: AppConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_DISPOSITION]);

    let body_limit = config.max_upload_bytes;

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/upload", post(upload_files))
        .route("/api/download", post(download_file))
        .route("/api/logs", get(sse_logs))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .with_state(AppState { config })
}

/// Start the HTTP server
pub async fn start_server(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let port = config.port;
    let app = router(config);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🧹 Data Sweeper server running on http://localhost:{}", port);
    println!("   POST /api/upload   - Upload files (preview + cleaning report)");
    println!("   POST /api/download - Download a cleaned file");
    println!("   GET  /api/logs     - SSE log stream");
    println!("   GET  /health       - Health check");
    println!();

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "sweeper",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "upload": "POST /api/upload",
            "download": "POST /api/download",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Upload endpoint: every file is processed, failures are reported per file.
async fn upload_files(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ServerResult<Json<UploadResponse>> {
    let form = read_form(multipart).await?;
    if form.uploads.is_empty() {
        return Err(ServerError::BadRequest("No file provided".to_string()));
    }

    println!("\n{}", "=".repeat(70));
    println!("📤 NEW UPLOAD: {} file(s)", form.uploads.len());
    println!("{}\n", "=".repeat(70));

    let request = form.request;
    let options = ProcessOptions {
        request,
        export: None,
        preview_rows: state.config.preview_rows,
        parse: ParseOptions {
            delimiter: form.delimiter,
        },
    };

    let outcomes = tokio::task::spawn_blocking(move || process_batch(&form.uploads, &options))
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))?;

    let failed = failure_count(&outcomes);
    if failed > 0 {
        log_warning(format!("{} of {} file(s) failed", failed, outcomes.len()));
    }

    Ok(Json(UploadResponse::from_outcomes(outcomes, request)))
}

/// Download endpoint: one file in, its cleaned export out.
async fn download_file(multipart: Multipart) -> ServerResult<Response> {
    let form = read_form(multipart).await?;

    let mut uploads = form.uploads.into_iter();
    let upload = match (uploads.next(), uploads.next()) {
        (Some(upload), None) => upload,
        (None, _) => return Err(ServerError::BadRequest("No file provided".to_string())),
        (Some(_), Some(_)) => {
            return Err(ServerError::BadRequest(
                "Download takes exactly one file".to_string(),
            ))
        }
    };

    let target = form.target.unwrap_or_default();
    let options = ProcessOptions {
        request: form.request,
        export: Some(target),
        preview_rows: 0,
        parse: ParseOptions {
            delimiter: form.delimiter,
        },
    };

    log_info(format!("📥 Download requested: {} as {}", upload.file_name, target));

    let report = tokio::task::spawn_blocking(move || process_file(&upload, &options))
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))??;

    let exported = report
        .export
        .ok_or_else(|| ServerError::Internal("Export was not produced".to_string()))?;

    let disposition = format!(
        "attachment; filename=\"{}\"",
        exported.file_name.replace('"', "'")
    );
    let disposition = HeaderValue::from_str(&disposition)
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(exported.mime_type())),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        exported.bytes,
    )
        .into_response())
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, kind) = match &self {
            ServerError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ServerError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
            ServerError::Pipeline(e) => (pipeline_status(e), e.kind()),
        };

        eprintln!("❌ {}", self);
        (status, Json(error_response(kind, &self.to_string()))).into_response()
    }
}

fn pipeline_status(error: &PipelineError) -> StatusCode {
    match error {
        PipelineError::Ingest(IngestError::UnsupportedFormat { .. }) => {
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        }
        PipelineError::Ingest(_) => StatusCode::BAD_REQUEST,
        PipelineError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Parsed multipart form.
#[derive(Debug, Default)]
struct UploadForm {
    uploads: Vec<Upload>,
    request: CleaningRequest,
    target: Option<ExportTarget>,
    delimiter: Option<char>,
}

impl UploadForm {
    /// Apply one text field. Unknown fields are ignored.
    fn apply_field(&mut self, name: &str, value: &str) -> ServerResult<()> {
        match name {
            "remove_duplicates" | "removeDuplicates" => {
                self.request.remove_duplicates = parse_flag(value);
            }
            "fill_missing" | "fillMissing" | "fill_missing_numeric" => {
                self.request.fill_missing_numeric = parse_flag(value);
            }
            "format" => {
                self.target = Some(value.parse().map_err(ServerError::BadRequest)?);
            }
            "delimiter" => {
                let mut chars = value.chars();
                self.delimiter = match (chars.next(), chars.next()) {
                    (None, _) => None,
                    (Some(c), None) => Some(c),
                    _ => {
                        return Err(ServerError::BadRequest(format!(
                            "Delimiter must be a single character, got '{}'",
                            value
                        )))
                    }
                };
            }
            _ => {}
        }
        Ok(())
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "true" | "1" | "on" | "yes"
    )
}

async fn read_form(mut multipart: Multipart) -> ServerResult<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();

        if name == "file" || name == "files" {
            let file_name = field.file_name().unwrap_or("upload").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
            form.uploads.push(Upload::new(file_name, bytes.to_vec()));
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
            form.apply_field(&name, &value)?;
        }
    }

    Ok(form)
}
