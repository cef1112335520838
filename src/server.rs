//! HTTP API for uploading, analyzing, and exporting PDFs.
//!
//! # Endpoints
//!
//! All routes are mounted under `/api/v1`.
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Database connectivity check |
//! | `GET`  | `/test_connection` | Liveness check, no database access |
//! | `POST` | `/upload_pdf` | Multipart upload (field `file`) |
//! | `POST` | `/analyze_pdf/{pdf_id}` | Run component extraction |
//! | `GET`  | `/analysis_results/{pdf_id}` | Components found so far |
//! | `GET`  | `/analysis_results/{pdf_id}/export?format=json\|csv` | Download results |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "not_found", "message": "PDF with id 7 not found" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `storage_error` (500),
//! `service_unavailable` (503), `internal` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so a browser frontend on
//! another port can call the API.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db;
use crate::error::AnalyzerError;
use crate::migrate;
use crate::models::AnalysisRecord;
use crate::pipeline::Pipeline;
use crate::store::SqliteStore;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
}

/// Starts the HTTP server on `[server].bind`.
///
/// Opens the SQLite pool, applies the schema (idempotent), and serves until
/// the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let pool = db::connect(config).await?;
    migrate::apply_schema(&pool).await?;
    tokio::fs::create_dir_all(&config.uploads.dir).await?;

    let store = Arc::new(SqliteStore::new(pool));
    let pipeline = Arc::new(Pipeline::from_config(config, store));
    let app = router(AppState { pipeline });

    tracing::info!(
        bind = %config.server.bind,
        uploads = %config.uploads.dir.display(),
        read_policy = %config.analysis.read_policy,
        "server listening"
    );
    println!("Server listening on http://{}", config.server.bind);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Builds the full router. Exposed so tests can drive it without a socket.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Leave headroom over the file itself for multipart framing.
    let body_limit = state.pipeline.uploads().max_bytes().saturating_add(64 * 1024);

    let api = Router::new()
        .route("/health", get(handle_health))
        .route("/test_connection", get(handle_test_connection))
        .route("/upload_pdf", post(handle_upload))
        .route("/analyze_pdf/{pdf_id}", post(handle_analyze))
        .route("/analysis_results/{pdf_id}", get(handle_results))
        .route("/analysis_results/{pdf_id}/export", get(handle_export));

    Router::new()
        .nest("/api/v1", api)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g., `"bad_request"`, `"not_found"`).
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

/// Maps domain errors to statuses. Storage and I/O details are logged but
/// not echoed to the client.
impl From<AnalyzerError> for AppError {
    fn from(err: AnalyzerError) -> Self {
        match err {
            AnalyzerError::NotFound(_) => AppError {
                status: StatusCode::NOT_FOUND,
                code: "not_found".to_string(),
                message: err.to_string(),
            },
            AnalyzerError::FileMissing(ref path) => {
                tracing::error!(path = %path.display(), "catalogued PDF missing on disk");
                AppError {
                    status: StatusCode::NOT_FOUND,
                    code: "not_found".to_string(),
                    message: "PDF file consistency error - file not found on server".to_string(),
                }
            }
            AnalyzerError::InvalidArgument(msg) => bad_request(msg),
            AnalyzerError::Storage(ref e) => {
                tracing::error!(error = %e, "database error");
                AppError {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    code: "storage_error".to_string(),
                    message: "Database error".to_string(),
                }
            }
            AnalyzerError::Io(_) | AnalyzerError::Serialization(_) => {
                tracing::error!(error = %err, "request failed");
                AppError {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    code: "internal".to_string(),
                    message: "An internal server error occurred".to_string(),
                }
            }
        }
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    database_version: String,
    version: &'static str,
}

async fn handle_health(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    match state.pipeline.store().ping().await {
        Ok(database_version) => Ok(Json(HealthResponse {
            status: "ok",
            database_version,
            version: env!("CARGO_PKG_VERSION"),
        })),
        Err(e) => {
            tracing::error!(error = %e, "health check failed");
            Err(AppError {
                status: StatusCode::SERVICE_UNAVAILABLE,
                code: "service_unavailable".to_string(),
                message: "Service unavailable or database connection failed".to_string(),
            })
        }
    }
}

// ============ GET /test_connection ============

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

async fn handle_test_connection() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Backend connection successful!".to_string(),
    })
}

// ============ POST /upload_pdf ============

#[derive(Serialize)]
struct UploadResponse {
    message: String,
    pdf_id: i64,
}

async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    let mut upload: Option<(String, axum::body::Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(|e| bad_request(e.to_string()))?;
        upload = Some((filename, bytes));
        break;
    }

    let (filename, bytes) = upload.ok_or_else(|| bad_request("No file part in the request"))?;
    let summary = state.pipeline.upload(&filename, &bytes).await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            message: "PDF uploaded successfully".to_string(),
            pdf_id: summary.pdf_id,
        }),
    ))
}

// ============ POST /analyze_pdf/{pdf_id} ============

#[derive(Serialize)]
struct AnalyzeResponse {
    message: String,
    analysis_id: i64,
    components_found: usize,
    extraction_degraded: bool,
}

async fn handle_analyze(
    State(state): State<AppState>,
    Path(pdf_id): Path<i64>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let summary = state.pipeline.analyze(pdf_id).await?;
    Ok(Json(AnalyzeResponse {
        message: format!("Analysis complete for PDF ID {}", pdf_id),
        analysis_id: summary.analysis_id,
        components_found: summary.components_found,
        extraction_degraded: summary.extraction_degraded,
    }))
}

// ============ GET /analysis_results/{pdf_id} ============

async fn handle_results(
    State(state): State<AppState>,
    Path(pdf_id): Path<i64>,
) -> Result<Json<AnalysisRecord>, AppError> {
    Ok(Json(state.pipeline.get_results(pdf_id).await?))
}

// ============ GET /analysis_results/{pdf_id}/export ============

#[derive(Deserialize)]
struct ExportQuery {
    format: Option<String>,
}

async fn handle_export(
    State(state): State<AppState>,
    Path(pdf_id): Path<i64>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, AppError> {
    let format = query.format.as_deref().unwrap_or("json");
    let payload = state.pipeline.export(pdf_id, format).await?;

    let disposition = format!("attachment; filename=\"{}\"", payload.filename);
    Ok((
        [
            (header::CONTENT_TYPE, payload.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        payload.body,
    )
        .into_response())
}
