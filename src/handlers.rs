//! HTTP handlers.
//!
//! Every `POST /parse_*` handler reads the `file` field of a multipart form,
//! validates it against its [`DocumentRoute`], and awaits the conversion on
//! the shared [`ConversionPool`]. The async task never runs the conversion
//! itself.

use crate::error::{ApiError, ErrorBody};
use crate::output::ConversionResult;
use crate::pool::ConversionPool;
use crate::routes::{validate_upload, DocumentRoute};
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use std::sync::Arc;

pub const SERVICE_NAME: &str = "markitdown-api";

/// Shared by every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub pool: Arc<ConversionPool>,
}

impl AppState {
    pub fn new(pool: Arc<ConversionPool>) -> Self {
        Self { pool }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

// ── Service info ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    pub message: String,
    pub description: String,
    pub version: String,
    pub endpoints: Vec<String>,
    pub credits: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
}

/// `GET /`
#[utoipa::path(
    get,
    path = "/",
    tag = "service",
    summary = "Service information",
    responses((status = 200, description = "Service name, version and endpoint list", body = ServiceInfo))
)]
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        message: "MarkItDown API".to_string(),
        description: "Convert various file formats to Markdown".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints: DocumentRoute::ALL
            .iter()
            .map(|route| format!("{} - {}", route.path(), route.description()))
            .collect(),
        credits: "Built on pdf-extract, calamine, quick-xml and html2md".to_string(),
    })
}

/// `GET /health`
#[utoipa::path(
    get,
    path = "/health",
    tag = "service",
    summary = "Liveness check",
    responses((status = 200, description = "Service is up", body = HealthStatus))
)]
pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
    })
}

/// Fallback for unknown paths.
pub async fn not_found() -> (StatusCode, Json<ErrorBody>) {
    error_body(StatusCode::NOT_FOUND, "Not Found")
}

/// Fallback for known paths hit with the wrong method.
pub async fn method_not_allowed() -> (StatusCode, Json<ErrorBody>) {
    error_body(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
}

fn error_body(status: StatusCode, detail: &str) -> (StatusCode, Json<ErrorBody>) {
    (
        status,
        Json(ErrorBody {
            detail: detail.to_string(),
        }),
    )
}

// ── Conversion endpoints ─────────────────────────────────────────────────

/// `POST /parse_pdf`
#[utoipa::path(
    post,
    path = "/parse_pdf",
    tag = "conversion",
    summary = "Convert a PDF document to Markdown",
    request_body(
        content_type = "multipart/form-data",
        description = "Form field `file` holding a `.pdf` upload"
    ),
    responses(
        (status = 200, description = "Converted document", body = ConversionResult),
        (status = 400, description = "Missing file, wrong extension, empty body or invalid multipart", body = ErrorBody),
        (status = 500, description = "Conversion failed", body = ErrorBody)
    )
)]
pub async fn parse_pdf(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<ConversionResult>> {
    process_upload(&state, DocumentRoute::Pdf, multipart).await
}

/// `POST /parse_docx`
#[utoipa::path(
    post,
    path = "/parse_docx",
    tag = "conversion",
    summary = "Convert a Word document to Markdown",
    request_body(
        content_type = "multipart/form-data",
        description = "Form field `file` holding a `.docx` upload"
    ),
    responses(
        (status = 200, description = "Converted document", body = ConversionResult),
        (status = 400, description = "Missing file, wrong extension, empty body or invalid multipart", body = ErrorBody),
        (status = 500, description = "Conversion failed", body = ErrorBody)
    )
)]
pub async fn parse_docx(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<ConversionResult>> {
    process_upload(&state, DocumentRoute::Docx, multipart).await
}

/// `POST /parse_xlsx`
#[utoipa::path(
    post,
    path = "/parse_xlsx",
    tag = "conversion",
    summary = "Convert a Excel workbook to Markdown",
    request_body(
        content_type = "multipart/form-data",
        description = "Form field `file` holding a `.xlsx` or `.xls` upload"
    ),
    responses(
        (status = 200, description = "Converted document", body = ConversionResult),
        (status = 400, description = "Missing file, wrong extension, empty body or invalid multipart", body = ErrorBody),
        (status = 500, description = "Conversion failed", body = ErrorBody)
    )
)]
pub async fn parse_xlsx(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<ConversionResult>> {
    process_upload(&state, DocumentRoute::Xlsx, multipart).await
}

/// `POST /parse_pptx`
#[utoipa::path(
    post,
    path = "/parse_pptx",
    tag = "conversion",
    summary = "Convert a PowerPoint presentation to Markdown",
    request_body(
        content_type = "multipart/form-data",
        description = "Form field `file` holding a `.pptx` or `.ppt` upload"
    ),
    responses(
        (status = 200, description = "Converted document", body = ConversionResult),
        (status = 400, description = "Missing file, wrong extension, empty body or invalid multipart", body = ErrorBody),
        (status = 500, description = "Conversion failed", body = ErrorBody)
    )
)]
pub async fn parse_pptx(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<ConversionResult>> {
    process_upload(&state, DocumentRoute::Pptx, multipart).await
}

/// `POST /parse_html`
#[utoipa::path(
    post,
    path = "/parse_html",
    tag = "conversion",
    summary = "Convert a HTML page to Markdown",
    request_body(
        content_type = "multipart/form-data",
        description = "Form field `file` holding a `.html` or `.htm` upload"
    ),
    responses(
        (status = 200, description = "Converted document", body = ConversionResult),
        (status = 400, description = "Missing file, wrong extension, empty body or invalid multipart", body = ErrorBody),
        (status = 500, description = "Conversion failed", body = ErrorBody)
    )
)]
pub async fn parse_html(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<ConversionResult>> {
    process_upload(&state, DocumentRoute::Html, multipart).await
}

async fn process_upload(
    state: &AppState,
    route: DocumentRoute,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<ConversionResult>> {
    let multipart = multipart.map_err(|e| ApiError::bad_request(format!("Invalid multipart request: {}", e.body_text())))?;
    let (filename, bytes) = read_file_field(multipart).await?;
    let upload = validate_upload(route, filename, bytes)?;

    tracing::info!(
        route = route.path(),
        filename = %upload.filename,
        file_size = upload.len(),
        "Converting upload"
    );

    let filename = upload.filename.clone();
    let result = state
        .pool
        .submit(upload, route.file_kind())
        .await
        .map_err(|source| ApiError::Conversion { filename, source })?;

    tracing::debug!(
        filename = %result.filename,
        markdown_len = result.markdown_content.len(),
        "Conversion complete"
    );
    Ok(Json(result))
}

/// Find the `file` field and read it fully. Other fields are skipped.
///
/// Returns `(None, empty)` when the form has no `file` field; validation
/// turns that into "No file provided".
async fn read_file_field(mut multipart: Multipart) -> Result<(Option<String>, Vec<u8>)> {
    let invalid = |e: axum::extract::multipart::MultipartError| {
        ApiError::bad_request(format!("Invalid multipart request: {}", e.body_text()))
    };

    while let Some(field) = multipart.next_field().await.map_err(invalid)? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().map(str::to_string);
        let bytes = field.bytes().await.map_err(invalid)?;
        return Ok((filename, bytes.to_vec()));
    }

    Ok((None, Vec::new()))
}
