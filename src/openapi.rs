//! OpenAPI document for the HTTP surface.
//!
//! Served as JSON at `/openapi.json` and browsable with RapiDoc at `/docs`.

use crate::error::ErrorBody;
use crate::handlers::{self, HealthStatus, ServiceInfo};
use crate::output::{ConversionMetadata, ConversionResult, FileKind};
use utoipa::OpenApi;

/// Where the raw document is served.
pub const OPENAPI_PATH: &str = "/openapi.json";
/// Where the RapiDoc viewer is served.
pub const DOCS_PATH: &str = "/docs";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "MarkItDown API",
        description = "Convert PDF, Word, Excel, PowerPoint and HTML uploads to Markdown."
    ),
    paths(
        handlers::root,
        handlers::health,
        handlers::parse_pdf,
        handlers::parse_docx,
        handlers::parse_xlsx,
        handlers::parse_pptx,
        handlers::parse_html,
    ),
    components(schemas(
        ConversionResult,
        ConversionMetadata,
        FileKind,
        ErrorBody,
        ServiceInfo,
        HealthStatus,
    )),
    tags(
        (name = "conversion", description = "Upload a document as multipart/form-data and get Markdown back."),
        (name = "service", description = "Service information and liveness."),
    )
)]
pub struct ApiDoc;
