//! # markitdown-api
//!
//! HTTP service that converts uploaded documents (PDF, Word, Excel,
//! PowerPoint, HTML) to Markdown and returns the result as JSON.
//!
//! ## Request Flow
//!
//! ```text
//! POST /parse_<fmt>  (multipart, field "file")
//!  │
//!  ├─ 1. Validate  filename present, extension allowed, body non-empty
//!  ├─ 2. Queue     job handed to the fixed-size ConversionPool
//!  ├─ 3. Convert   DocumentConverter on a worker thread (blocking)
//!  ├─ 4. Polish    Markdown cleanup (whitespace, headings, tables)
//!  └─ 5. Respond   ConversionResult JSON, or {"detail": ...} on error
//! ```
//!
//! Validation failures are 400s with a readable reason. Conversion failures
//! are 500s with a generic message; the cause is only logged.
//!
//! The OpenAPI document is served at `/openapi.json`, with a RapiDoc viewer
//! at `/docs`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use markitdown_api::{Application, NativeConverter, ServerConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let config = ServerConfig::builder().port(8080).workers(2).build().unwrap();
//!     let app = Application::new(config, Arc::new(NativeConverter::new()))?;
//!     app.serve(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `markitdown-api` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when embedding the router in another service:
//! ```toml
//! markitdown-api = { version = "1.0", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod converter;
pub mod error;
pub mod formats;
pub mod handlers;
pub mod openapi;
pub mod output;
pub mod pool;
pub mod postprocess;
pub mod routes;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ServerConfig, ServerConfigBuilder};
pub use converter::{build_result, convert_upload, DocumentConverter, NativeConverter};
pub use error::{ApiError, ConfigError, ConversionError};
pub use handlers::AppState;
pub use openapi::ApiDoc;
pub use output::{ConversionMetadata, ConversionResult, ConvertedDocument, FileKind, UploadedFile};
pub use pool::ConversionPool;
pub use routes::DocumentRoute;
pub use server::{build_router, Application};
