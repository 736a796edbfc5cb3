//! Server binary for markitdown-api.
//!
//! A thin shim over the library crate that maps CLI flags to `ServerConfig`
//! and runs the HTTP service until Ctrl+C or SIGTERM.

use anyhow::{Context, Result};
use clap::Parser;
use markitdown_api::{Application, NativeConverter, ServerConfig};
use std::io;
use std::net::IpAddr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Serve on the default address (0.0.0.0:8000) with 4 workers
  markitdown-api

  # Local-only, 8 conversion workers, 50 MB upload cap
  markitdown-api --host 127.0.0.1 --workers 8 --max-upload-bytes 52428800

  # Convert a file against a running server
  curl -F "file=@report.pdf" http://localhost:8000/parse_pdf

ENDPOINTS:
  GET  /             Service information
  GET  /health       Liveness check
  POST /parse_pdf    pdf
  POST /parse_docx   docx
  POST /parse_xlsx   xlsx, xls
  POST /parse_pptx   pptx, ppt
  POST /parse_html   html, htm
  GET  /openapi.json OpenAPI document
  GET  /docs         API reference (RapiDoc)

ENVIRONMENT VARIABLES:
  RUST_LOG                      Overrides the log filter (e.g. markitdown_api=debug)
"#;

/// Convert uploaded documents to Markdown over HTTP.
#[derive(Parser, Debug)]
#[command(
    name = "markitdown-api",
    version,
    about = "Convert uploaded documents to Markdown over HTTP",
    long_about = "HTTP service that accepts PDF, Word, Excel, PowerPoint and HTML uploads \
as multipart/form-data and returns Markdown plus document metadata as JSON.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Address to bind.
    #[arg(long, env = "MARKITDOWN_HOST", default_value = "0.0.0.0")]
    host: IpAddr,

    /// Port to listen on.
    #[arg(short, long, env = "MARKITDOWN_PORT", default_value_t = 8000)]
    port: u16,

    /// Number of conversion worker threads.
    #[arg(short, long, env = "MARKITDOWN_WORKERS", default_value_t = 4)]
    workers: usize,

    /// Reject request bodies larger than this many bytes (no limit when unset).
    #[arg(long, env = "MARKITDOWN_MAX_UPLOAD_BYTES")]
    max_upload_bytes: Option<usize>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "MARKITDOWN_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "MARKITDOWN_QUIET", conflicts_with = "verbose")]
    quiet: bool,
}

/// Wait for shutdown signal (SIGTERM or Ctrl+C).
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down gracefully...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    tracing::debug!("{:?}", cli);

    // ── Configuration ────────────────────────────────────────────────────
    let config = ServerConfig::builder()
        .host(cli.host)
        .port(cli.port)
        .workers(cli.workers)
        .max_upload_bytes(cli.max_upload_bytes)
        .build()
        .context("Invalid server configuration")?;

    let app = Application::new(config, Arc::new(NativeConverter::new()))
        .context("Failed to start conversion workers")?;

    app.serve(shutdown_signal())
        .await
        .context("Server terminated with an error")
}
