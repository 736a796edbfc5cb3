//! Router assembly and the serving loop.

use crate::config::ServerConfig;
use crate::converter::DocumentConverter;
use crate::error::{ErrorBody, GENERIC_SERVER_ERROR};
use crate::handlers::{self, AppState};
use crate::openapi::{ApiDoc, DOCS_PATH, OPENAPI_PATH};
use crate::pool::ConversionPool;
use crate::routes::DocumentRoute;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, MethodRouter};
use axum::{Json, Router};
use std::any::Any;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{info, Level};
use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

fn conversion_handler(route: DocumentRoute) -> MethodRouter<AppState> {
    match route {
        DocumentRoute::Pdf => post(handlers::parse_pdf),
        DocumentRoute::Docx => post(handlers::parse_docx),
        DocumentRoute::Xlsx => post(handlers::parse_xlsx),
        DocumentRoute::Pptx => post(handlers::parse_pptx),
        DocumentRoute::Html => post(handlers::parse_html),
    }
}

/// Build the full router: endpoints, API docs, fallbacks, and middleware.
///
/// CORS mirrors the request origin and allows credentials.
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    let mut router = Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health));
    for route in DocumentRoute::ALL {
        router = router.route(route.path(), conversion_handler(route));
    }

    let body_limit = match config.max_upload_bytes {
        Some(limit) => DefaultBodyLimit::max(limit),
        None => DefaultBodyLimit::disable(),
    };

    router
        .method_not_allowed_fallback(handlers::method_not_allowed)
        .fallback(handlers::not_found)
        .with_state(state)
        .merge(RapiDoc::with_openapi(OPENAPI_PATH, ApiDoc::openapi()).path(DOCS_PATH))
        .layer(body_limit)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(CorsLayer::very_permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// Turn a handler panic into the generic 500 body.
fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = payload
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| payload.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_else(|| "unknown panic payload".to_string());
    tracing::error!(error = %detail, "Handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            detail: GENERIC_SERVER_ERROR.to_string(),
        }),
    )
        .into_response()
}

/// The running service: configuration, worker pool, and router.
pub struct Application {
    config: ServerConfig,
    router: Router,
}

impl Application {
    /// Start the conversion pool and build the router.
    pub fn new(config: ServerConfig, converter: Arc<dyn DocumentConverter>) -> std::io::Result<Self> {
        let pool = Arc::new(ConversionPool::new(config.workers, converter)?);
        let router = build_router(AppState::new(pool), &config);
        Ok(Self { config, router })
    }

    /// The assembled router, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests.
    pub async fn serve<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(bind_addr).await?;
        info!(
            workers = self.config.workers,
            max_upload_bytes = ?self.config.max_upload_bytes,
            "markitdown-api listening on http://{}",
            listener.local_addr()?
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_handler_hides_payload() {
        let response = handle_panic(Box::new("secret stack detail"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
