//! HTTP frontend
//!
//! `POST /search` runs a search and answers with ranked results, each
//! carrying the URL of its highlight derivative. Original and highlighted
//! files are served back inline from the four file routes.

mod handlers;

use anyhow::{Context, Result};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::SearchError;
use crate::search::SearchService;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub allow_cors: bool,
    /// Base for result URLs; the request's `Host` header is used when unset
    pub public_url: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<SearchService>,
    pub public_url: Option<String>,
}

impl SearchError {
    pub fn status(&self) -> StatusCode {
        match self {
            SearchError::EmptyKeyword | SearchError::InvalidPath(_) => StatusCode::BAD_REQUEST,
            SearchError::FolderNotFound(_) | SearchError::FileNotFound(_) => StatusCode::NOT_FOUND,
            SearchError::Load(_) | SearchError::Highlight { .. } | SearchError::Task(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for SearchError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            SearchError::FolderNotFound(path) | SearchError::FileNotFound(path) => {
                tracing::debug!("{}: {}", self, path.display());
            }
            _ if status.is_server_error() => tracing::error!("{}", self),
            _ => tracing::debug!("{}", self),
        }

        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

pub fn build_router(state: AppState, allow_cors: bool) -> Router {
    let router = Router::new()
        .route("/search", post(handlers::search))
        .route(
            "/highlighted_pdfs/{folder}/{*file}",
            get(handlers::highlighted_pdf),
        )
        .route(
            "/highlighted_docx/{folder}/{*file}",
            get(handlers::highlighted_docx),
        )
        .route("/pdfs/{folder}/{*file}", get(handlers::pdf))
        .route("/docx/{folder}/{*file}", get(handlers::docx))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http());

    let router = if allow_cors {
        tracing::info!("Enabling CORS");
        router.layer(CorsLayer::permissive())
    } else {
        router
    };

    router.with_state(state)
}

pub async fn start_server(service: SearchService, config: ServerConfig) -> Result<()> {
    tracing::info!(
        "Serving folders under {}",
        service.config().base_dir.display()
    );

    let state = AppState {
        service: Arc::new(service),
        public_url: config.public_url,
    };
    let router = build_router(state, config.allow_cors);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    tracing::info!("Listening on http://{}", config.bind);

    axum::serve(listener, router)
        .await
        .context("HTTP server failed")
}
