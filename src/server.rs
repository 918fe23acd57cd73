//! HTTP front end.
//!
//! A single conversion endpoint:
//!
//! ```text
//! POST /?startPage=N&endPage=M&images=1      multipart/form-data, field "file"
//!   200 {"pages": [...]}
//!   400 {"error": "..."}   malformed form, missing file, bad page bound
//!   500 {"error": "..."}   workspace, filesystem or pdftotext failure
//!   405 (empty)            any other method
//! ```
//!
//! plus `GET /health` for liveness probes. Any other path behaves like `/`:
//! `POST` converts and every other method gets `405`.
//!
//! [`Server`] is built from an explicit [`ServerConfig`]; nothing is
//! registered globally, so tests can run several servers side by side.

use crate::config::ServerConfig;
use crate::convert::convert;
use crate::error::Pdf2JsonError;
use crate::output::{ConversionRequest, ConversionResponse};
use crate::pipeline::workspace::Workspace;
use axum::{
    extract::{
        multipart::MultipartRejection, rejection::QueryRejection, DefaultBodyLimit, Multipart,
        Query, State,
    },
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

/// Multipart field carrying the PDF.
pub const UPLOAD_FIELD: &str = "file";

/// Shared handler state.
#[derive(Clone)]
struct AppState {
    config: Arc<ServerConfig>,
}

/// The PDF-to-JSON HTTP service.
#[derive(Debug, Clone)]
pub struct Server {
    config: Arc<ServerConfig>,
}

impl Server {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the axum router. Exposed so tests can drive it without a socket.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/", post(convert_upload))
            .route("/health", get(health_check))
            .fallback(unrouted)
            .layer(DefaultBodyLimit::max(self.config.max_upload_bytes))
            .layer(TraceLayer::new_for_http())
            .with_state(AppState {
                config: Arc::clone(&self.config),
            })
    }

    /// Bind `listen_address` and serve until Ctrl+C / SIGTERM.
    pub async fn serve(self) -> std::io::Result<()> {
        let listener = TcpListener::bind(self.config.listen_address.as_str()).await?;
        self.serve_on(listener).await
    }

    /// Serve on an already-bound listener until Ctrl+C / SIGTERM.
    pub async fn serve_on(self, listener: TcpListener) -> std::io::Result<()> {
        info!("pdf2json listening on {}", listener.local_addr()?);
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        info!("Server shutdown complete");
        Ok(())
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Query string as ordered key/value pairs; the first occurrence of a key wins.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(transparent)]
struct ConvertParams(Vec<(String, String)>);

impl ConvertParams {
    fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Resolve the conversion request.
    ///
    /// Absent or empty bounds take their defaults (`startPage=1`,
    /// `endPage=0`). Present bounds must be integers and are clamped to
    /// `startPage ≥ 1` and `endPage ≥ 0`.
    fn to_request(&self) -> Result<ConversionRequest, Pdf2JsonError> {
        Ok(ConversionRequest {
            start_page: parse_page_bound(self.get("startPage"), "startPage", 1)?,
            end_page: parse_page_bound(self.get("endPage"), "endPage", 0)?,
            include_images: self.get("images") == Some("1"),
        })
    }
}

fn parse_page_bound(
    value: Option<&str>,
    name: &'static str,
    min: u32,
) -> Result<u32, Pdf2JsonError> {
    match value {
        None | Some("") => Ok(min),
        Some(v) => {
            let parsed: i64 = v
                .parse()
                .map_err(|_| Pdf2JsonError::InvalidPageArgument { name })?;
            Ok(parsed.clamp(i64::from(min), i64::from(u32::MAX)) as u32)
        }
    }
}

/// `POST /`: convert an uploaded PDF.
async fn convert_upload(
    State(state): State<AppState>,
    query: Result<Query<ConvertParams>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ConversionResponse>, Pdf2JsonError> {
    let Query(params) = query.map_err(|e| Pdf2JsonError::InvalidQuery(e.body_text()))?;
    let workspace = Workspace::create(state.config.work_dir.as_deref())?;
    let result = handle_upload(&state.config, &workspace, &params, multipart).await;
    workspace.close();
    result.map(Json)
}

/// Any path without its own route: `POST` converts, anything else is `405`.
async fn unrouted(
    method: Method,
    state: State<AppState>,
    query: Result<Query<ConvertParams>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    if method != Method::POST {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }
    convert_upload(state, query, multipart).await.into_response()
}

async fn handle_upload(
    config: &ServerConfig,
    workspace: &Workspace,
    params: &ConvertParams,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<ConversionResponse, Pdf2JsonError> {
    // ── Step 1: Stage the upload ─────────────────────────────────────────
    let multipart = multipart.map_err(|e| Pdf2JsonError::InvalidMultipart(e.body_text()))?;
    let written = stage_upload(multipart, workspace.input_path()).await?;
    debug!("Staged {} byte upload at {}", written, workspace.input_path().display());

    // ── Step 2: Parse the page range ─────────────────────────────────────
    let request = params.to_request()?;

    // ── Step 3: Convert ──────────────────────────────────────────────────
    convert(workspace.input_path(), workspace, &request, config).await
}

/// Stream the [`UPLOAD_FIELD`] part of `multipart` into `dest`.
///
/// Returns the number of bytes written. Other fields are skipped.
async fn stage_upload(mut multipart: Multipart, dest: &Path) -> Result<u64, Pdf2JsonError> {
    let upload_err = |source| Pdf2JsonError::UploadWrite {
        path: dest.to_path_buf(),
        source,
    };

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| Pdf2JsonError::InvalidMultipart(e.body_text()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            debug!("Skipping form field {:?}", field.name());
            continue;
        }

        let mut file = tokio::fs::File::create(dest).await.map_err(upload_err)?;
        let mut written = 0u64;
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| Pdf2JsonError::InvalidMultipart(e.body_text()))?
        {
            file.write_all(&chunk).await.map_err(upload_err)?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(upload_err)?;
        return Ok(written);
    }

    Err(Pdf2JsonError::MissingFile {
        field: UPLOAD_FIELD,
    })
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting graceful shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting graceful shutdown..."),
    }
}
