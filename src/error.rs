//! Error types for the edgequake-pdf2json library and service.
//!
//! A single [`Pdf2JsonError`] covers every way a conversion can end early.
//! Variants fall into three groups that map onto HTTP status codes:
//!
//! * **Validation**: the request itself is unusable (malformed query or
//!   multipart body, missing upload field, non-numeric page bound). Mapped
//!   to `400`.
//! * **Resource**: the workspace or a file inside it could not be created,
//!   written or read. Mapped to `500`.
//! * **Tool**: an external poppler executable could not be started, exited
//!   non-zero, or ran past the configured timeout. Mapped to `500`.
//!
//! `pdfimages` exiting non-zero is *not* an error: see
//! [`crate::pipeline::images::extract_images`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Library-wide result type.
pub type Result<T> = std::result::Result<T, Pdf2JsonError>;

/// All errors returned by the edgequake-pdf2json library.
#[derive(Debug, Error)]
pub enum Pdf2JsonError {
    // ── Validation errors ─────────────────────────────────────────────────
    /// The request body is not a readable multipart form.
    #[error("{0}")]
    InvalidMultipart(String),

    /// The query string could not be decoded.
    #[error("invalid query string: {0}")]
    InvalidQuery(String),

    /// The multipart form has no field with the expected name.
    #[error("missing form field '{field}'")]
    MissingFile { field: &'static str },

    /// A page-range query parameter is not an integer.
    #[error("invalid {name} argument")]
    InvalidPageArgument { name: &'static str },

    // ── Resource errors ───────────────────────────────────────────────────
    /// The per-request workspace (or a directory inside it) could not be created.
    #[error("failed to create workspace: {source}")]
    Workspace {
        #[source]
        source: std::io::Error,
    },

    /// The uploaded PDF could not be written into the workspace.
    #[error("failed to write upload to '{path}': {source}")]
    UploadWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An extracted image (or the directory holding them) could not be read.
    #[error("failed to read extracted images at '{path}': {source}")]
    ImageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `pdfimages` produced a file whose name does not carry a page number.
    #[error("unexpected image file name '{name}': no page number token")]
    MalformedImageName { name: String },

    // ── Tool errors ───────────────────────────────────────────────────────
    /// The executable could not be started (not installed, not executable).
    #[error("failed to start {tool}: {source}")]
    ToolSpawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// The executable ran and exited unsuccessfully.
    #[error("{tool} failed ({status}){}", format_stderr(.stderr))]
    ToolFailed {
        tool: String,
        status: ExitStatus,
        stderr: String,
    },

    /// The executable did not finish within the configured timeout and was killed.
    #[error("{tool} timed out after {secs}s")]
    ToolTimeout { tool: String, secs: u64 },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

fn format_stderr(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}

impl Pdf2JsonError {
    /// HTTP status code this error is reported with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Pdf2JsonError::InvalidMultipart(_)
            | Pdf2JsonError::InvalidQuery(_)
            | Pdf2JsonError::MissingFile { .. }
            | Pdf2JsonError::InvalidPageArgument { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response body: `{"error": "<message>"}`.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for Pdf2JsonError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::warn!("Rejected request: {}", self);
        }

        let body = Json(ErrorResponse {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}
