//! # edgequake-pdf2json
//!
//! Turn PDF documents into per-page JSON (text plus, optionally, embedded
//! images) using the poppler command-line tools, as a library or an HTTP
//! service.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF upload
//!  │
//!  ├─ 1. Workspace  per-request temp dir, removed on every exit path
//!  ├─ 2. Text       pdftotext -raw [-f N] [-l M] input.pdf -
//!  ├─ 3. Pages      split on form-feed, number from startPage
//!  ├─ 4. Images     pdfimages -png -p … (optional, failures tolerated)
//!  ├─ 5. Index      file name → page number, bytes → data URI
//!  └─ 6. Output     {"pages": [{"pageNumber", "text", "images"}]}
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdf2json::{convert_file, ConversionRequest, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::default();
//!     let request = ConversionRequest { include_images: true, ..Default::default() };
//!     let doc = convert_file("document.pdf", &request, &config).await?;
//!     println!("{}", serde_json::to_string_pretty(&doc)?);
//!     Ok(())
//! }
//! ```
//!
//! Running the service:
//!
//! ```rust,no_run
//! use edgequake_pdf2json::{Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     Server::new(ServerConfig::default()).serve().await
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2json` binary (clap + anyhow + tracing-subscriber) |
//!
//! `pdftotext` and `pdfimages` (poppler-utils) must be installed at runtime.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ServerConfig, ServerConfigBuilder, ToolConfig};
pub use convert::{convert, convert_file, convert_from_bytes};
pub use error::{Pdf2JsonError, Result};
pub use output::{ConversionRequest, ConversionResponse, ExtractedImage, ImagesByPage, Page};
pub use pipeline::workspace::Workspace;
pub use server::Server;
