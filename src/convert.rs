//! Conversion entry points.
//!
//! [`convert`] is the core flow shared by the HTTP handler and the CLI: it
//! runs on a PDF that is already on disk and uses a caller-owned
//! [`Workspace`] for scratch files. [`convert_file`] and
//! [`convert_from_bytes`] wrap it with their own workspace for library users
//! who do not manage one.

use crate::config::ServerConfig;
use crate::error::Pdf2JsonError;
use crate::output::{ConversionRequest, ConversionResponse};
use crate::pipeline::{aggregate, images, loader, text, workspace::Workspace};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Extract the pages of `input` described by `request`.
///
/// Steps, each ending the conversion on failure:
/// 1. `pdftotext` over the page range
/// 2. split into pages numbered from `request.start_page`
/// 3. when `request.include_images` and images are enabled: create the
///    workspace `images/` dir, run `pdfimages` (a non-zero exit only means
///    "no images"), load the files and attach them to their pages
pub async fn convert(
    input: &Path,
    workspace: &Workspace,
    request: &ConversionRequest,
    config: &ServerConfig,
) -> Result<ConversionResponse, Pdf2JsonError> {
    let start = Instant::now();
    info!(
        "Converting {} (pages {}..{}, images: {})",
        input.display(),
        request.start_page,
        if request.end_page == 0 {
            "end".to_string()
        } else {
            request.end_page.to_string()
        },
        request.include_images
    );

    // ── Step 1: Text ─────────────────────────────────────────────────────
    let raw = text::extract_text(&config.pdftotext, input, request.start_page, request.end_page)
        .await?;

    // ── Step 2: Pages ────────────────────────────────────────────────────
    let mut response = aggregate::aggregate(&raw, request.start_page);
    debug!("Split text into {} pages", response.pages.len());

    // ── Step 3: Images ───────────────────────────────────────────────────
    if request.include_images {
        if config.images_enabled {
            let dir = workspace.create_images_dir().await?;
            images::extract_images(
                &config.pdfimages,
                input,
                request.start_page,
                request.end_page,
                dir,
            )
            .await?;
            let by_page = loader::load_images(dir).await?;
            aggregate::merge_images(&mut response, by_page);
        } else {
            debug!("Image extraction requested but disabled by configuration");
        }
    }

    info!(
        "Conversion complete: {} pages in {}ms",
        response.pages.len(),
        start.elapsed().as_millis()
    );
    Ok(response)
}

/// Convert a PDF already on disk, using a private workspace for images.
pub async fn convert_file(
    input: impl AsRef<Path>,
    request: &ConversionRequest,
    config: &ServerConfig,
) -> Result<ConversionResponse, Pdf2JsonError> {
    let workspace = Workspace::create(config.work_dir.as_deref())?;
    let result = convert(input.as_ref(), &workspace, request, config).await;
    workspace.close();
    result
}

/// Convert PDF bytes held in memory.
///
/// The bytes are staged as `input.pdf` inside a private workspace, which is
/// removed before returning.
pub async fn convert_from_bytes(
    bytes: &[u8],
    request: &ConversionRequest,
    config: &ServerConfig,
) -> Result<ConversionResponse, Pdf2JsonError> {
    let workspace = Workspace::create(config.work_dir.as_deref())?;
    let input = workspace.input_path().to_path_buf();
    tokio::fs::write(&input, bytes)
        .await
        .map_err(|source| Pdf2JsonError::UploadWrite {
            path: input.clone(),
            source,
        })?;

    let result = convert(&input, &workspace, request, config).await;
    workspace.close();
    result
}
