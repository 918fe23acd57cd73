//! Text extraction via `pdftotext`.
//!
//! `-raw` keeps text in content-stream order with physical line breaks
//! instead of reflowed paragraphs. Output goes to stdout (`-`), with a
//! form-feed between consecutive pages; [`super::aggregate`] splits on it.

use super::tool;
use crate::config::ToolConfig;
use crate::error::Pdf2JsonError;
use std::ffi::OsString;
use std::path::Path;
use tracing::info;

/// Argument list for `pdftotext`: `-raw [-f N] [-l N] <input> -`.
pub fn text_args(input: &Path, start_page: u32, end_page: u32) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-raw".into()];
    args.extend(tool::page_range_args(start_page, end_page));
    args.push(input.as_os_str().to_owned());
    args.push("-".into());
    args
}

/// Extract raw text for the given page range.
///
/// Any failure, including a non-zero exit, is an error: without text there
/// is nothing to return.
pub async fn extract_text(
    pdftotext: &ToolConfig,
    input: &Path,
    start_page: u32,
    end_page: u32,
) -> Result<String, Pdf2JsonError> {
    let args = text_args(input, start_page, end_page);
    let output = tool::run(pdftotext, &args).await?.check(pdftotext)?;

    let text = String::from_utf8_lossy(&output.stdout).into_owned();
    info!("Extracted {} bytes of text from {}", text.len(), input.display());
    Ok(text)
}
