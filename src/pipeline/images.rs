//! Embedded image extraction via `pdfimages`.
//!
//! `-png` converts every image to PNG and `-p` puts the source page number
//! in each file name (`img-<page>-<index>.png`), which is what
//! [`super::loader`] keys on.
//!
//! Unlike text extraction, a non-zero exit does **not** fail the request:
//! a document whose images cannot be extracted still has useful text, so the
//! failure is logged and treated as "no images". Only a tool that cannot be
//! started at all (or hangs past its timeout) is an error. Do not "fix" this
//! into a hard failure.

use super::tool;
use crate::config::ToolConfig;
use crate::error::Pdf2JsonError;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File-name root passed to `pdfimages`; output lands in `<dir>/img-…`.
pub const IMAGE_ROOT: &str = "img";

/// Argument list for `pdfimages`: `-png -p [-f N] [-l N] <input> <dir>/img`.
pub fn image_args(input: &Path, start_page: u32, end_page: u32, output_dir: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-png".into(), "-p".into()];
    args.extend(tool::page_range_args(start_page, end_page));
    args.push(input.as_os_str().to_owned());
    args.push(image_root(output_dir).into_os_string());
    args
}

fn image_root(output_dir: &Path) -> PathBuf {
    output_dir.join(IMAGE_ROOT)
}

/// Extract the images of the given page range into `output_dir`.
///
/// Returns `Ok(())` when the tool exits non-zero; whatever files it managed
/// to write (possibly none) are left for the loader.
pub async fn extract_images(
    pdfimages: &ToolConfig,
    input: &Path,
    start_page: u32,
    end_page: u32,
    output_dir: &Path,
) -> Result<(), Pdf2JsonError> {
    let args = image_args(input, start_page, end_page, output_dir);
    let output = tool::run(pdfimages, &args).await?;

    if let Err(e) = output.check(pdfimages) {
        warn!("Ignoring image extraction failure for {}: {}", input.display(), e);
    } else {
        debug!("Images extracted to {}", output_dir.display());
    }
    Ok(())
}
