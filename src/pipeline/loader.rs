//! Loading extracted images back from disk and indexing them by page.
//!
//! `pdfimages -p` names its output `<root>-<page>-<index>.<ext>`. That naming
//! convention is the only link between a file and its page, so it is parsed
//! in exactly one place: [`page_number_from_file_name`]. A name that does not
//! fit is fatal rather than skipped, since it means the installed poppler
//! behaves differently from what this crate expects.

use crate::error::Pdf2JsonError;
use crate::output::{ExtractedImage, ImagesByPage};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::Path;
use tracing::debug;

/// MIME type used in the data URI when the format cannot be sniffed.
/// `pdfimages -png` only writes PNG, so this is the expected case anyway.
const FALLBACK_MIME: &str = "image/png";

/// Page number encoded in a `pdfimages -p` output file name.
///
/// The page is the second-to-last `-`-delimited token:
/// `img-7-000.png` → `7`.
pub fn page_number_from_file_name(name: &str) -> Result<u64, Pdf2JsonError> {
    let malformed = || Pdf2JsonError::MalformedImageName {
        name: name.to_string(),
    };

    let mut tokens = name.rsplit('-');
    let _index = tokens.next();
    let page = tokens.next().ok_or_else(malformed)?;
    page.parse().map_err(|_| malformed())
}

/// Wrap raw image bytes as an [`ExtractedImage`] data URI.
pub fn encode_image(bytes: &[u8]) -> ExtractedImage {
    let mimetype = image::guess_format(bytes)
        .ok()
        .map(|f| f.to_mime_type().to_string());
    let mime = mimetype.as_deref().unwrap_or(FALLBACK_MIME);

    ExtractedImage {
        data: format!("data:{};base64,{}", mime, STANDARD.encode(bytes)),
        mimetype,
    }
}

/// Read every image file in `dir` and group it by source page.
///
/// Sub-directories are ignored. Within a page, images keep the order the
/// directory listing returned them in; no other sorting is applied.
pub async fn load_images(dir: &Path) -> Result<ImagesByPage, Pdf2JsonError> {
    let read_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| Pdf2JsonError::ImageRead { path, source }
    };

    let mut entries = tokio::fs::read_dir(dir).await.map_err(read_err(dir))?;
    let mut by_page = ImagesByPage::new();
    let mut count = 0usize;

    while let Some(entry) = entries.next_entry().await.map_err(read_err(dir))? {
        let path = entry.path();
        let file_type = entry.file_type().await.map_err(read_err(&path))?;
        if file_type.is_dir() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        let page = page_number_from_file_name(&name)?;
        let bytes = tokio::fs::read(&path).await.map_err(read_err(&path))?;

        by_page.entry(page).or_default().push(encode_image(&bytes));
        count += 1;
    }

    debug!(
        "Loaded {} images for {} pages from {}",
        count,
        by_page.len(),
        dir.display()
    );
    Ok(by_page)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    #[test]
    fn page_token_is_second_to_last() {
        assert_eq!(page_number_from_file_name("img-7-000.png").unwrap(), 7);
        assert_eq!(page_number_from_file_name("-12-003.png").unwrap(), 12);
        assert_eq!(page_number_from_file_name("my-scan-001-002.png").unwrap(), 1);
    }

    #[test]
    fn malformed_names_are_fatal() {
        for name in ["img.png", "img-x-000.png", "img--000.png"] {
            let err = page_number_from_file_name(name).unwrap_err();
            assert!(
                matches!(err, Pdf2JsonError::MalformedImageName { .. }),
                "{name}: {err}"
            );
        }
    }

    #[test]
    fn encode_png_as_data_uri() {
        let img = encode_image(PNG_MAGIC);
        assert_eq!(img.mimetype.as_deref(), Some("image/png"));
        assert!(img.data.starts_with("data:image/png;base64,"));
        let payload = img.data.trim_start_matches("data:image/png;base64,");
        assert_eq!(STANDARD.decode(payload).unwrap(), PNG_MAGIC);
    }

    #[test]
    fn unknown_format_falls_back_to_png_uri() {
        let img = encode_image(b"not an image");
        assert!(img.mimetype.is_none());
        assert!(img.data.starts_with("data:image/png;base64,"));
    }

    #[tokio::test]
    async fn groups_by_page_and_skips_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("img-2-000.png"), PNG_MAGIC).unwrap();
        std::fs::write(dir.path().join("img-2-001.png"), PNG_MAGIC).unwrap();
        std::fs::write(dir.path().join("img-5-002.png"), PNG_MAGIC).unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();

        let by_page = load_images(dir.path()).await.unwrap();
        assert_eq!(by_page.keys().copied().collect::<Vec<_>>(), vec![2, 5]);
        assert_eq!(by_page[&2].len(), 2);
        assert_eq!(by_page[&5].len(), 1);
    }

    #[tokio::test]
    async fn empty_dir_yields_no_images() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_images(dir.path()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_file_fails_whole_load() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("img-1-000.png"), PNG_MAGIC).unwrap();
        std::fs::write(dir.path().join("stray.png"), PNG_MAGIC).unwrap();

        let err = load_images(dir.path()).await.unwrap_err();
        assert!(matches!(err, Pdf2JsonError::MalformedImageName { .. }));
    }

    #[tokio::test]
    async fn missing_dir_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_images(&dir.path().join("gone")).await.unwrap_err();
        assert!(matches!(err, Pdf2JsonError::ImageRead { .. }));
    }
}
