//! Page assembly: raw `pdftotext` output → numbered [`Page`]s.
//!
//! `pdftotext` separates pages with a form-feed. Segment `i` becomes page
//! `start_page + i`; the segment count is trusted as-is, so a document that
//! ends with a form-feed yields a trailing empty page, exactly as the tool
//! reported it.

use crate::output::{ConversionResponse, ImagesByPage, Page};

/// Page-break marker emitted by `pdftotext` between pages.
pub const PAGE_SEPARATOR: char = '\x0C';

/// Split `raw_text` into pages numbered from `start_page`.
pub fn aggregate(raw_text: &str, start_page: u32) -> ConversionResponse {
    let pages = raw_text
        .split(PAGE_SEPARATOR)
        .zip(u64::from(start_page)..)
        .map(|(text, page_number)| Page {
            page_number,
            text: text.to_string(),
            images: Vec::new(),
        })
        .collect();

    ConversionResponse { pages }
}

/// Attach images to the pages they were extracted from.
///
/// Images keep their relative order. Images for pages that are not in
/// `response` are dropped.
pub fn merge_images(response: &mut ConversionResponse, mut images: ImagesByPage) {
    for page in &mut response.pages {
        if let Some(found) = images.remove(&page.page_number) {
            page.images.extend(found);
        }
    }
}
