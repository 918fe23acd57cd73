//! Request and response types.
//!
//! The response shape is a wire contract consumed by existing clients:
//!
//! ```json
//! {"pages": [{"pageNumber": 1, "text": "…", "images": [{"data": "data:image/png;base64,…"}]}]}
//! ```
//!
//! `images` is always present (possibly empty). `mimetype` is only emitted
//! when the image format was recognised.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What to extract from an uploaded PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRequest {
    /// First page to extract (1-indexed). Default: 1.
    pub start_page: u32,
    /// Last page to extract (1-indexed, inclusive). `0` means through the
    /// last page. Default: 0.
    pub end_page: u32,
    /// Also extract embedded raster images. Default: false.
    pub include_images: bool,
}

impl Default for ConversionRequest {
    fn default() -> Self {
        Self {
            start_page: 1,
            end_page: 0,
            include_images: false,
        }
    }
}

/// An embedded image, encoded as a data URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedImage {
    /// `data:<mime>;base64,<payload>`
    pub data: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub mimetype: Option<String>,
}

/// Text and images of one PDF page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// Absolute, 1-indexed page number within the source document.
    ///
    /// Wider than [`ConversionRequest::start_page`] so numbering from any
    /// start page cannot overflow.
    pub page_number: u64,
    pub text: String,
    #[serde(default)]
    pub images: Vec<ExtractedImage>,
}

/// The JSON document returned for a conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionResponse {
    /// Pages in ascending page-number order.
    pub pages: Vec<Page>,
}

/// Images grouped by the page they were extracted from.
///
/// Each list keeps the order in which the files were listed on disk.
pub type ImagesByPage = BTreeMap<u64, Vec<ExtractedImage>>;
