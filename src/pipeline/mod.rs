//! Pipeline stages for PDF-to-JSON conversion.
//!
//! Each submodule implements exactly one step, so each can be tested on its
//! own and the external tools can be swapped without touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! workspace ──▶ text ──▶ aggregate ──▶ (images ──▶ loader ──▶ merge)
//! (tempdir)   (pdftotext) (pages)       (pdfimages) (data URIs)
//! ```
//!
//! 1. [`workspace`]: per-request temp directory, removed on drop
//! 2. [`tool`]: subprocess runner with timeout and kill-on-drop
//! 3. [`text`]: `pdftotext -raw` to a string
//! 4. [`aggregate`]: split on form-feed, number pages, merge images
//! 5. [`images`]: `pdfimages -png -p` into the workspace
//! 6. [`loader`]: read image files back and key them by page number

pub mod aggregate;
pub mod images;
pub mod loader;
pub mod text;
pub mod tool;
pub mod workspace;
