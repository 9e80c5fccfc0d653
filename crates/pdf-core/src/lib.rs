//! PDF Core - Low-level fixed-layout PDF writing
//!
//! This crate provides functionality for:
//! - Creating PDF documents from blank pages (Letter or A4)
//! - Placing text with the standard Helvetica faces or an embedded TrueType font
//! - Measuring text with the font metrics
//! - Inserting images (JPEG, PNG) stretched to a box
//!
//! # Example
//!
//! ```ignore
//! use pdf_core::{PageSize, PdfDocument, StandardFont};
//!
//! let mut doc = PdfDocument::new(PageSize::LETTER);
//! let page = doc.add_blank_page();
//! doc.set_font(StandardFont::Helvetica, 11.0);
//! doc.insert_text("Hello, World!", page, 72.0, 72.0)?;
//! let bytes = doc.to_bytes()?;
//! ```

mod document;
mod font;
mod image;
mod text;

pub use document::PdfDocument;
pub use font::{
    encode_text_hex, encode_win_ansi, Font, FontFamily, FontWeight, StandardFont, TrueTypeFont,
};
pub use image::{image_dimensions, ImageDimensions, ImageFormat};
pub use text::{generate_text_operators, TextRenderContext};

use thiserror::Error;

/// Errors that can occur during PDF operations
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Failed to save PDF: {0}")]
    SaveError(String),

    #[error("Failed to parse font: {0}")]
    FontParseError(String),

    #[error("No font selected")]
    NoFontSelected,

    #[error("Invalid page number: {0} (document has {1} pages)")]
    InvalidPage(usize, usize),

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Lopdf error: {0}")]
    LopdfError(#[from] lopdf::Error),
}

/// Result type for PDF operations
pub type Result<T> = std::result::Result<T, PdfError>;

/// Points per inch
pub const POINTS_PER_INCH: f64 = 72.0;

/// Convert inches to points
pub fn inches(value: f64) -> f64 {
    value * POINTS_PER_INCH
}

/// Horizontal placement of a box within the text area
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// Page dimensions in points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    /// US Letter (8.5 x 11 in)
    pub const LETTER: PageSize = PageSize {
        width: 612.0,
        height: 792.0,
    };

    /// ISO A4 (210 x 297 mm)
    pub const A4: PageSize = PageSize {
        width: 595.28,
        height: 841.89,
    };
}

impl Default for PageSize {
    fn default() -> Self {
        Self::LETTER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_default() {
        assert_eq!(Align::default(), Align::Left);
    }

    #[test]
    fn test_inches_to_points() {
        assert_eq!(inches(1.0), 72.0);
        assert_eq!(inches(2.5), 180.0);
    }

    #[test]
    fn test_page_size_default_is_letter() {
        assert_eq!(PageSize::default(), PageSize::LETTER);
        assert!(PageSize::A4.height > PageSize::LETTER.height);
    }
}
