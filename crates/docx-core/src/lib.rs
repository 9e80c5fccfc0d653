//! DOCX Core - WordprocessingML packages
//!
//! This crate provides:
//! - Reading the body of a `.docx` package (paragraphs, runs, tables)
//! - Writing a `.docx` package from paragraphs, bold runs, inline pictures
//!   and default header/footer parts
//!
//! # Example
//!
//! ```ignore
//! use docx_core::{read_body, Alignment, DocxDocument, Paragraph, Run};
//!
//! let body = read_body(&std::fs::read("applicant.docx")?)?;
//! if let Some(table) = body.first_table() {
//!     for row in &table.rows {
//!         println!("{:?}", row);
//!     }
//! }
//!
//! let mut doc = DocxDocument::new();
//! doc.add_paragraph(Paragraph::new(vec![Run::bold("Hello").into()]).align(Alignment::Both));
//! let bytes = doc.to_bytes()?;
//! ```

mod package;
mod reader;
mod writer;
mod xml;

pub use reader::{read_body, Body, BodyItem, ParagraphContent, RunContent, Table};
pub use writer::{
    Alignment, DocxDocument, Inline, PageMargins, Paragraph, Picture, Run, SectionProperties,
};

use thiserror::Error;

/// Errors that can occur while reading or writing packages
#[derive(Debug, Error)]
pub enum DocxError {
    #[error("Invalid package: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Missing package part: {0}")]
    MissingPart(String),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("Image error: {0}")]
    Image(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for DOCX operations
pub type Result<T> = std::result::Result<T, DocxError>;

/// English Metric Units per inch
pub const EMU_PER_INCH: f64 = 914_400.0;

/// Twentieths of a point per inch
pub const TWIPS_PER_INCH: f64 = 1440.0;

/// Convert inches to EMUs
pub fn inches_to_emu(inches: f64) -> i64 {
    (inches * EMU_PER_INCH).round() as i64
}

/// Convert inches to twips
pub fn inches_to_twips(inches: f64) -> i64 {
    (inches * TWIPS_PER_INCH).round() as i64
}
