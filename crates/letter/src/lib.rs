//! Letter - visa invitation letters from applicant documents
//!
//! This crate provides:
//! - Applicant record extraction from the first table of a `.docx`
//! - The fixed letter content, dated by an injected clock
//! - Serialization to `.docx` (flowing) and `.pdf` (fixed layout, Helvetica or
//!   an embedded TrueType family)
//! - Batch generation with per-document failure reporting and ZIP packaging
//!
//! # Example
//!
//! ```ignore
//! use letter::{Batch, ImageAssets, InputDocument, OutputFormat, RenderOptions, SystemClock};
//!
//! let assets = ImageAssets::new().with_header(std::fs::read("header.png")?);
//! let report = Batch::new(&SystemClock, &assets, RenderOptions::default())
//!     .with_formats(&[OutputFormat::Docx, OutputFormat::Pdf])
//!     .run(&[InputDocument::new("jane.docx", std::fs::read("jane.docx")?)]);
//! println!("{} succeeded, {} failed", report.succeeded(), report.failed());
//! let archive = report.to_zip()?;
//! ```

mod assets;
mod batch;
mod clock;
mod content;
mod docx;
mod options;
mod pdf;
mod record;
mod serializer;

pub use assets::{ImageAssets, ImageSlot, Placement};
pub use batch::{
    archive_name, suggested_file_name, Batch, BatchReport, DocumentFailure, GeneratedFile,
    InputDocument,
};
pub use clock::{format_letter_date, Clock, FixedClock, SystemClock};
pub use content::{Block, LetterBuilder, LetterContent, ParagraphAlign, Span};
pub use docx::DocxSerializer;
pub use options::{HeaderFooterMode, PageFormat, RenderOptions};
pub use pdf::PdfSerializer;
pub use record::{ApplicantRecord, Field, RecordExtractor, MISSING_VALUE};
pub use serializer::{OutputFormat, RenderedLetter, Serializer};

pub use pdf_core::FontFamily;

use thiserror::Error;

/// Failure to read an applicant document
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Failed to read document: {0}")]
    Document(#[from] docx_core::DocxError),
}

/// Failure to produce an output document
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("PDF error: {0}")]
    Pdf(#[from] pdf_core::PdfError),

    #[error("DOCX error: {0}")]
    Docx(#[from] docx_core::DocxError),

    #[error("Invalid {slot} image: {reason}")]
    Image { slot: ImageSlot, reason: String },

    #[error("Archive error: {0}")]
    Archive(String),
}

/// Errors that can occur anywhere in the pipeline
#[derive(Debug, Error)]
pub enum LetterError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Invalid options: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, LetterError>;
