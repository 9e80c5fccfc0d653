//! Batch generation over many applicant documents

use crate::assets::{ImageAssets, ImageSlot};
use crate::clock::Clock;
use crate::content::LetterBuilder;
use crate::options::RenderOptions;
use crate::pdf::PdfSerializer;
use crate::record::RecordExtractor;
use crate::serializer::{OutputFormat, Serializer};
use crate::{RenderError, Result};
use chrono::NaiveDateTime;
use pdf_core::FontFamily;
use std::collections::HashSet;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// An uploaded applicant document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputDocument {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl InputDocument {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// One generated letter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub file_name: String,
    /// Full name from the record, or `Unknown`
    pub applicant: String,
    pub media_type: &'static str,
    pub bytes: Vec<u8>,
}

/// A document that produced no output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFailure {
    pub source_name: String,
    pub reason: String,
}

/// Outcome of a batch run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub outputs: Vec<GeneratedFile>,
    pub failures: Vec<DocumentFailure>,
    documents: usize,
}

impl BatchReport {
    /// Documents that produced their outputs
    pub fn succeeded(&self) -> usize {
        self.documents - self.failures.len()
    }

    /// Documents that were skipped
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Package every output into a deflated ZIP archive
    pub fn to_zip(&self) -> Result<Vec<u8>> {
        let archive_error = |e: zip::result::ZipError| RenderError::Archive(e.to_string());

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for file in &self.outputs {
            zip.start_file(file.file_name.as_str(), options)
                .map_err(archive_error)?;
            zip.write_all(&file.bytes)
                .map_err(|e| RenderError::Archive(e.to_string()))?;
        }
        let cursor = zip.finish().map_err(archive_error)?;
        Ok(cursor.into_inner())
    }
}

/// `{basename}_invitation.{extension}` for an uploaded file name
///
/// Any directory part and a trailing `.docx` (any case) are dropped.
pub fn suggested_file_name(source_name: &str, extension: &str) -> String {
    let base = source_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(source_name);
    let stem = match base.len().checked_sub(5) {
        Some(cut) if base.is_char_boundary(cut) && base[cut..].eq_ignore_ascii_case(".docx") => {
            &base[..cut]
        }
        _ => base,
    };
    format!("{stem}_invitation.{extension}")
}

/// Archive file name stamped with the given time
pub fn archive_name(now: NaiveDateTime) -> String {
    format!("invitation_letters_{}.zip", now.format("%Y%m%d_%H%M%S"))
}

/// Generates letters for many documents with shared images and options
pub struct Batch<'a> {
    clock: &'a dyn Clock,
    assets: &'a ImageAssets,
    options: RenderOptions,
    pdf_fonts: FontFamily,
}

impl<'a> Batch<'a> {
    pub fn new(clock: &'a dyn Clock, assets: &'a ImageAssets, options: RenderOptions) -> Self {
        Self {
            clock,
            assets,
            options,
            pdf_fonts: FontFamily::helvetica(),
        }
    }

    /// Faces for PDF text; Helvetica when not set
    pub fn with_pdf_fonts(mut self, fonts: FontFamily) -> Self {
        self.pdf_fonts = fonts;
        self
    }

    fn serializer(&self, format: OutputFormat) -> Box<dyn Serializer> {
        match format {
            OutputFormat::Pdf => Box::new(
                PdfSerializer::from_options(&self.options).with_fonts(self.pdf_fonts.clone()),
            ),
            other => other.serializer(&self.options),
        }
    }

    /// Override the output formats from the options
    pub fn with_formats(mut self, formats: &[OutputFormat]) -> Self {
        self.options.formats = formats.to_vec();
        self
    }

    fn formats(&self) -> Vec<OutputFormat> {
        let mut formats = Vec::new();
        for format in &self.options.formats {
            if !formats.contains(format) {
                formats.push(*format);
            }
        }
        if formats.is_empty() {
            formats.push(OutputFormat::Docx);
        }
        formats
    }

    /// Generate every format for one document; nothing is returned on error
    pub fn generate(&self, input: &InputDocument) -> Result<Vec<GeneratedFile>> {
        let record = RecordExtractor::extract(&input.bytes)?;
        let content = LetterBuilder::new(self.clock)
            .with_signature(self.assets.has(ImageSlot::Signature))
            .build(&record);

        self.formats()
            .into_iter()
            .map(|format| -> Result<GeneratedFile> {
                let rendered = self.serializer(format).render(&content, self.assets)?;
                Ok(GeneratedFile {
                    file_name: suggested_file_name(&input.name, rendered.extension),
                    applicant: record.applicant_name().to_string(),
                    media_type: rendered.media_type,
                    bytes: rendered.bytes,
                })
            })
            .collect()
    }

    /// Process documents in order, skipping and reporting failures
    pub fn run(&self, inputs: &[InputDocument]) -> BatchReport {
        let mut report = BatchReport {
            documents: inputs.len(),
            ..BatchReport::default()
        };
        let mut names = HashSet::new();

        for input in inputs {
            match self.generate(input) {
                Ok(files) => {
                    for mut file in files {
                        file.file_name = unique_name(&mut names, &file.file_name);
                        log::info!("Generated {} for {}", file.file_name, file.applicant);
                        report.outputs.push(file);
                    }
                }
                Err(e) => {
                    log::warn!("Skipping {}: {}", input.name, e);
                    report.failures.push(DocumentFailure {
                        source_name: input.name.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        report
    }
}

/// Suffix `_2`, `_3`, ... before the extension until the name is unused
fn unique_name(taken: &mut HashSet<String>, name: &str) -> String {
    if taken.insert(name.to_string()) {
        return name.to_string();
    }
    let (stem, ext) = name.rsplit_once('.').unwrap_or((name, ""));
    let mut n = 2;
    loop {
        let candidate = if ext.is_empty() {
            format!("{stem}_{n}")
        } else {
            format!("{stem}_{n}.{ext}")
        };
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}
