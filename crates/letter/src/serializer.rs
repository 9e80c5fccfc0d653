//! Output targets

use crate::assets::ImageAssets;
use crate::content::LetterContent;
use crate::docx::DocxSerializer;
use crate::options::RenderOptions;
use crate::pdf::PdfSerializer;
use crate::{LetterError, RenderError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Turns letter content plus images into file bytes
pub trait Serializer {
    /// File extension without the dot
    fn extension(&self) -> &'static str;

    fn media_type(&self) -> &'static str;

    fn serialize(
        &self,
        content: &LetterContent,
        assets: &ImageAssets,
    ) -> Result<Vec<u8>, RenderError>;

    fn render(
        &self,
        content: &LetterContent,
        assets: &ImageAssets,
    ) -> Result<RenderedLetter, RenderError> {
        Ok(RenderedLetter {
            bytes: self.serialize(content, assets)?,
            extension: self.extension(),
            media_type: self.media_type(),
        })
    }
}

/// Serialized letter with its file type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedLetter {
    pub bytes: Vec<u8>,
    pub extension: &'static str,
    pub media_type: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Docx,
    Pdf,
}

impl OutputFormat {
    /// Serializer for this format configured from the options
    pub fn serializer(self, options: &RenderOptions) -> Box<dyn Serializer> {
        match self {
            OutputFormat::Docx => Box::new(DocxSerializer::from_options(options)),
            OutputFormat::Pdf => Box::new(PdfSerializer::from_options(options)),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = LetterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "docx" => Ok(OutputFormat::Docx),
            "pdf" => Ok(OutputFormat::Pdf),
            _ => Err(LetterError::UnsupportedFormat(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_format_from_str() {
        assert_eq!("pdf".parse::<OutputFormat>().unwrap(), OutputFormat::Pdf);
        assert_eq!(".DOCX".parse::<OutputFormat>().unwrap(), OutputFormat::Docx);
        assert!(matches!(
            "odt".parse::<OutputFormat>(),
            Err(LetterError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_serializer_metadata() {
        let options = RenderOptions::default();
        let docx = OutputFormat::Docx.serializer(&options);
        let pdf = OutputFormat::Pdf.serializer(&options);

        assert_eq!(docx.extension(), "docx");
        assert_eq!(
            docx.media_type(),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        );
        assert_eq!(pdf.extension(), "pdf");
        assert_eq!(pdf.media_type(), "application/pdf");
    }
}
