//! Render options parsed from JSON

use crate::serializer::OutputFormat;
use crate::Result;
use serde::{de, Deserialize, Deserializer, Serialize};

/// Paper size of generated documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageFormat {
    #[default]
    Letter,
    A4,
}

impl PageFormat {
    /// (width, height) in inches
    pub fn inches(self) -> (f64, f64) {
        match self {
            PageFormat::Letter => (8.5, 11.0),
            PageFormat::A4 => (210.0 / 25.4, 297.0 / 25.4),
        }
    }

    pub fn pdf_page_size(self) -> pdf_core::PageSize {
        match self {
            PageFormat::Letter => pdf_core::PageSize::LETTER,
            PageFormat::A4 => pdf_core::PageSize::A4,
        }
    }
}

/// Header and footer handling in the fixed layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderFooterMode {
    /// Header image first and footer image last in the text flow
    #[default]
    Flow,
    /// Header and footer repeated in the margins of every page
    Running,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct RenderOptions {
    pub page_size: PageFormat,
    pub header_footer: HeaderFooterMode,
    /// Body font size in points
    #[serde(deserialize_with = "positive_font_size")]
    pub font_size: f32,
    pub formats: Vec<OutputFormat>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            page_size: PageFormat::Letter,
            header_footer: HeaderFooterMode::Flow,
            font_size: 11.0,
            formats: vec![OutputFormat::Docx],
        }
    }
}

/// Font sizes must be finite and greater than zero
fn positive_font_size<'de, D>(deserializer: D) -> std::result::Result<f32, D::Error>
where
    D: Deserializer<'de>,
{
    let size = f32::deserialize(deserializer)?;
    if size.is_finite() && size > 0.0 {
        Ok(size)
    } else {
        Err(de::Error::custom(format!(
            "fontSize must be greater than zero, got {size}"
        )))
    }
}

impl RenderOptions {
    /// Parse options from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
