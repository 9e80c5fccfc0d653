//! Flowing-document target

use crate::assets::{ImageAssets, ImageSlot};
use crate::content::{Block, LetterContent, ParagraphAlign, Span};
use crate::options::RenderOptions;
use crate::serializer::Serializer;
use crate::RenderError;
use docx_core::{Alignment, DocxDocument, DocxError, Paragraph, Picture, Run, SectionProperties};

/// Writes the letter as a `.docx` with real header and footer parts
#[derive(Debug, Clone)]
pub struct DocxSerializer {
    font_name: String,
    font_size: f32,
    section: SectionProperties,
}

impl Default for DocxSerializer {
    fn default() -> Self {
        Self::from_options(&RenderOptions::default())
    }
}

impl DocxSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_options(options: &RenderOptions) -> Self {
        let (page_width, page_height) = options.page_size.inches();
        Self {
            font_name: "Lato".to_string(),
            font_size: options.font_size,
            section: SectionProperties {
                page_width,
                page_height,
                ..SectionProperties::default()
            },
        }
    }
}

/// Register a slot image at its fixed width
fn slot_picture(
    doc: &mut DocxDocument,
    slot: ImageSlot,
    data: &[u8],
) -> Result<Picture, RenderError> {
    doc.add_picture(data, slot.placement().width_inches)
        .map_err(|e| match e {
            DocxError::Image(reason) => RenderError::Image { slot, reason },
            other => RenderError::Docx(other),
        })
}

fn runs(spans: &[Span]) -> Vec<docx_core::Inline> {
    spans
        .iter()
        .map(|span| {
            if span.bold {
                Run::bold(span.text.as_str()).into()
            } else {
                Run::plain(span.text.as_str()).into()
            }
        })
        .collect()
}

impl Serializer for DocxSerializer {
    fn extension(&self) -> &'static str {
        "docx"
    }

    fn media_type(&self) -> &'static str {
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
    }

    fn serialize(
        &self,
        content: &LetterContent,
        assets: &ImageAssets,
    ) -> Result<Vec<u8>, RenderError> {
        let mut doc = DocxDocument::new();
        doc.set_default_font(&self.font_name, self.font_size);
        *doc.section_mut() = self.section;

        if let Some(data) = assets.get(ImageSlot::Header) {
            let picture = slot_picture(&mut doc, ImageSlot::Header, data)?;
            doc.set_header(vec![Paragraph::new(vec![picture.into()]).align(Alignment::Right)]);
        }
        if let Some(data) = assets.get(ImageSlot::Footer) {
            let picture = slot_picture(&mut doc, ImageSlot::Footer, data)?;
            doc.set_footer(vec![Paragraph::new(vec![picture.into()])]);
        }

        for block in &content.blocks {
            match block {
                Block::Paragraph { spans, align } => {
                    let paragraph = Paragraph::new(runs(spans));
                    doc.add_paragraph(match align {
                        ParagraphAlign::Justify => paragraph.align(Alignment::Both),
                        ParagraphAlign::Left => paragraph,
                    });
                }
                Block::Image(slot) => {
                    let Some(data) = assets.get(*slot) else {
                        log::debug!("No {slot} image; skipping placeholder");
                        continue;
                    };
                    let picture = slot_picture(&mut doc, *slot, data)?;
                    doc.add_paragraph(Paragraph::new(vec![picture.into()]));
                }
            }
        }

        Ok(doc.to_bytes()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn content() -> LetterContent {
        LetterContent {
            blocks: vec![
                Block::Paragraph {
                    spans: vec![Span::plain("Hello "), Span::bold("World")],
                    align: ParagraphAlign::Justify,
                },
                Block::Image(ImageSlot::Signature),
            ],
        }
    }

    #[test]
    fn test_paragraphs_without_images() {
        let bytes = DocxSerializer::new()
            .serialize(&content(), &ImageAssets::new())
            .unwrap();
        let body = docx_core::read_body(&bytes).unwrap();
        let paragraphs: Vec<_> = body.paragraphs().collect();

        assert_eq!(paragraphs.len(), 1);
        assert_eq!(paragraphs[0].text(), "Hello World");
        assert_eq!(paragraphs[0].bold_texts(), vec!["World"]);
        assert_eq!(paragraphs[0].alignment.as_deref(), Some("both"));
    }

    #[test]
    fn test_invalid_signature_image() {
        let assets = ImageAssets::new().with_signature(b"garbage".to_vec());
        let result = DocxSerializer::new().serialize(&content(), &assets);
        assert!(matches!(
            result,
            Err(RenderError::Image {
                slot: ImageSlot::Signature,
                ..
            })
        ));
    }
}
