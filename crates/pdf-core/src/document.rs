//! PDF Document builder

use crate::image::{generate_image_operators, ImageXObject};
use crate::text::{generate_text_operators, TextRenderContext};
use crate::{Font, PageSize, PdfError, Result};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::hash::{Hash, Hasher};

/// A face used somewhere in the document
#[derive(Debug)]
struct FontSlot {
    font: Font,
    /// Characters drawn with this face
    used: BTreeSet<char>,
}

/// Buffered state of one page
#[derive(Debug, Default)]
struct PageState {
    /// Content stream operators
    content: Vec<u8>,
    /// Fonts referenced by the content, as indices into `PdfDocument::fonts`
    fonts: BTreeSet<usize>,
    /// Image resource name -> index into `PdfDocument::images`
    images: BTreeMap<String, usize>,
}

/// Fixed-layout PDF document assembled page by page
///
/// Content is buffered per page and turned into lopdf objects in
/// [`PdfDocument::to_bytes`], so the builder itself stays cheap to mutate.
pub struct PdfDocument {
    /// Page size used for every page
    page_size: PageSize,
    /// Pages in order (page number = index + 1)
    pages: Vec<PageState>,
    /// Current font face
    current_font: Option<Font>,
    /// Current font size
    current_font_size: f32,
    /// Faces in order of first use; resource names follow this order
    fonts: Vec<FontSlot>,
    /// Image XObjects in insertion order
    images: Vec<ImageXObject>,
    /// Image data hash -> index into `images`
    image_index: HashMap<u64, usize>,
    /// Document title for the Info dictionary
    title: Option<String>,
}

impl PdfDocument {
    /// Create an empty document; pages are added with `add_blank_page`
    pub fn new(page_size: PageSize) -> Self {
        Self {
            page_size,
            pages: Vec::new(),
            current_font: None,
            current_font_size: 12.0,
            fonts: Vec::new(),
            images: Vec::new(),
            image_index: HashMap::new(),
            title: None,
        }
    }

    /// Get the number of pages in the document
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Add a blank page
    ///
    /// # Returns
    /// New page number (1-indexed)
    pub fn add_blank_page(&mut self) -> usize {
        self.pages.push(PageState::default());
        self.pages.len()
    }

    /// Set the document title written to the Info dictionary
    pub fn set_title(&mut self, title: &str) {
        self.title = Some(title.to_string());
    }

    /// Set the current font face and size
    pub fn set_font(&mut self, font: impl Into<Font>, size: f32) {
        self.current_font = Some(font.into());
        self.current_font_size = size;
    }

    /// Insert text at a specific position
    ///
    /// # Arguments
    /// * `text` - Text to insert; the Helvetica faces draw characters outside
    ///   WinAnsi as `?`, embedded faces draw anything they have a glyph for
    /// * `page` - Page number (1-indexed)
    /// * `x` - X coordinate of the start of the text in points
    /// * `y` - Baseline Y coordinate in points (from top)
    pub fn insert_text(&mut self, text: &str, page: usize, x: f64, y: f64) -> Result<()> {
        let page_count = self.page_count();
        if page == 0 || page > page_count {
            return Err(PdfError::InvalidPage(page, page_count));
        }

        let font = self.current_font.clone().ok_or(PdfError::NoFontSelected)?;

        if text.is_empty() {
            return Ok(());
        }

        let index = self.font_slot(&font);
        self.fonts[index].used.extend(text.chars());

        let ctx = TextRenderContext {
            font_name: font_resource_name(index),
            font_size: self.current_font_size,
        };
        let pdf_y = self.page_size.height - y;
        let operators = generate_text_operators(&font.encode_text_hex(text), x, pdf_y, &ctx);

        let state = &mut self.pages[page - 1];
        state.fonts.insert(index);
        state.content.extend_from_slice(&operators);

        Ok(())
    }

    /// Index of a face in the registry, registering it on first use
    fn font_slot(&mut self, font: &Font) -> usize {
        if let Some(index) = self.fonts.iter().position(|slot| slot.font.same_face(font)) {
            return index;
        }
        self.fonts.push(FontSlot {
            font: font.clone(),
            used: BTreeSet::new(),
        });
        self.fonts.len() - 1
    }

    /// Insert an image stretched to the given box
    ///
    /// # Arguments
    /// * `data` - Image file bytes (JPEG or PNG)
    /// * `page` - Page number (1-indexed)
    /// * `x` - X coordinate in points
    /// * `y` - Y coordinate of the top edge in points (from top)
    /// * `width` - Image width in points
    /// * `height` - Image height in points
    pub fn insert_image(
        &mut self,
        data: &[u8],
        page: usize,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<()> {
        let page_count = self.page_count();
        if page == 0 || page > page_count {
            return Err(PdfError::InvalidPage(page, page_count));
        }

        let index = self.get_or_create_image(data)?;

        // Convert top edge from top-origin to the bottom-left corner
        let pdf_y = self.page_size.height - y - height;
        let resource_name = format!("Im{}", index + 1);
        let operators = generate_image_operators(&resource_name, x, pdf_y, width, height);

        let state = &mut self.pages[page - 1];
        state.images.insert(resource_name, index);
        state.content.extend_from_slice(&operators);

        Ok(())
    }

    /// Decode an image once per distinct payload
    fn get_or_create_image(&mut self, data: &[u8]) -> Result<usize> {
        let mut hasher = DefaultHasher::new();
        data.hash(&mut hasher);
        let data_hash = hasher.finish();

        if let Some(&index) = self.image_index.get(&data_hash) {
            return Ok(index);
        }

        let xobject = ImageXObject::from_bytes(data)
            .map_err(|e| PdfError::ImageError(format!("Failed to create image XObject: {e}")))?;
        self.images.push(xobject);
        let index = self.images.len() - 1;
        self.image_index.insert(data_hash, index);

        Ok(index)
    }

    /// Serialize the document to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        if self.pages.is_empty() {
            return Err(PdfError::SaveError("Document has no pages".to_string()));
        }

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font_ids: Vec<ObjectId> = self
            .fonts
            .iter()
            .map(|slot| add_font(&mut doc, slot))
            .collect();

        let image_ids: Vec<ObjectId> = self
            .images
            .iter()
            .map(|xobject| doc.add_object(xobject.to_pdf_stream()))
            .collect();

        let mut kids = Vec::with_capacity(self.pages.len());
        for state in &self.pages {
            let mut resources = Dictionary::new();

            if !state.fonts.is_empty() {
                let mut fonts = Dictionary::new();
                for index in &state.fonts {
                    fonts.set(font_resource_name(*index), Object::Reference(font_ids[*index]));
                }
                resources.set("Font", Object::Dictionary(fonts));
            }

            if !state.images.is_empty() {
                let mut xobjects = Dictionary::new();
                for (name, index) in &state.images {
                    xobjects.set(name.as_bytes(), Object::Reference(image_ids[*index]));
                }
                resources.set("XObject", Object::Dictionary(xobjects));
            }

            let contents_id = doc.add_object(Stream::new(Dictionary::new(), state.content.clone()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![
                    0.into(),
                    0.into(),
                    Object::Real(self.page_size.width as f32),
                    Object::Real(self.page_size.height as f32),
                ],
                "Resources" => resources,
                "Contents" => contents_id,
            });
            kids.push(Object::Reference(page_id));
        }

        let page_count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => page_count,
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        if let Some(title) = &self.title {
            let info_id = doc.add_object(dictionary! {
                "Title" => Object::string_literal(title.as_str()),
                "Producer" => Object::string_literal("pdf-core"),
            });
            doc.trailer.set("Info", info_id);
        }

        doc.compress();

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)
            .map_err(|e| PdfError::SaveError(e.to_string()))?;

        log::debug!(
            "Serialized PDF: {} pages, {} fonts, {} images, {} bytes",
            self.pages.len(),
            self.fonts.len(),
            self.images.len(),
            buffer.len()
        );

        Ok(buffer)
    }
}

/// Resource name of a font in page dictionaries
fn font_resource_name(index: usize) -> String {
    format!("F{}", index + 1)
}

/// Add a face's objects and return the id of its font dictionary
fn add_font(doc: &mut Document, slot: &FontSlot) -> ObjectId {
    match &slot.font {
        Font::Standard(font) => doc.add_object(font.to_pdf_dict()),
        Font::TrueType(font) => {
            let objects = font.to_pdf_objects(&slot.used);

            let file_id = doc.add_object(objects.font_file_stream);
            let mut descriptor = objects.font_descriptor;
            descriptor.set("FontFile2", Object::Reference(file_id));
            let descriptor_id = doc.add_object(descriptor);

            let mut cid_font = objects.cid_font;
            cid_font.set("FontDescriptor", Object::Reference(descriptor_id));
            let cid_font_id = doc.add_object(cid_font);

            let tounicode_id = doc.add_object(objects.tounicode_stream);

            let mut type0 = objects.type0_font;
            type0.set(
                "DescendantFonts",
                Object::Array(vec![Object::Reference(cid_font_id)]),
            );
            type0.set("ToUnicode", Object::Reference(tounicode_id));
            doc.add_object(type0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::tests::tiny_ttf;
    use crate::{StandardFont, TrueTypeFont};
    use pretty_assertions::assert_eq;

    fn content(doc: &PdfDocument, page: usize) -> String {
        String::from_utf8(doc.pages[page - 1].content.clone()).unwrap()
    }

    #[test]
    fn test_new_document_has_no_pages() {
        let doc = PdfDocument::new(PageSize::A4);
        assert_eq!(doc.page_count(), 0);
        assert!(doc.to_bytes().is_err());
    }

    #[test]
    fn test_text_requires_font() {
        let mut doc = PdfDocument::new(PageSize::LETTER);
        let page = doc.add_blank_page();
        assert!(matches!(
            doc.insert_text("Hi", page, 10.0, 10.0),
            Err(PdfError::NoFontSelected)
        ));
    }

    #[test]
    fn test_font_resources_follow_first_use() {
        let mut doc = PdfDocument::new(PageSize::LETTER);
        let page = doc.add_blank_page();
        doc.set_font(StandardFont::HelveticaBold, 10.0);
        doc.insert_text("Bold", page, 72.0, 72.0).unwrap();
        doc.set_font(StandardFont::Helvetica, 10.0);
        doc.insert_text("Plain", page, 72.0, 90.0).unwrap();
        doc.set_font(StandardFont::HelveticaBold, 10.0);
        doc.insert_text("Again", page, 72.0, 108.0).unwrap();

        assert_eq!(doc.fonts.len(), 2);
        let ops = content(&doc, page);
        assert_eq!(ops.matches("/F1 10 Tf").count(), 2);
        assert_eq!(ops.matches("/F2 10 Tf").count(), 1);
    }

    #[test]
    fn test_embedded_font_records_used_chars() {
        let font = Font::from(TrueTypeFont::from_ttf(tiny_ttf("Đcứ")).unwrap());
        let mut doc = PdfDocument::new(PageSize::LETTER);
        let page = doc.add_blank_page();
        doc.set_font(font.clone(), 12.0);
        doc.insert_text("Đức", page, 72.0, 72.0).unwrap();
        doc.set_font(font, 14.0);
        doc.insert_text("c", page, 72.0, 90.0).unwrap();

        assert_eq!(doc.fonts.len(), 1);
        let used: String = doc.fonts[0].used.iter().collect();
        assert_eq!(used, "cĐứ");
        assert!(content(&doc, page).contains("<000200030001> Tj"));
        assert!(doc.to_bytes().is_ok());
    }
}
