//! Package writer for flowing documents

use crate::package::{
    ContentTypes, PackageWriter, Relationships, CT_DOCUMENT, CT_FOOTER, CT_HEADER, CT_STYLES,
    REL_FOOTER, REL_HEADER, REL_IMAGE, REL_OFFICE_DOCUMENT, REL_STYLES,
};
use crate::xml::{XmlOut, NS_A, NS_PIC, NS_R, NS_W, NS_WP};
use crate::{inches_to_emu, inches_to_twips, DocxError, Result};
use image::ImageReader;
use std::io::Cursor;

impl From<image::ImageError> for DocxError {
    fn from(err: image::ImageError) -> Self {
        DocxError::Image(err.to_string())
    }
}

/// Paragraph justification (`w:jc`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
    /// Justified on both margins
    Both,
}

impl Alignment {
    fn as_str(self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Both => "both",
        }
    }
}

/// A text run. `\n` becomes a line break and `\t` a tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub text: String,
    pub bold: bool,
}

impl Run {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: true,
        }
    }
}

/// Handle to an image registered with [`DocxDocument::add_picture`]
#[derive(Debug, Clone, PartialEq)]
pub struct Picture {
    media: usize,
    /// Display width in EMUs
    pub width_emu: i64,
    /// Display height in EMUs, proportional to the width
    pub height_emu: i64,
}

/// Inline paragraph content
#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Run(Run),
    Picture(Picture),
}

impl From<Run> for Inline {
    fn from(run: Run) -> Self {
        Inline::Run(run)
    }
}

impl From<Picture> for Inline {
    fn from(picture: Picture) -> Self {
        Inline::Picture(picture)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Paragraph {
    pub children: Vec<Inline>,
    pub alignment: Option<Alignment>,
}

impl Paragraph {
    pub fn new(children: Vec<Inline>) -> Self {
        Self {
            children,
            alignment: None,
        }
    }

    pub fn align(mut self, alignment: Alignment) -> Self {
        self.alignment = Some(alignment);
        self
    }
}

/// Page margins in inches
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageMargins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
    /// Distance from the page top to the header
    pub header: f64,
    /// Distance from the page bottom to the footer
    pub footer: f64,
}

impl Default for PageMargins {
    fn default() -> Self {
        Self {
            top: 1.0,
            right: 0.8,
            bottom: 1.0,
            left: 0.9,
            header: 0.2,
            footer: 0.1,
        }
    }
}

/// Page geometry of the single section
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionProperties {
    /// Page width in inches
    pub page_width: f64,
    /// Page height in inches
    pub page_height: f64,
    pub margins: PageMargins,
}

impl Default for SectionProperties {
    fn default() -> Self {
        Self {
            page_width: 8.5,
            page_height: 11.0,
            margins: PageMargins::default(),
        }
    }
}

#[derive(Debug, Clone)]
struct Media {
    file_name: String,
    mime: &'static str,
    extension: &'static str,
    data: Vec<u8>,
}

/// A `.docx` document under construction
#[derive(Debug, Clone)]
pub struct DocxDocument {
    font_name: String,
    /// Default size in half-points
    font_half_points: u32,
    section: SectionProperties,
    body: Vec<Paragraph>,
    header: Vec<Paragraph>,
    footer: Vec<Paragraph>,
    media: Vec<Media>,
}

impl Default for DocxDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl DocxDocument {
    pub fn new() -> Self {
        Self {
            font_name: "Calibri".to_string(),
            font_half_points: 22,
            section: SectionProperties::default(),
            body: Vec::new(),
            header: Vec::new(),
            footer: Vec::new(),
            media: Vec::new(),
        }
    }

    /// Set the document-wide font and size in points
    pub fn set_default_font(&mut self, name: &str, size: f32) {
        self.font_name = name.to_string();
        self.font_half_points = (size * 2.0).round().max(1.0) as u32;
    }

    pub fn section_mut(&mut self) -> &mut SectionProperties {
        &mut self.section
    }

    /// Register image bytes, sized to `width_inches` with the aspect ratio kept
    pub fn add_picture(&mut self, data: &[u8], width_inches: f64) -> Result<Picture> {
        let reader = ImageReader::new(Cursor::new(data)).with_guessed_format()?;
        let (mime, extension) = match reader.format() {
            Some(image::ImageFormat::Png) => ("image/png", "png"),
            Some(image::ImageFormat::Jpeg) => ("image/jpeg", "jpeg"),
            _ => {
                return Err(DocxError::Image(
                    "Unsupported image format (expected PNG or JPEG)".to_string(),
                ))
            }
        };
        let (width, height) = reader.into_dimensions()?;
        if width == 0 || height == 0 {
            return Err(DocxError::Image("Image has no pixels".to_string()));
        }

        let width_emu = inches_to_emu(width_inches);
        let height_emu = (width_emu as f64 * height as f64 / width as f64).round() as i64;

        let media = self.media.len();
        self.media.push(Media {
            file_name: format!("image{}.{}", media + 1, extension),
            mime,
            extension,
            data: data.to_vec(),
        });
        log::debug!("Registered picture {} ({}x{} px)", media + 1, width, height);

        Ok(Picture {
            media,
            width_emu,
            height_emu,
        })
    }

    pub fn add_paragraph(&mut self, paragraph: Paragraph) {
        self.body.push(paragraph);
    }

    /// Default header content; empty means no header part
    pub fn set_header(&mut self, paragraphs: Vec<Paragraph>) {
        self.header = paragraphs;
    }

    /// Default footer content; empty means no footer part
    pub fn set_footer(&mut self, paragraphs: Vec<Paragraph>) {
        self.footer = paragraphs;
    }

    /// Serialize the package
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut package = PackageWriter::new();
        let mut types = ContentTypes::new();
        let mut doc_rels = Relationships::default();
        let mut drawing_ids = 0u32;

        types.add_override("/word/document.xml", CT_DOCUMENT);
        types.add_override("/word/styles.xml", CT_STYLES);
        doc_rels.add(REL_STYLES, "styles.xml");
        package.add_part("word/styles.xml", &self.styles_xml()?)?;

        let mut header_rel = None;
        if !self.header.is_empty() {
            let mut rels = Relationships::default();
            let xml = self.story_xml("w:hdr", &self.header, &mut rels, &mut drawing_ids)?;
            package.add_part("word/header1.xml", &xml)?;
            if !rels.is_empty() {
                package.add_part("word/_rels/header1.xml.rels", &rels.to_xml()?)?;
            }
            types.add_override("/word/header1.xml", CT_HEADER);
            header_rel = Some(doc_rels.add(REL_HEADER, "header1.xml"));
        }

        let mut footer_rel = None;
        if !self.footer.is_empty() {
            let mut rels = Relationships::default();
            let xml = self.story_xml("w:ftr", &self.footer, &mut rels, &mut drawing_ids)?;
            package.add_part("word/footer1.xml", &xml)?;
            if !rels.is_empty() {
                package.add_part("word/_rels/footer1.xml.rels", &rels.to_xml()?)?;
            }
            types.add_override("/word/footer1.xml", CT_FOOTER);
            footer_rel = Some(doc_rels.add(REL_FOOTER, "footer1.xml"));
        }

        let document = self.document_xml(
            &mut doc_rels,
            &mut drawing_ids,
            header_rel.as_deref(),
            footer_rel.as_deref(),
        )?;
        package.add_part("word/document.xml", &document)?;
        package.add_part("word/_rels/document.xml.rels", &doc_rels.to_xml()?)?;

        for media in &self.media {
            types.add_default(media.extension, media.mime);
            package.add_part(&format!("word/media/{}", media.file_name), &media.data)?;
        }

        let mut root_rels = Relationships::default();
        root_rels.add(REL_OFFICE_DOCUMENT, "word/document.xml");
        package.add_part("_rels/.rels", &root_rels.to_xml()?)?;
        package.add_part("[Content_Types].xml", &types.to_xml()?)?;

        log::debug!(
            "Wrote package: {} paragraphs, {} images",
            self.body.len(),
            self.media.len()
        );
        package.finish()
    }

    fn styles_xml(&self) -> Result<Vec<u8>> {
        let size = self.font_half_points.to_string();
        let font = self.font_name.as_str();
        let fonts = [
            ("w:ascii", font),
            ("w:hAnsi", font),
            ("w:eastAsia", font),
            ("w:cs", font),
        ];

        let mut out = XmlOut::new()?;
        out.start("w:styles", &[("xmlns:w", NS_W)])?;
        out.start("w:docDefaults", &[])?;
        out.start("w:rPrDefault", &[])?;
        out.start("w:rPr", &[])?;
        out.empty("w:rFonts", &fonts)?;
        out.empty("w:sz", &[("w:val", size.as_str())])?;
        out.empty("w:szCs", &[("w:val", size.as_str())])?;
        out.end("w:rPr")?;
        out.end("w:rPrDefault")?;
        out.start("w:pPrDefault", &[])?;
        out.start("w:pPr", &[])?;
        out.empty(
            "w:spacing",
            &[("w:after", "160"), ("w:line", "259"), ("w:lineRule", "auto")],
        )?;
        out.end("w:pPr")?;
        out.end("w:pPrDefault")?;
        out.end("w:docDefaults")?;

        out.start(
            "w:style",
            &[("w:type", "paragraph"), ("w:default", "1"), ("w:styleId", "Normal")],
        )?;
        out.empty("w:name", &[("w:val", "Normal")])?;
        out.start("w:rPr", &[])?;
        out.empty("w:rFonts", &fonts)?;
        out.empty("w:sz", &[("w:val", size.as_str())])?;
        out.end("w:rPr")?;
        out.end("w:style")?;
        out.end("w:styles")?;
        Ok(out.into_bytes())
    }

    fn document_xml(
        &self,
        rels: &mut Relationships,
        drawing_ids: &mut u32,
        header_rel: Option<&str>,
        footer_rel: Option<&str>,
    ) -> Result<Vec<u8>> {
        let mut out = XmlOut::new()?;
        out.start("w:document", &namespaces())?;
        out.start("w:body", &[])?;
        for paragraph in &self.body {
            self.write_paragraph(&mut out, paragraph, rels, drawing_ids)?;
        }

        let section = &self.section;
        let margins = &section.margins;
        out.start("w:sectPr", &[])?;
        if let Some(id) = header_rel {
            out.empty("w:headerReference", &[("w:type", "default"), ("r:id", id)])?;
        }
        if let Some(id) = footer_rel {
            out.empty("w:footerReference", &[("w:type", "default"), ("r:id", id)])?;
        }
        let width = inches_to_twips(section.page_width).to_string();
        let height = inches_to_twips(section.page_height).to_string();
        out.empty("w:pgSz", &[("w:w", width.as_str()), ("w:h", height.as_str())])?;

        let twips = |inches: f64| inches_to_twips(inches).to_string();
        let (top, right, bottom, left) = (
            twips(margins.top),
            twips(margins.right),
            twips(margins.bottom),
            twips(margins.left),
        );
        let (header, footer) = (twips(margins.header), twips(margins.footer));
        out.empty(
            "w:pgMar",
            &[
                ("w:top", top.as_str()),
                ("w:right", right.as_str()),
                ("w:bottom", bottom.as_str()),
                ("w:left", left.as_str()),
                ("w:header", header.as_str()),
                ("w:footer", footer.as_str()),
                ("w:gutter", "0"),
            ],
        )?;
        out.end("w:sectPr")?;
        out.end("w:body")?;
        out.end("w:document")?;
        Ok(out.into_bytes())
    }

    /// Header or footer part
    fn story_xml(
        &self,
        root: &str,
        paragraphs: &[Paragraph],
        rels: &mut Relationships,
        drawing_ids: &mut u32,
    ) -> Result<Vec<u8>> {
        let mut out = XmlOut::new()?;
        out.start(root, &namespaces())?;
        for paragraph in paragraphs {
            self.write_paragraph(&mut out, paragraph, rels, drawing_ids)?;
        }
        out.end(root)?;
        Ok(out.into_bytes())
    }

    fn write_paragraph(
        &self,
        out: &mut XmlOut,
        paragraph: &Paragraph,
        rels: &mut Relationships,
        drawing_ids: &mut u32,
    ) -> Result<()> {
        out.start("w:p", &[])?;
        if let Some(alignment) = paragraph.alignment {
            out.start("w:pPr", &[])?;
            out.empty("w:jc", &[("w:val", alignment.as_str())])?;
            out.end("w:pPr")?;
        }
        for child in &paragraph.children {
            match child {
                Inline::Run(run) => write_run(out, run)?,
                Inline::Picture(picture) => {
                    let media = self.media.get(picture.media).ok_or_else(|| {
                        DocxError::Image(format!("Unknown picture {}", picture.media))
                    })?;
                    let rel_id = rels.add(REL_IMAGE, &format!("media/{}", media.file_name));
                    *drawing_ids += 1;
                    write_drawing(out, picture, &rel_id, *drawing_ids, &media.file_name)?;
                }
            }
        }
        out.end("w:p")
    }
}

fn namespaces() -> [(&'static str, &'static str); 5] {
    [
        ("xmlns:w", NS_W),
        ("xmlns:r", NS_R),
        ("xmlns:wp", NS_WP),
        ("xmlns:a", NS_A),
        ("xmlns:pic", NS_PIC),
    ]
}

fn write_run(out: &mut XmlOut, run: &Run) -> Result<()> {
    out.start("w:r", &[])?;
    if run.bold {
        out.start("w:rPr", &[])?;
        out.empty("w:b", &[])?;
        out.empty("w:bCs", &[])?;
        out.end("w:rPr")?;
    }

    let mut segment = String::new();
    for c in run.text.chars() {
        match c {
            '\n' | '\t' => {
                write_text(out, &std::mem::take(&mut segment))?;
                out.empty(if c == '\n' { "w:br" } else { "w:tab" }, &[])?;
            }
            '\r' => {}
            _ => segment.push(c),
        }
    }
    write_text(out, &segment)?;
    out.end("w:r")
}

fn write_text(out: &mut XmlOut, text: &str) -> Result<()> {
    if text.is_empty() {
        return Ok(());
    }
    out.start("w:t", &[("xml:space", "preserve")])?;
    out.text(text)?;
    out.end("w:t")
}

fn write_drawing(
    out: &mut XmlOut,
    picture: &Picture,
    rel_id: &str,
    id: u32,
    file_name: &str,
) -> Result<()> {
    let cx = picture.width_emu.to_string();
    let cy = picture.height_emu.to_string();
    let id = id.to_string();
    let name = format!("Picture {id}");
    let extent = [("cx", cx.as_str()), ("cy", cy.as_str())];

    out.start("w:r", &[])?;
    out.start("w:drawing", &[])?;
    out.start(
        "wp:inline",
        &[("distT", "0"), ("distB", "0"), ("distL", "0"), ("distR", "0")],
    )?;
    out.empty("wp:extent", &extent)?;
    out.empty("wp:effectExtent", &[("l", "0"), ("t", "0"), ("r", "0"), ("b", "0")])?;
    out.empty("wp:docPr", &[("id", id.as_str()), ("name", name.as_str())])?;
    out.start("wp:cNvGraphicFramePr", &[])?;
    out.empty("a:graphicFrameLocks", &[("noChangeAspect", "1")])?;
    out.end("wp:cNvGraphicFramePr")?;

    out.start("a:graphic", &[])?;
    out.start("a:graphicData", &[("uri", NS_PIC)])?;
    out.start("pic:pic", &[])?;
    out.start("pic:nvPicPr", &[])?;
    out.empty("pic:cNvPr", &[("id", "0"), ("name", file_name)])?;
    out.empty("pic:cNvPicPr", &[])?;
    out.end("pic:nvPicPr")?;
    out.start("pic:blipFill", &[])?;
    out.empty("a:blip", &[("r:embed", rel_id)])?;
    out.start("a:stretch", &[])?;
    out.empty("a:fillRect", &[])?;
    out.end("a:stretch")?;
    out.end("pic:blipFill")?;
    out.start("pic:spPr", &[])?;
    out.start("a:xfrm", &[])?;
    out.empty("a:off", &[("x", "0"), ("y", "0")])?;
    out.empty("a:ext", &extent)?;
    out.end("a:xfrm")?;
    out.start("a:prstGeom", &[("prst", "rect")])?;
    out.empty("a:avLst", &[])?;
    out.end("a:prstGeom")?;
    out.end("pic:spPr")?;
    out.end("pic:pic")?;
    out.end("a:graphicData")?;
    out.end("a:graphic")?;

    out.end("wp:inline")?;
    out.end("w:drawing")?;
    out.end("w:r")
}
