//! Fixed-layout target
//!
//! The letter is laid out as a single flow of lines and images from the top
//! margin down, starting a new page whenever the next element would cross the
//! bottom margin. Paragraphs are broken greedily at whitespace using the
//! metrics of the font family: the built-in Helvetica pair by default, or
//! caller-supplied TrueType faces that are embedded in the file. Justified
//! paragraphs spread the slack of every line that is not the last line before
//! a break or the paragraph end.

use crate::assets::{ImageAssets, ImageSlot};
use crate::content::{Block, LetterContent, ParagraphAlign, Span};
use crate::options::{HeaderFooterMode, RenderOptions};
use crate::serializer::Serializer;
use crate::RenderError;
use pdf_core::{
    image_dimensions, inches, Align, FontFamily, FontWeight, PageSize, PdfDocument, PdfError,
};

/// Line height as a multiple of the font size
const LEADING: f64 = 1.25;

/// Space after each paragraph or image, in points
const PARAGRAPH_SPACING: f64 = 8.0;

/// Writes the letter as a `.pdf`
#[derive(Debug, Clone)]
pub struct PdfSerializer {
    page_size: PageSize,
    font_size: f32,
    mode: HeaderFooterMode,
    margin_top: f64,
    margin_right: f64,
    margin_bottom: f64,
    margin_left: f64,
    header_distance: f64,
    footer_distance: f64,
    fonts: FontFamily,
}

impl Default for PdfSerializer {
    fn default() -> Self {
        Self::from_options(&RenderOptions::default())
    }
}

impl PdfSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_options(options: &RenderOptions) -> Self {
        Self {
            page_size: options.page_size.pdf_page_size(),
            font_size: options.font_size,
            mode: options.header_footer,
            margin_top: inches(1.0),
            margin_right: inches(0.8),
            margin_bottom: inches(1.0),
            margin_left: inches(0.9),
            header_distance: inches(0.2),
            footer_distance: inches(0.1),
            fonts: FontFamily::helvetica(),
        }
    }

    /// Draw text with the given faces instead of Helvetica
    pub fn with_fonts(mut self, fonts: FontFamily) -> Self {
        self.fonts = fonts;
        self
    }

    fn metrics(&self) -> Metrics<'_> {
        Metrics {
            fonts: &self.fonts,
            font_size: self.font_size,
        }
    }

    fn text_width(&self) -> f64 {
        self.page_size.width - self.margin_left - self.margin_right
    }

    /// Display size of a slot image in points
    fn slot_size(&self, slot: ImageSlot, data: &[u8]) -> Result<(f64, f64), RenderError> {
        let dims = image_dimensions(data).map_err(|e| RenderError::Image {
            slot,
            reason: match e {
                PdfError::ImageError(reason) => reason,
                other => other.to_string(),
            },
        })?;
        if dims.width == 0 || dims.height == 0 {
            return Err(RenderError::Image {
                slot,
                reason: "Image has no pixels".to_string(),
            });
        }

        let placement = slot.placement();
        let width = inches(placement.width_inches).min(self.text_width());
        let height = match placement.height_inches {
            Some(h) => inches(h),
            None => width * dims.height as f64 / dims.width as f64,
        };
        Ok((width, height))
    }

    /// X of an image's left edge for the slot's alignment within the text area
    fn slot_x(&self, slot: ImageSlot, width: f64) -> f64 {
        match slot.placement().align {
            Align::Left => self.margin_left,
            Align::Center => self.margin_left + (self.text_width() - width) / 2.0,
            Align::Right => self.margin_left + self.text_width() - width,
        }
    }
}

/// Contiguous text in one face
#[derive(Debug, Clone, PartialEq)]
struct Piece {
    text: String,
    bold: bool,
    width: f64,
}

/// Unbreakable unit: text between whitespace, possibly mixing faces
#[derive(Debug, Clone, Default, PartialEq)]
struct Word {
    pieces: Vec<Piece>,
    width: f64,
}

impl Word {
    fn push(&mut self, c: char, bold: bool, width: f64) {
        match self.pieces.last_mut() {
            Some(piece) if piece.bold == bold => {
                piece.text.push(c);
                piece.width += width;
            }
            _ => self.pieces.push(Piece {
                text: c.to_string(),
                bold,
                width,
            }),
        }
        self.width += width;
    }

    fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(Word),
    /// Whitespace of the given natural width
    Gap(f64),
    Break,
}

/// A laid-out line: words with the gap before each
#[derive(Debug, Clone, Default, PartialEq)]
struct Line {
    words: Vec<(f64, Word)>,
    /// Ended by a forced break or the paragraph end
    last: bool,
}

impl Line {
    fn width(&self) -> f64 {
        self.words.iter().map(|(gap, word)| gap + word.width).sum()
    }
}

fn weight(bold: bool) -> FontWeight {
    if bold {
        FontWeight::Bold
    } else {
        FontWeight::Regular
    }
}

/// Font family at a size
#[derive(Clone, Copy)]
struct Metrics<'a> {
    fonts: &'a FontFamily,
    font_size: f32,
}

impl Metrics<'_> {
    /// Advance of a character in points
    fn advance(&self, c: char, bold: bool) -> f64 {
        self.fonts.get_variant(weight(bold)).char_width(c) * self.font_size as f64 / 1000.0
    }
}

/// Split spans into words, gaps and forced breaks
fn tokenize(spans: &[Span], metrics: Metrics<'_>) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut word = Word::default();

    for span in spans {
        for c in span.text.chars() {
            match c {
                '\n' | ' ' | '\t' => {
                    if !word.is_empty() {
                        tokens.push(Token::Word(std::mem::take(&mut word)));
                    }
                    if c == '\n' {
                        tokens.push(Token::Break);
                        continue;
                    }
                    let spaces = if c == '\t' { 4 } else { 1 };
                    let width = metrics.advance(' ', span.bold) * spaces as f64;
                    match tokens.last_mut() {
                        Some(Token::Gap(gap)) => *gap += width,
                        _ => tokens.push(Token::Gap(width)),
                    }
                }
                '\r' => {}
                _ => word.push(c, span.bold, metrics.advance(c, span.bold)),
            }
        }
    }
    if !word.is_empty() {
        tokens.push(Token::Word(word));
    }
    tokens
}

/// Break a word wider than `max_width` into chunks that fit
fn split_word(word: Word, max_width: f64, metrics: Metrics<'_>) -> Vec<Word> {
    let mut chunks = Vec::new();
    let mut current = Word::default();
    for piece in word.pieces {
        for c in piece.text.chars() {
            let width = metrics.advance(c, piece.bold);
            if !current.is_empty() && current.width + width > max_width {
                chunks.push(std::mem::take(&mut current));
            }
            current.push(c, piece.bold, width);
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Greedy line breaking
fn break_lines(tokens: Vec<Token>, max_width: f64, metrics: Metrics<'_>) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut line = Line::default();
    let mut width = 0.0;
    let mut pending_gap = 0.0;

    for token in tokens {
        match token {
            Token::Gap(gap) => pending_gap += gap,
            Token::Break => {
                line.last = true;
                lines.push(std::mem::take(&mut line));
                width = 0.0;
                pending_gap = 0.0;
            }
            Token::Word(word) => {
                let words = if word.width > max_width {
                    split_word(word, max_width, metrics)
                } else {
                    vec![word]
                };
                for word in words {
                    let gap = if line.words.is_empty() { 0.0 } else { pending_gap };
                    if !line.words.is_empty() && width + gap + word.width > max_width {
                        lines.push(std::mem::take(&mut line));
                        width = word.width;
                        line.words.push((0.0, word));
                    } else {
                        width += gap + word.width;
                        line.words.push((gap, word));
                    }
                    pending_gap = 0.0;
                }
            }
        }
    }
    line.last = true;
    lines.push(line);
    lines
}

/// Running state of the flow
struct Cursor {
    page: usize,
    y: f64,
    top: f64,
    bottom: f64,
}

impl Cursor {
    /// Move to a new page when `height` does not fit below the cursor
    fn reserve(&mut self, doc: &mut PdfDocument, height: f64) {
        if self.y + height > self.bottom && self.y > self.top {
            self.page = doc.add_blank_page();
            self.y = self.top;
        }
    }
}

impl PdfSerializer {
    /// Left edge of every piece on a line
    fn place_line<'l>(&self, line: &'l Line, align: ParagraphAlign) -> Vec<(f64, &'l Piece)> {
        let max_width = self.text_width();
        let stretch = match align {
            ParagraphAlign::Justify if !line.last && line.words.len() > 1 => {
                (max_width - line.width()).max(0.0) / (line.words.len() - 1) as f64
            }
            _ => 0.0,
        };

        let mut placed = Vec::new();
        let mut x = self.margin_left;
        for (i, (gap, word)) in line.words.iter().enumerate() {
            x += gap;
            if i > 0 {
                x += stretch;
            }
            for piece in &word.pieces {
                placed.push((x, piece));
                x += piece.width;
            }
        }
        placed
    }

    fn draw_paragraph(
        &self,
        doc: &mut PdfDocument,
        cursor: &mut Cursor,
        spans: &[Span],
        align: ParagraphAlign,
    ) -> Result<(), RenderError> {
        let size = self.font_size as f64;
        let line_height = size * LEADING;
        let ascent = self.fonts.get_variant(FontWeight::Regular).ascender() * size / 1000.0;
        let baseline_offset = (line_height - size) / 2.0 + ascent;

        let metrics = self.metrics();
        let lines = break_lines(tokenize(spans, metrics), self.text_width(), metrics);
        log::debug!("Paragraph laid out in {} lines", lines.len());

        for line in &lines {
            cursor.reserve(doc, line_height);

            let baseline = cursor.y + baseline_offset;
            for (x, piece) in self.place_line(line, align) {
                let font = self.fonts.get_variant(weight(piece.bold));
                doc.set_font(font.clone(), self.font_size);
                doc.insert_text(&piece.text, cursor.page, x, baseline)?;
            }
            cursor.y += line_height;
        }
        cursor.y += PARAGRAPH_SPACING;
        Ok(())
    }

    fn draw_flow_image(
        &self,
        doc: &mut PdfDocument,
        cursor: &mut Cursor,
        slot: ImageSlot,
        data: &[u8],
    ) -> Result<(), RenderError> {
        let (width, height) = self.slot_size(slot, data)?;
        cursor.reserve(doc, height);
        let x = self.slot_x(slot, width);
        doc.insert_image(data, cursor.page, x, cursor.y, width, height)?;
        cursor.y += height + PARAGRAPH_SPACING;
        Ok(())
    }
}

impl Serializer for PdfSerializer {
    fn extension(&self) -> &'static str {
        "pdf"
    }

    fn media_type(&self) -> &'static str {
        "application/pdf"
    }

    fn serialize(
        &self,
        content: &LetterContent,
        assets: &ImageAssets,
    ) -> Result<Vec<u8>, RenderError> {
        let mut doc = PdfDocument::new(self.page_size);
        doc.set_title("Invitation Letter");
        if self.fonts.is_embedded() {
            log::debug!("Drawing text with embedded TrueType faces");
        }

        let header = assets
            .get(ImageSlot::Header)
            .map(|data| self.slot_size(ImageSlot::Header, data).map(|size| (data, size)))
            .transpose()?;
        let footer = assets
            .get(ImageSlot::Footer)
            .map(|data| self.slot_size(ImageSlot::Footer, data).map(|size| (data, size)))
            .transpose()?;

        let mut top = self.margin_top;
        let mut bottom = self.page_size.height - self.margin_bottom;
        if self.mode == HeaderFooterMode::Running {
            if let Some((_, (_, h))) = header {
                top = top.max(self.header_distance + h + PARAGRAPH_SPACING);
            }
            if let Some((_, (_, h))) = footer {
                let limit = self.page_size.height - self.footer_distance - h - PARAGRAPH_SPACING;
                bottom = bottom.min(limit);
            }
        }

        let mut cursor = Cursor {
            page: doc.add_blank_page(),
            y: top,
            top,
            bottom,
        };

        if self.mode == HeaderFooterMode::Flow {
            if let Some((data, _)) = header {
                self.draw_flow_image(&mut doc, &mut cursor, ImageSlot::Header, data)?;
            }
        }

        for block in &content.blocks {
            match block {
                Block::Paragraph { spans, align } => {
                    self.draw_paragraph(&mut doc, &mut cursor, spans, *align)?
                }
                Block::Image(slot) => match assets.get(*slot) {
                    Some(data) => self.draw_flow_image(&mut doc, &mut cursor, *slot, data)?,
                    None => log::debug!("No {slot} image; skipping placeholder"),
                },
            }
        }

        match self.mode {
            HeaderFooterMode::Flow => {
                if let Some((data, _)) = footer {
                    self.draw_flow_image(&mut doc, &mut cursor, ImageSlot::Footer, data)?;
                }
            }
            HeaderFooterMode::Running => {
                for page in 1..=doc.page_count() {
                    if let Some((data, (w, h))) = header {
                        let x = self.slot_x(ImageSlot::Header, w);
                        doc.insert_image(data, page, x, self.header_distance, w, h)?;
                    }
                    if let Some((data, (w, h))) = footer {
                        let x = self.slot_x(ImageSlot::Footer, w);
                        let y = self.page_size.height - self.footer_distance - h;
                        doc.insert_image(data, page, x, y, w, h)?;
                    }
                }
            }
        }

        log::debug!("Fixed layout uses {} pages", doc.page_count());
        Ok(doc.to_bytes()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn at_11pt(fonts: &FontFamily) -> Metrics<'_> {
        Metrics {
            fonts,
            font_size: 11.0,
        }
    }

    fn words(line: &Line) -> Vec<String> {
        line.words
            .iter()
            .map(|(_, w)| w.pieces.iter().map(|p| p.text.as_str()).collect())
            .collect()
    }

    #[test]
    fn test_tokenize_mixed_faces() {
        let fonts = FontFamily::helvetica();
        let spans = [Span::plain("to "), Span::bold("Jane Doe, "), Span::plain("x")];
        let tokens = tokenize(&spans, at_11pt(&fonts));
        assert_eq!(tokens.len(), 7);
        assert!(matches!(tokens[1], Token::Gap(_)));
        match &tokens[2] {
            Token::Word(word) => {
                assert_eq!(word.pieces.len(), 1);
                assert!(word.pieces[0].bold);
                assert_eq!(word.pieces[0].text, "Jane");
            }
            other => panic!("expected word, got {:?}", other),
        }
    }

    #[test]
    fn test_word_across_spans_stays_together() {
        let fonts = FontFamily::helvetica();
        let tokens = tokenize(&[Span::bold("Canadian"), Span::plain(".")], at_11pt(&fonts));
        assert_eq!(tokens.len(), 1);
        match &tokens[0] {
            Token::Word(word) => assert_eq!(word.pieces.len(), 2),
            other => panic!("expected word, got {:?}", other),
        }
    }

    #[test]
    fn test_forced_breaks_make_lines() {
        let fonts = FontFamily::helvetica();
        let tokens = tokenize(&[Span::plain("Date: today\n")], at_11pt(&fonts));
        let lines = break_lines(tokens, 500.0, at_11pt(&fonts));

        assert_eq!(lines.len(), 2);
        assert_eq!(words(&lines[0]), vec!["Date:", "today"]);
        assert!(lines[0].last);
        assert!(lines[1].words.is_empty());
    }

    #[test]
    fn test_greedy_wrap_respects_width() {
        let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa";
        let fonts = FontFamily::helvetica();
        let tokens = tokenize(&[Span::plain(text)], at_11pt(&fonts));
        let lines = break_lines(tokens, 100.0, at_11pt(&fonts));

        assert!(lines.len() > 1);
        for line in &lines {
            assert!(line.width() <= 100.0 + 1e-9);
        }
        assert!(!lines[0].last);
        assert!(lines[lines.len() - 1].last);
        let rejoined: Vec<String> = lines.iter().flat_map(words).collect();
        assert_eq!(rejoined.join(" "), text);
    }

    #[test]
    fn test_long_word_is_split() {
        let fonts = FontFamily::helvetica();
        let tokens = tokenize(&[Span::plain("x".repeat(200))], at_11pt(&fonts));
        let lines = break_lines(tokens, 100.0, at_11pt(&fonts));
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.width() <= 100.0 + 1e-9));
    }

    #[test]
    fn test_justified_lines_end_at_right_margin() {
        let serializer = PdfSerializer::new();
        let fonts = FontFamily::helvetica();
        let text = vec!["aaaa"; 40].join(" ");
        let tokens = tokenize(&[Span::plain(text)], at_11pt(&fonts));
        let lines = break_lines(tokens, serializer.text_width(), at_11pt(&fonts));
        // 17 words fit a Letter line at 11pt
        assert_eq!(lines.len(), 3);

        let right = serializer.margin_left + serializer.text_width();
        let line_end = |line: &Line, align: ParagraphAlign| {
            let placed = serializer.place_line(line, align);
            let (x, piece) = placed[placed.len() - 1];
            x + piece.width
        };

        for line in &lines[..2] {
            assert!(!line.last);
            assert!(line.width() < serializer.text_width() - 1.0);
            assert!((line_end(line, ParagraphAlign::Justify) - right).abs() < 0.01);
            let natural = serializer.margin_left + line.width();
            assert!((line_end(line, ParagraphAlign::Left) - natural).abs() < 1e-9);
        }

        let last = &lines[2];
        assert!(last.last);
        let natural = serializer.margin_left + last.width();
        assert!((line_end(last, ParagraphAlign::Justify) - natural).abs() < 1e-9);
        assert!(line_end(last, ParagraphAlign::Justify) < right - 100.0);
    }

    #[test]
    fn test_footer_width_capped_on_a4() {
        let options = RenderOptions {
            page_size: crate::options::PageFormat::A4,
            ..RenderOptions::default()
        };
        let serializer = PdfSerializer::from_options(&options);
        let png = {
            let img = image::RgbImage::from_pixel(100, 10, image::Rgb([0, 0, 0]));
            let mut bytes = Vec::new();
            image::DynamicImage::ImageRgb8(img)
                .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
                .unwrap();
            bytes
        };

        let (w, h) = serializer.slot_size(ImageSlot::Footer, &png).unwrap();
        assert!((w - serializer.text_width()).abs() < 1e-9);
        assert!((h - w / 10.0).abs() < 1e-9);

        let (w, h) = serializer.slot_size(ImageSlot::Signature, &png).unwrap();
        assert_eq!((w, h), (180.0, 72.0));
    }

    #[test]
    fn test_invalid_header_image() {
        let assets = ImageAssets::new().with_header(b"nope".to_vec());
        let result = PdfSerializer::new().serialize(&LetterContent::default(), &assets);
        assert!(matches!(
            result,
            Err(RenderError::Image {
                slot: ImageSlot::Header,
                ..
            })
        ));
    }
}
