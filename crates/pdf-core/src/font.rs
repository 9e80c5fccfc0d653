//! Fonts for PDF text
//!
//! Two kinds of faces are supported:
//! - the Helvetica pair from the PDF standard 14 set, which needs no embedding
//!   and is limited to WinAnsi (Latin-1 plus typographic punctuation)
//! - caller-supplied TrueType faces, embedded whole as `CIDFontType2` with
//!   `Identity-H` encoding so any character the font covers can be drawn
//!
//! Widths are reported in 1/1000 em, the unit of PDF glyph space.

use crate::{PdfError, Result};
use lopdf::{dictionary, Dictionary, Object, Stream};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

/// Font weight variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FontWeight {
    #[default]
    Regular,
    Bold,
}

/// Standard 14 faces used by the writer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum StandardFont {
    #[default]
    Helvetica,
    HelveticaBold,
}

/// Helvetica advance widths for code points 32..=126
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
    334, 260, 334, 584, // '{'..'~'
];

/// Helvetica-Bold advance widths for code points 32..=126
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    333, 333, 584, 584, 584, 611, 975, // ':'..'@'
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    333, 278, 333, 584, 556, 333, // '['..'`'
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, // 'a'..'m'
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, // 'n'..'z'
    389, 280, 389, 584, // '{'..'~'
];

/// Fallback width for glyphs outside the ASCII tables
const DEFAULT_WIDTH: u16 = 556;

impl StandardFont {
    /// PostScript base font name
    pub fn base_name(self) -> &'static str {
        match self {
            StandardFont::Helvetica => "Helvetica",
            StandardFont::HelveticaBold => "Helvetica-Bold",
        }
    }

    /// Advance width of a character in 1/1000 em
    pub fn char_width(self, c: char) -> u16 {
        let table = match self {
            StandardFont::Helvetica => &HELVETICA_WIDTHS,
            StandardFont::HelveticaBold => &HELVETICA_BOLD_WIDTHS,
        };

        match c {
            ' '..='~' => table[c as usize - 32],
            '\u{2018}' | '\u{2019}' | '\u{201A}' => match self {
                StandardFont::Helvetica => 222,
                StandardFont::HelveticaBold => 278,
            },
            '\u{201C}' | '\u{201D}' | '\u{201E}' => match self {
                StandardFont::Helvetica => 333,
                StandardFont::HelveticaBold => 500,
            },
            '\u{2013}' => 556,
            '\u{2014}' | '\u{2026}' => 1000,
            '\u{2022}' => 350,
            '\u{00A0}' => 278,
            _ => DEFAULT_WIDTH,
        }
    }

    /// Ascender height in 1/1000 em
    pub fn ascender(self) -> i16 {
        718
    }

    /// Font dictionary for the page resources
    pub(crate) fn to_pdf_dict(self) -> Dictionary {
        dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => self.base_name(),
            "Encoding" => "WinAnsiEncoding",
        }
    }
}

/// Encode text as WinAnsi bytes
///
/// Latin-1 maps straight through; the typographic punctuation living in
/// 0x80..0x9F is remapped. Anything else becomes `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{20}'..='\u{7E}' | '\u{A0}'..='\u{FF}' => c as u8,
            '\u{20AC}' => 0x80,
            '\u{201A}' => 0x82,
            '\u{201E}' => 0x84,
            '\u{2026}' => 0x85,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\t' => b' ',
            _ => b'?',
        })
        .collect()
}

/// Encode text as a WinAnsi PDF hex string (e.g. `<48656C6C6F>`)
pub fn encode_text_hex(text: &str) -> String {
    let mut hex = String::with_capacity(text.len() * 2 + 2);
    hex.push('<');
    for byte in encode_win_ansi(text) {
        hex.push_str(&format!("{byte:02X}"));
    }
    hex.push('>');
    hex
}

/// PDF objects generated for an embedded font
///
/// References between them are filled in when the objects are added to a
/// document.
pub(crate) struct FontObjects {
    pub type0_font: Dictionary,
    pub cid_font: Dictionary,
    pub font_descriptor: Dictionary,
    pub font_file_stream: Stream,
    pub tounicode_stream: Stream,
}

/// An embeddable TrueType face
///
/// The character map and advance widths are read once at construction; the
/// raw bytes are kept for embedding.
pub struct TrueTypeFont {
    name: String,
    data: Vec<u8>,
    glyphs: HashMap<char, u16>,
    advances: Vec<u16>,
    units_per_em: u16,
    ascender: i16,
    descender: i16,
    bbox: [i16; 4],
}

impl fmt::Debug for TrueTypeFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrueTypeFont")
            .field("name", &self.name)
            .field("glyphs", &self.advances.len())
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl TrueTypeFont {
    /// Parse TrueType font bytes
    pub fn from_ttf(data: Vec<u8>) -> Result<Self> {
        let face = ttf_parser::Face::parse(&data, 0)
            .map_err(|e| PdfError::FontParseError(e.to_string()))?;

        let mut glyphs = HashMap::new();
        if let Some(cmap) = face.tables().cmap {
            for subtable in cmap.subtables {
                if !subtable.is_unicode() {
                    continue;
                }
                subtable.codepoints(|cp| {
                    if let (Some(c), Some(gid)) = (char::from_u32(cp), subtable.glyph_index(cp)) {
                        glyphs.entry(c).or_insert(gid.0);
                    }
                });
            }
        }
        if glyphs.is_empty() {
            return Err(PdfError::FontParseError(
                "Font has no Unicode character map".to_string(),
            ));
        }

        let advances = (0..face.number_of_glyphs())
            .map(|gid| face.glyph_hor_advance(ttf_parser::GlyphId(gid)).unwrap_or(0))
            .collect();

        let name = face
            .names()
            .into_iter()
            .filter(|n| n.name_id == ttf_parser::name_id::POST_SCRIPT_NAME)
            .find_map(|n| n.to_string())
            .map(|n| {
                n.chars()
                    .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
                    .collect::<String>()
            })
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "EmbeddedFont".to_string());

        let bbox = face.global_bounding_box();

        Ok(Self {
            name,
            glyphs,
            advances,
            units_per_em: face.units_per_em(),
            ascender: face.ascender(),
            descender: face.descender(),
            bbox: [bbox.x_min, bbox.y_min, bbox.x_max, bbox.y_max],
            data,
        })
    }

    /// Glyph id of a character, `.notdef` (0) when unmapped
    pub fn glyph_id(&self, c: char) -> u16 {
        self.glyphs.get(&c).copied().unwrap_or(0)
    }

    /// Font units to 1/1000 em
    fn scale(&self, units: f64) -> f64 {
        units * 1000.0 / self.units_per_em as f64
    }

    fn glyph_width(&self, gid: u16) -> f64 {
        let advance = self.advances.get(gid as usize).copied().unwrap_or(0);
        self.scale(advance as f64)
    }

    /// Advance width of a character in 1/1000 em
    pub fn char_width(&self, c: char) -> f64 {
        self.glyph_width(self.glyph_id(c))
    }

    /// Ascender height in 1/1000 em
    pub fn ascender(&self) -> f64 {
        self.scale(self.ascender as f64)
    }

    /// Encode text as big-endian glyph ids (`Identity-H`)
    pub fn encode_text_hex(&self, text: &str) -> String {
        let mut hex = String::with_capacity(text.len() * 4 + 2);
        hex.push('<');
        for c in text.chars() {
            hex.push_str(&format!("{:04X}", self.glyph_id(c)));
        }
        hex.push('>');
        hex
    }

    /// Objects embedding the whole font, with widths and a ToUnicode map for
    /// the characters actually drawn
    pub(crate) fn to_pdf_objects(&self, used: &BTreeSet<char>) -> FontObjects {
        let base_font = Object::Name(self.name.clone().into_bytes());
        let scaled = |v: i16| Object::Integer(self.scale(v as f64).round() as i64);

        let font_file_stream = Stream::new(
            dictionary! { "Length1" => self.data.len() as i64 },
            self.data.clone(),
        );

        let font_descriptor = dictionary! {
            "Type" => "FontDescriptor",
            "FontName" => base_font.clone(),
            "Flags" => 32,
            "FontBBox" => self.bbox.iter().map(|v| scaled(*v)).collect::<Vec<_>>(),
            "ItalicAngle" => 0,
            "Ascent" => scaled(self.ascender),
            "Descent" => scaled(self.descender),
            "CapHeight" => scaled(self.ascender),
            "StemV" => 80,
        };

        let mut gids: Vec<u16> = used.iter().map(|c| self.glyph_id(*c)).collect();
        gids.sort_unstable();
        gids.dedup();
        let mut widths = Vec::with_capacity(gids.len() * 2);
        for gid in gids {
            widths.push(Object::Integer(gid as i64));
            widths.push(Object::Array(vec![Object::Integer(
                self.glyph_width(gid).round() as i64,
            )]));
        }

        let cid_font = dictionary! {
            "Type" => "Font",
            "Subtype" => "CIDFontType2",
            "BaseFont" => base_font.clone(),
            "CIDSystemInfo" => dictionary! {
                "Registry" => Object::string_literal("Adobe"),
                "Ordering" => Object::string_literal("Identity"),
                "Supplement" => 0,
            },
            "CIDToGIDMap" => "Identity",
            "DW" => Object::Integer(self.glyph_width(0).round() as i64),
            "W" => widths,
        };

        let type0_font = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => base_font,
            "Encoding" => "Identity-H",
        };

        FontObjects {
            type0_font,
            cid_font,
            font_descriptor,
            font_file_stream,
            tounicode_stream: Stream::new(
                Dictionary::new(),
                self.tounicode_cmap(used).into_bytes(),
            ),
        }
    }

    /// CMap from glyph ids back to Unicode for text extraction
    fn tounicode_cmap(&self, used: &BTreeSet<char>) -> String {
        let mut cmap = String::from(
            "/CIDInit /ProcSet findresource begin\n\
             12 dict begin\n\
             begincmap\n\
             /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
             /CMapName /Adobe-Identity-UCS def\n\
             /CMapType 2 def\n\
             1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n",
        );

        let mapped: Vec<(u16, char)> = used
            .iter()
            .map(|c| (self.glyph_id(*c), *c))
            .filter(|(gid, _)| *gid != 0)
            .collect();

        // at most 100 entries per block
        for chunk in mapped.chunks(100) {
            cmap.push_str(&format!("{} beginbfchar\n", chunk.len()));
            for (gid, c) in chunk {
                let mut utf16 = [0u16; 2];
                let unicode: String = c
                    .encode_utf16(&mut utf16)
                    .iter()
                    .map(|unit| format!("{unit:04X}"))
                    .collect();
                cmap.push_str(&format!("<{gid:04X}> <{unicode}>\n"));
            }
            cmap.push_str("endbfchar\n");
        }

        cmap.push_str(
            "endcmap\n\
             CMapName currentdict /CMap defineresource pop\n\
             end\n\
             end\n",
        );
        cmap
    }
}

/// A face text can be drawn with
#[derive(Debug, Clone)]
pub enum Font {
    Standard(StandardFont),
    TrueType(Arc<TrueTypeFont>),
}

impl Font {
    /// Advance width of a character in 1/1000 em
    pub fn char_width(&self, c: char) -> f64 {
        match self {
            Font::Standard(font) => font.char_width(c) as f64,
            Font::TrueType(font) => font.char_width(c),
        }
    }

    /// Ascender height in 1/1000 em
    pub fn ascender(&self) -> f64 {
        match self {
            Font::Standard(font) => font.ascender() as f64,
            Font::TrueType(font) => font.ascender(),
        }
    }

    /// Hex string operand for `Tj`
    pub fn encode_text_hex(&self, text: &str) -> String {
        match self {
            Font::Standard(_) => encode_text_hex(text),
            Font::TrueType(font) => font.encode_text_hex(text),
        }
    }

    /// Same underlying face (embedded faces compare by identity)
    pub(crate) fn same_face(&self, other: &Font) -> bool {
        match (self, other) {
            (Font::Standard(a), Font::Standard(b)) => a == b,
            (Font::TrueType(a), Font::TrueType(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<StandardFont> for Font {
    fn from(font: StandardFont) -> Self {
        Font::Standard(font)
    }
}

impl From<TrueTypeFont> for Font {
    fn from(font: TrueTypeFont) -> Self {
        Font::TrueType(Arc::new(font))
    }
}

/// Regular and bold faces of one typeface
#[derive(Debug, Clone)]
pub struct FontFamily {
    regular: Font,
    bold: Font,
}

impl FontFamily {
    /// The built-in Helvetica pair
    pub fn helvetica() -> Self {
        Self {
            regular: StandardFont::Helvetica.into(),
            bold: StandardFont::HelveticaBold.into(),
        }
    }

    /// Embedded TrueType faces; without a bold face, bold text uses the
    /// regular one
    pub fn from_ttf(regular: Vec<u8>, bold: Option<Vec<u8>>) -> Result<Self> {
        let regular: Font = TrueTypeFont::from_ttf(regular)?.into();
        let bold = match bold {
            Some(data) => TrueTypeFont::from_ttf(data)?.into(),
            None => regular.clone(),
        };
        Ok(Self { regular, bold })
    }

    /// Face for a weight
    pub fn get_variant(&self, weight: FontWeight) -> &Font {
        match weight {
            FontWeight::Regular => &self.regular,
            FontWeight::Bold => &self.bold,
        }
    }

    /// Whether the faces are embedded TrueType fonts
    pub fn is_embedded(&self) -> bool {
        matches!(self.regular, Font::TrueType(_))
    }
}

impl Default for FontFamily {
    fn default() -> Self {
        Self::helvetica()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Minimal TrueType font: `chars` map to glyphs 1.., every glyph is half
    /// an em wide at 2048 units per em
    pub(crate) fn tiny_ttf(chars: &str) -> Vec<u8> {
        let mut chars: Vec<char> = chars.chars().collect();
        chars.sort_unstable();
        chars.dedup();
        let num_glyphs = chars.len() as u16 + 1;

        let mut head = Vec::new();
        head.extend_from_slice(&0x0001_0000u32.to_be_bytes());
        head.extend_from_slice(&0x0001_0000u32.to_be_bytes());
        head.extend_from_slice(&0u32.to_be_bytes());
        head.extend_from_slice(&0x5F0F_3CF5u32.to_be_bytes());
        head.extend_from_slice(&0u16.to_be_bytes());
        head.extend_from_slice(&2048u16.to_be_bytes());
        head.extend_from_slice(&[0; 16]);
        for v in [0i16, -400, 1024, 1600] {
            head.extend_from_slice(&v.to_be_bytes());
        }
        for v in [0u16, 8, 2, 0, 0] {
            head.extend_from_slice(&v.to_be_bytes());
        }

        let mut hhea = Vec::new();
        hhea.extend_from_slice(&0x0001_0000u32.to_be_bytes());
        for v in [1600i16, -400, 0] {
            hhea.extend_from_slice(&v.to_be_bytes());
        }
        hhea.extend_from_slice(&1024u16.to_be_bytes());
        for v in [0i16, 0, 1024, 1, 0, 0, 0, 0, 0, 0, 0] {
            hhea.extend_from_slice(&v.to_be_bytes());
        }
        hhea.extend_from_slice(&num_glyphs.to_be_bytes());

        let mut maxp = Vec::new();
        maxp.extend_from_slice(&0x0000_5000u32.to_be_bytes());
        maxp.extend_from_slice(&num_glyphs.to_be_bytes());

        let mut hmtx = Vec::new();
        for _ in 0..num_glyphs {
            hmtx.extend_from_slice(&1024u16.to_be_bytes());
            hmtx.extend_from_slice(&0i16.to_be_bytes());
        }

        let mut cmap = Vec::new();
        for v in [0u16, 1, 3, 10] {
            cmap.extend_from_slice(&v.to_be_bytes());
        }
        cmap.extend_from_slice(&12u32.to_be_bytes());
        cmap.extend_from_slice(&12u16.to_be_bytes());
        cmap.extend_from_slice(&0u16.to_be_bytes());
        cmap.extend_from_slice(&(16 + 12 * chars.len() as u32).to_be_bytes());
        cmap.extend_from_slice(&0u32.to_be_bytes());
        cmap.extend_from_slice(&(chars.len() as u32).to_be_bytes());
        for (i, c) in chars.iter().enumerate() {
            cmap.extend_from_slice(&(*c as u32).to_be_bytes());
            cmap.extend_from_slice(&(*c as u32).to_be_bytes());
            cmap.extend_from_slice(&(i as u32 + 1).to_be_bytes());
        }

        let tables: [(&[u8; 4], Vec<u8>); 5] = [
            (b"cmap", cmap),
            (b"head", head),
            (b"hhea", hhea),
            (b"hmtx", hmtx),
            (b"maxp", maxp),
        ];
        let mut font = Vec::new();
        font.extend_from_slice(&0x0001_0000u32.to_be_bytes());
        for v in [tables.len() as u16, 64, 2, 16] {
            font.extend_from_slice(&v.to_be_bytes());
        }
        let mut offset = 12 + 16 * tables.len();
        let mut body = Vec::new();
        for (tag, data) in &tables {
            font.extend_from_slice(*tag);
            font.extend_from_slice(&0u32.to_be_bytes());
            font.extend_from_slice(&(offset as u32).to_be_bytes());
            font.extend_from_slice(&(data.len() as u32).to_be_bytes());
            body.extend_from_slice(data);
            while body.len() % 4 != 0 {
                body.push(0);
            }
            offset = 12 + 16 * tables.len() + body.len();
        }
        font.extend_from_slice(&body);
        font
    }

    #[test]
    fn test_char_widths() {
        assert_eq!(StandardFont::Helvetica.char_width(' '), 278);
        assert_eq!(StandardFont::Helvetica.char_width('W'), 944);
        assert_eq!(StandardFont::Helvetica.char_width('i'), 222);
        assert_eq!(StandardFont::HelveticaBold.char_width('i'), 278);
        assert_eq!(StandardFont::HelveticaBold.char_width('~'), 584);
    }

    #[test]
    fn test_font_dispatch() {
        let font = Font::from(StandardFont::HelveticaBold);
        assert_eq!(font.char_width('i'), 278.0);
        assert_eq!(font.ascender(), 718.0);
        assert_eq!(font.encode_text_hex("é"), "<E9>");
    }

    #[test]
    fn test_encode_win_ansi() {
        assert_eq!(encode_win_ansi("Hi"), b"Hi".to_vec());
        assert_eq!(encode_win_ansi("café"), vec![b'c', b'a', b'f', 0xE9]);
        assert_eq!(encode_win_ansi("\u{2019}"), vec![0x92]);
        assert_eq!(encode_win_ansi("ก"), vec![b'?']);
    }

    #[test]
    fn test_encode_text_hex() {
        assert_eq!(encode_text_hex("Hello"), "<48656C6C6F>");
        assert_eq!(encode_text_hex(""), "<>");
    }

    #[test]
    fn test_font_dict() {
        let dict = StandardFont::HelveticaBold.to_pdf_dict();
        assert_eq!(
            dict.get(b"BaseFont").unwrap().as_name().unwrap(),
            b"Helvetica-Bold"
        );
        assert_eq!(
            dict.get(b"Encoding").unwrap().as_name().unwrap(),
            b"WinAnsiEncoding"
        );
    }

    #[test]
    fn test_truetype_glyphs_and_widths() {
        let font = TrueTypeFont::from_ttf(tiny_ttf("Đcứ")).unwrap();

        // sorted: 'c' < 'Đ' < 'ứ'
        assert_eq!(font.glyph_id('c'), 1);
        assert_eq!(font.glyph_id('Đ'), 2);
        assert_eq!(font.glyph_id('ứ'), 3);
        assert_eq!(font.glyph_id('x'), 0);

        // 1024 / 2048 em
        assert_eq!(font.char_width('ứ'), 500.0);
        assert_eq!(font.ascender(), 1600.0 * 1000.0 / 2048.0);
        assert_eq!(font.encode_text_hex("Đức"), "<000200030001>");
        assert_eq!(font.name, "EmbeddedFont");
    }

    #[test]
    fn test_truetype_rejects_garbage() {
        assert!(matches!(
            TrueTypeFont::from_ttf(vec![0u8; 100]),
            Err(PdfError::FontParseError(_))
        ));
    }

    #[test]
    fn test_tounicode_maps_used_glyphs() {
        let font = TrueTypeFont::from_ttf(tiny_ttf("AĐ")).unwrap();
        let used: BTreeSet<char> = "ĐA?".chars().collect();
        let cmap = font.tounicode_cmap(&used);

        assert!(cmap.contains("2 beginbfchar"));
        assert!(cmap.contains("<0001> <0041>"));
        assert!(cmap.contains("<0002> <0110>"));
        assert!(cmap.contains("endcmap"));
    }

    #[test]
    fn test_family_bold_falls_back_to_regular() {
        let family = FontFamily::from_ttf(tiny_ttf("ab"), None).unwrap();
        assert!(family.is_embedded());
        assert!(family
            .get_variant(FontWeight::Bold)
            .same_face(family.get_variant(FontWeight::Regular)));

        let helvetica = FontFamily::default();
        assert!(!helvetica.is_embedded());
        assert!(helvetica
            .get_variant(FontWeight::Bold)
            .same_face(&StandardFont::HelveticaBold.into()));
    }
}
