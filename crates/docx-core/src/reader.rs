//! Body extraction from `word/document.xml`

use crate::package::read_part;
use crate::{DocxError, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// A run of text with its bold flag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContent {
    pub text: String,
    pub bold: bool,
}

/// A top-level paragraph
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParagraphContent {
    /// Value of `w:jc` when present ("both", "right", ...)
    pub alignment: Option<String>,
    pub runs: Vec<RunContent>,
    /// Number of inline drawings in the paragraph
    pub drawings: usize,
}

impl ParagraphContent {
    /// Concatenated run text
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    /// Text of the bold runs only, in order
    pub fn bold_texts(&self) -> Vec<&str> {
        self.runs
            .iter()
            .filter(|r| r.bold)
            .map(|r| r.text.as_str())
            .collect()
    }
}

/// A top-level table as rows of cell texts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub rows: Vec<Vec<String>>,
}

/// Block-level item of the document body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyItem {
    Paragraph(ParagraphContent),
    Table(Table),
}

/// Document body in reading order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Body {
    pub items: Vec<BodyItem>,
}

impl Body {
    /// First top-level table, if any
    pub fn first_table(&self) -> Option<&Table> {
        self.items.iter().find_map(|item| match item {
            BodyItem::Table(table) => Some(table),
            BodyItem::Paragraph(_) => None,
        })
    }

    /// Top-level paragraphs
    pub fn paragraphs(&self) -> impl Iterator<Item = &ParagraphContent> {
        self.items.iter().filter_map(|item| match item {
            BodyItem::Paragraph(p) => Some(p),
            BodyItem::Table(_) => None,
        })
    }
}

/// Read the body of a `.docx` package
///
/// Cell text follows the usual Word conventions: paragraphs joined with
/// `\n`, `w:br`/`w:cr` as `\n` and `w:tab` as `\t`. Only the cell's own
/// paragraphs count; nested tables and text boxes are skipped.
///
/// Rows are expanded over the table grid: a cell spanning `n` columns
/// (`w:gridSpan`) appears `n` times, and a vertical merge continuation
/// (`w:vMerge` without `restart`) repeats the cell above it.
pub fn read_body(data: &[u8]) -> Result<Body> {
    let xml = read_part(data, "word/document.xml")?;
    parse_body(&xml)
}

/// A `w:tc` as written, before spans and merges are expanded
#[derive(Debug, Clone, PartialEq, Eq)]
struct RawCell {
    text: String,
    /// Grid columns covered (`w:gridSpan`)
    span: usize,
    /// `w:vMerge` continuation of the cell above
    continues: bool,
}

impl Default for RawCell {
    fn default() -> Self {
        Self {
            text: String::new(),
            span: 1,
            continues: false,
        }
    }
}

/// Cell texts of one row, one entry per grid column the row yields
fn expand_merges(rows: Vec<Vec<RawCell>>) -> Vec<Vec<String>> {
    // (first grid column, own span, texts yielded) per cell of the previous row
    let mut above: Vec<(usize, usize, Vec<String>)> = Vec::new();
    let mut expanded = Vec::with_capacity(rows.len());

    for row in rows {
        let mut current = Vec::with_capacity(row.len());
        let mut column = 0;
        for cell in row {
            let inherited = if cell.continues {
                above
                    .iter()
                    .find(|(start, span, _)| *start <= column && column < start + span)
                    .map(|(_, _, texts)| texts.clone())
            } else {
                None
            };
            let texts = inherited.unwrap_or_else(|| vec![cell.text.clone(); cell.span]);
            current.push((column, cell.span, texts));
            column += cell.span;
        }
        expanded.push(
            current
                .iter()
                .flat_map(|(_, _, texts)| texts.iter().cloned())
                .collect(),
        );
        above = current;
    }

    expanded
}

/// Parser state while walking the document XML
#[derive(Default)]
struct BodyParser {
    items: Vec<BodyItem>,
    /// Nesting level of `w:tbl`
    table_depth: usize,
    /// Nesting level of `w:txbxContent`
    textbox_depth: usize,
    rows: Vec<Vec<RawCell>>,
    row: Option<Vec<RawCell>>,
    cell: Option<RawCell>,
    /// Paragraphs already seen in the current cell
    cell_paragraphs: usize,
    paragraph: Option<ParagraphContent>,
    in_run: bool,
    in_run_props: bool,
    in_text: bool,
    run_bold: bool,
    run_text: String,
}

impl BodyParser {
    fn push_text(&mut self, text: &str) {
        if self.textbox_depth > 0 || self.table_depth > 1 {
            return;
        }
        if let Some(cell) = self.cell.as_mut() {
            cell.text.push_str(text);
        } else if self.paragraph.is_some() {
            self.run_text.push_str(text);
        }
    }

    fn begin_paragraph(&mut self) {
        if self.textbox_depth > 0 || self.table_depth > 1 {
            return;
        }
        if self.cell.is_some() {
            if self.cell_paragraphs > 0 {
                self.push_text("\n");
            }
            self.cell_paragraphs += 1;
        } else if self.table_depth == 0 {
            self.paragraph = Some(ParagraphContent::default());
        }
    }

    fn end_paragraph(&mut self) {
        if self.textbox_depth > 0 || self.table_depth > 0 {
            return;
        }
        if let Some(paragraph) = self.paragraph.take() {
            self.items.push(BodyItem::Paragraph(paragraph));
        }
    }

    fn end_run(&mut self) {
        self.in_run = false;
        if self.table_depth > 0 || self.textbox_depth > 0 {
            return;
        }
        let text = std::mem::take(&mut self.run_text);
        if let Some(paragraph) = self.paragraph.as_mut() {
            if !text.is_empty() {
                paragraph.runs.push(RunContent {
                    text,
                    bold: self.run_bold,
                });
            }
        }
    }

    fn start(&mut self, e: &BytesStart<'_>, is_empty: bool) {
        match e.local_name().as_ref() {
            b"txbxContent" if !is_empty => self.textbox_depth += 1,
            _ if self.textbox_depth > 0 => {}
            b"tbl" if !is_empty => {
                self.table_depth += 1;
                if self.table_depth == 1 {
                    self.rows.clear();
                }
            }
            b"tr" if self.table_depth == 1 && !is_empty => self.row = Some(Vec::new()),
            b"tr" if self.table_depth == 1 => self.rows.push(Vec::new()),
            b"tc" if self.table_depth == 1 => {
                if is_empty {
                    if let Some(row) = self.row.as_mut() {
                        row.push(RawCell::default());
                    }
                } else {
                    self.cell = Some(RawCell::default());
                    self.cell_paragraphs = 0;
                }
            }
            b"gridSpan" if self.table_depth == 1 => {
                if let Some(cell) = self.cell.as_mut() {
                    cell.span = attribute(e, b"val")
                        .and_then(|v| v.trim().parse().ok())
                        .filter(|span: &usize| *span > 0)
                        .unwrap_or(1);
                }
            }
            b"vMerge" if self.table_depth == 1 => {
                if let Some(cell) = self.cell.as_mut() {
                    cell.continues = attribute(e, b"val").as_deref() != Some("restart");
                }
            }
            b"p" => {
                self.begin_paragraph();
                if is_empty {
                    self.end_paragraph();
                }
            }
            b"jc" if !self.in_run => {
                if let Some(paragraph) = self.paragraph.as_mut() {
                    paragraph.alignment = attribute(e, b"val");
                }
            }
            b"r" if !is_empty => {
                self.in_run = true;
                self.run_bold = false;
                self.run_text.clear();
            }
            b"rPr" if self.in_run && !is_empty => self.in_run_props = true,
            b"b" if self.in_run_props => {
                self.run_bold = !matches!(
                    attribute(e, b"val").as_deref(),
                    Some("0") | Some("false") | Some("off")
                );
            }
            b"t" if self.in_run && !is_empty => self.in_text = true,
            b"br" | b"cr" if self.in_run => self.push_text("\n"),
            b"tab" if self.in_run => self.push_text("\t"),
            b"drawing" if self.in_run && !is_empty => {
                if let Some(paragraph) = self.paragraph.as_mut() {
                    paragraph.drawings += 1;
                }
            }
            _ => {}
        }
    }

    fn end(&mut self, name: &[u8]) {
        match name {
            b"txbxContent" => self.textbox_depth = self.textbox_depth.saturating_sub(1),
            _ if self.textbox_depth > 0 => {}
            b"tbl" => {
                if self.table_depth == 1 {
                    let rows = expand_merges(std::mem::take(&mut self.rows));
                    self.items.push(BodyItem::Table(Table { rows }));
                }
                self.table_depth = self.table_depth.saturating_sub(1);
            }
            b"tr" if self.table_depth == 1 => {
                if let Some(row) = self.row.take() {
                    self.rows.push(row);
                }
            }
            b"tc" if self.table_depth == 1 => {
                if let (Some(cell), Some(row)) = (self.cell.take(), self.row.as_mut()) {
                    row.push(cell);
                }
            }
            b"p" => self.end_paragraph(),
            b"r" => self.end_run(),
            b"rPr" => self.in_run_props = false,
            b"t" => self.in_text = false,
            _ => {}
        }
    }
}

/// Value of the attribute with the given local name
fn attribute(e: &BytesStart<'_>, local: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == local)
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

fn parse_body(xml: &str) -> Result<Body> {
    let mut reader = Reader::from_str(xml);
    let mut parser = BodyParser::default();

    loop {
        let event = reader
            .read_event()
            .map_err(|e| DocxError::Xml(format!("at byte {}: {e}", reader.buffer_position())))?;

        match event {
            Event::Start(e) => parser.start(&e, false),
            Event::Empty(e) => parser.start(&e, true),
            Event::End(e) => parser.end(e.local_name().as_ref()),
            Event::Text(t) if parser.in_text => {
                let text = t.unescape().map_err(|e| DocxError::Xml(e.to_string()))?;
                parser.push_text(&text);
            }
            Event::CData(t) if parser.in_text => {
                parser.push_text(&String::from_utf8_lossy(&t));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if parser.table_depth > 0 || parser.paragraph.is_some() {
        return Err(DocxError::Xml("Unexpected end of document".to_string()));
    }

    log::debug!("Parsed document body: {} items", parser.items.len());
    Ok(Body {
        items: parser.items,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn wrap(body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
        )
    }

    #[test]
    fn test_paragraph_runs_and_bold() {
        let xml = wrap(
            r#"<w:p><w:pPr><w:jc w:val="both"/></w:pPr>
                <w:r><w:t xml:space="preserve">Plain </w:t></w:r>
                <w:r><w:rPr><w:b/></w:rPr><w:t>Bold</w:t></w:r>
                <w:r><w:rPr><w:b w:val="0"/></w:rPr><w:t> off</w:t></w:r>
            </w:p>"#,
        );
        let body = parse_body(&xml).unwrap();
        let paragraph = body.paragraphs().next().unwrap();

        assert_eq!(paragraph.alignment.as_deref(), Some("both"));
        assert_eq!(paragraph.text(), "Plain Bold off");
        assert_eq!(paragraph.bold_texts(), vec!["Bold"]);
    }

    #[test]
    fn test_table_cells() {
        let xml = wrap(
            r#"<w:tbl><w:tblPr/>
                <w:tr><w:tc><w:p><w:r><w:t>Passport number</w:t></w:r></w:p></w:tc>
                      <w:tc><w:p><w:r><w:t> P1 </w:t></w:r></w:p></w:tc></w:tr>
                <w:tr><w:tc><w:p><w:r><w:t>Full Name </w:t><w:br/><w:t>(As it appears on passport)</w:t></w:r></w:p></w:tc>
                      <w:tc><w:p><w:r><w:t>Jane</w:t></w:r></w:p><w:p><w:r><w:t>Doe</w:t></w:r></w:p></w:tc></w:tr>
            </w:tbl>"#,
        );
        let body = parse_body(&xml).unwrap();
        let table = body.first_table().unwrap();

        assert_eq!(
            table.rows,
            vec![
                vec!["Passport number".to_string(), " P1 ".to_string()],
                vec![
                    "Full Name \n(As it appears on passport)".to_string(),
                    "Jane\nDoe".to_string()
                ],
            ]
        );
    }

    #[test]
    fn test_only_first_table_is_first() {
        let xml = wrap(
            r#"<w:tbl><w:tr><w:tc><w:p><w:r><w:t>A</w:t></w:r></w:p></w:tc></w:tr></w:tbl>
               <w:p/>
               <w:tbl><w:tr><w:tc><w:p><w:r><w:t>B</w:t></w:r></w:p></w:tc></w:tr></w:tbl>"#,
        );
        let body = parse_body(&xml).unwrap();

        assert_eq!(body.items.len(), 3);
        assert_eq!(body.first_table().unwrap().rows, vec![vec!["A".to_string()]]);
    }

    #[test]
    fn test_nested_table_text_stays_out_of_cell() {
        let xml = wrap(
            r#"<w:tbl><w:tr>
                <w:tc><w:p><w:r><w:t>Nationality</w:t></w:r></w:p></w:tc>
                <w:tc><w:p><w:r><w:t>Canadian</w:t></w:r></w:p>
                    <w:tbl><w:tr><w:tc><w:p><w:r><w:t>see note</w:t></w:r></w:p></w:tc></w:tr></w:tbl>
                    <w:p/>
                </w:tc>
            </w:tr></w:tbl>"#,
        );
        let body = parse_body(&xml).unwrap();
        assert_eq!(
            body.first_table().unwrap().rows,
            vec![vec!["Nationality".to_string(), "Canadian\n".to_string()]]
        );
    }

    #[test]
    fn test_grid_span_repeats_cell() {
        let xml = wrap(
            r#"<w:tbl>
                <w:tr><w:tc><w:tcPr><w:gridSpan w:val="2"/></w:tcPr><w:p><w:r><w:t>Applicant details</w:t></w:r></w:p></w:tc></w:tr>
                <w:tr><w:tc><w:p><w:r><w:t>Nationality</w:t></w:r></w:p></w:tc>
                      <w:tc><w:p><w:r><w:t>Canadian</w:t></w:r></w:p></w:tc></w:tr>
            </w:tbl>"#,
        );
        let body = parse_body(&xml).unwrap();
        assert_eq!(
            body.first_table().unwrap().rows,
            vec![
                vec!["Applicant details".to_string(), "Applicant details".to_string()],
                vec!["Nationality".to_string(), "Canadian".to_string()],
            ]
        );
    }

    #[test]
    fn test_vertical_merge_repeats_cell_above() {
        let xml = wrap(
            r#"<w:tbl>
                <w:tr><w:tc><w:p><w:r><w:t>Arrival Date in Bangladesh</w:t></w:r></w:p></w:tc>
                      <w:tc><w:tcPr><w:vMerge w:val="restart"/></w:tcPr><w:p><w:r><w:t>2025-02-01</w:t></w:r></w:p></w:tc></w:tr>
                <w:tr><w:tc><w:p><w:r><w:t>Departure Date</w:t></w:r></w:p></w:tc>
                      <w:tc><w:tcPr><w:vMerge/></w:tcPr><w:p/></w:tc></w:tr>
                <w:tr><w:tc><w:p><w:r><w:t>Job Title</w:t></w:r></w:p></w:tc>
                      <w:tc><w:tcPr><w:vMerge w:val="continue"/></w:tcPr><w:p/></w:tc></w:tr>
            </w:tbl>"#,
        );
        let body = parse_body(&xml).unwrap();
        let values: Vec<&str> = body
            .first_table()
            .unwrap()
            .rows
            .iter()
            .map(|row| row[1].as_str())
            .collect();
        assert_eq!(values, vec!["2025-02-01", "2025-02-01", "2025-02-01"]);
    }

    #[test]
    fn test_merge_continuation_under_span() {
        let rows = expand_merges(vec![
            vec![RawCell {
                text: "Head".to_string(),
                span: 2,
                continues: false,
            }],
            vec![RawCell {
                text: String::new(),
                span: 2,
                continues: true,
            }],
            vec![RawCell {
                text: "Lone".to_string(),
                span: 1,
                continues: true,
            }],
        ]);
        assert_eq!(
            rows,
            vec![
                vec!["Head".to_string(), "Head".to_string()],
                vec!["Head".to_string(), "Head".to_string()],
                vec!["Head".to_string(), "Head".to_string()],
            ]
        );
    }

    #[test]
    fn test_textbox_content_is_skipped() {
        let xml = wrap(
            r#"<w:p><w:r><w:t>Visible</w:t></w:r><w:r><w:pict><v:shape xmlns:v="urn:v"><v:textbox><w:txbxContent>
                <w:tbl><w:tr><w:tc><w:p><w:r><w:t>Hidden</w:t></w:r></w:p></w:tc></w:tr></w:tbl>
               </w:txbxContent></v:textbox></v:shape></w:pict></w:r></w:p>"#,
        );
        let body = parse_body(&xml).unwrap();
        assert!(body.first_table().is_none());
        assert_eq!(body.paragraphs().next().unwrap().text(), "Visible");
    }

    #[test]
    fn test_tab_stops_are_not_text() {
        let xml = wrap(
            r#"<w:p><w:pPr><w:tabs><w:tab w:val="left" w:pos="720"/></w:tabs></w:pPr>
                <w:r><w:t>a</w:t><w:tab/><w:t>b</w:t></w:r></w:p>"#,
        );
        let body = parse_body(&xml).unwrap();
        assert_eq!(body.paragraphs().next().unwrap().text(), "a\tb");
    }

    #[test]
    fn test_entities_are_unescaped() {
        let xml = wrap(r#"<w:p><w:r><w:t>R&amp;D &lt;team&gt;</w:t></w:r></w:p>"#);
        let body = parse_body(&xml).unwrap();
        assert_eq!(body.paragraphs().next().unwrap().text(), "R&D <team>");
    }

    #[test]
    fn test_malformed_xml() {
        let result = parse_body("<w:document><w:body><w:p></w:body>");
        assert!(matches!(result, Err(DocxError::Xml(_))));
    }
}
