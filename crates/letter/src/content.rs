//! The letter as ordered, format-neutral blocks

use crate::assets::ImageSlot;
use crate::clock::{format_letter_date, Clock};
use crate::record::{ApplicantRecord, Field};

const ORGANISATION: &str = "Save the Children is an international development organization \
working in 120 countries around the world. The headquarters of Save the Children is located \
at St Vincent House, 30 Orange Street, London WC2H 7HH, United Kingdom. Save the Children is \
registered with the NGO Affairs Bureau in Bangladesh (registered number 2630, dated March 20, 2011).";

const CONTACT_EMAIL: &str = "sumon.paul@savethechildren.org";

/// Horizontal alignment of a paragraph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParagraphAlign {
    #[default]
    Left,
    Justify,
}

/// A run of text; `\n` inside the text is a line break
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub bold: bool,
}

impl Span {
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

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph {
        spans: Vec<Span>,
        align: ParagraphAlign,
    },
    /// Placeholder for an image asset
    Image(ImageSlot),
}

impl Block {
    fn paragraph(spans: Vec<Span>) -> Self {
        Block::Paragraph {
            spans,
            align: ParagraphAlign::Left,
        }
    }

    fn justified(spans: Vec<Span>) -> Self {
        Block::Paragraph {
            spans,
            align: ParagraphAlign::Justify,
        }
    }
}

/// Ordered blocks of one letter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LetterContent {
    pub blocks: Vec<Block>,
}

impl LetterContent {
    /// Paragraph texts joined with `\n`; image placeholders are skipped
    pub fn text(&self) -> String {
        self.paragraph_texts().join("\n")
    }

    pub fn paragraph_texts(&self) -> Vec<String> {
        self.blocks
            .iter()
            .filter_map(|block| match block {
                Block::Paragraph { spans, .. } => {
                    Some(spans.iter().map(|s| s.text.as_str()).collect())
                }
                Block::Image(_) => None,
            })
            .collect()
    }

    /// Text of every bold span, in order
    pub fn bold_texts(&self) -> Vec<&str> {
        self.blocks
            .iter()
            .flat_map(|block| match block {
                Block::Paragraph { spans, .. } => spans.as_slice(),
                Block::Image(_) => &[][..],
            })
            .filter(|s| s.bold)
            .map(|s| s.text.as_str())
            .collect()
    }

    pub fn has_image(&self, slot: ImageSlot) -> bool {
        self.blocks.contains(&Block::Image(slot))
    }
}

/// Builds [`LetterContent`] from a record
pub struct LetterBuilder<'a> {
    clock: &'a dyn Clock,
    signature: bool,
}

impl<'a> LetterBuilder<'a> {
    pub fn new(clock: &'a dyn Clock) -> Self {
        Self {
            clock,
            signature: false,
        }
    }

    /// Reserve a block for the signature image before the signatory lines
    pub fn with_signature(mut self, signature: bool) -> Self {
        self.signature = signature;
        self
    }

    pub fn build(&self, record: &ApplicantRecord) -> LetterContent {
        let name = record.field(Field::FullName);
        let date = format_letter_date(self.clock.today());

        let mut blocks = vec![
            Block::paragraph(vec![Span::plain(format!("Date: {date}\n"))]),
            Block::paragraph(vec![Span::plain(format!(
                "To\n{}\n",
                record.field(Field::Embassy)
            ))]),
            Block::paragraph(vec![
                Span::plain("Subject: Request for business visa to "),
                Span::bold(format!("{name}, ")),
                Span::plain("Passport No: "),
                Span::bold(format!("{}, ", record.field(Field::PassportNumber))),
                Span::plain("Nationality: "),
                Span::bold(format!("{}.\n", record.field(Field::Nationality))),
            ]),
            Block::justified(vec![Span::plain("Dear Sir/Madam,")]),
            Block::justified(vec![Span::plain(ORGANISATION)]),
            Block::justified(vec![
                Span::bold(format!("{name}, ")),
                Span::plain(format!(
                    "{}, of Save the Children has been invited to the Save the Children \
                     International office in Bangladesh to participate in meetings, training, \
                     and program activities from ",
                    record.field(Field::JobTitle)
                )),
                Span::bold(format!("{} ", record.field(Field::ArrivalDate))),
                Span::plain("to "),
                Span::bold(format!("{}. ", record.field(Field::DepartureDate))),
                Span::plain(
                    "The Save the Children Bangladesh Country Office will ensure all logistical support.",
                ),
            ]),
            Block::justified(vec![
                Span::plain(format!("Your kind assistance in granting a visa for {name} ")),
                Span::plain(
                    "to visit Bangladesh would be highly appreciated. \
                     Please contact at Cell no:  +8801913918618 and mail: ",
                ),
                Span::bold(format!("{CONTACT_EMAIL} ")),
                Span::plain("if there is any query regarding the processing of this visa."),
            ]),
            Block::justified(vec![Span::plain("Thank you for your kind assistance.")]),
        ];

        if self.signature {
            blocks.push(Block::Image(ImageSlot::Signature));
        }
        blocks.push(Block::paragraph(vec![Span::plain(
            "Sumon kumar Paul\nCoordinator - Administration\n",
        )]));

        LetterContent { blocks }
    }
}
