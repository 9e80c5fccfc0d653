//! Applicant records read from the label/value table

use crate::ExtractionError;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Placeholder for fields the document does not provide
pub const MISSING_VALUE: &str = "N/A";

/// Fields the letter reads from the record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Embassy,
    FullName,
    PassportNumber,
    Nationality,
    JobTitle,
    ArrivalDate,
    DepartureDate,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::Embassy,
        Field::FullName,
        Field::PassportNumber,
        Field::Nationality,
        Field::JobTitle,
        Field::ArrivalDate,
        Field::DepartureDate,
    ];

    /// Exact label text in the first column of the table
    pub fn label(self) -> &'static str {
        match self {
            Field::Embassy => {
                "Location of the Bangladesh Embassy that you are applying to (fill address)"
            }
            Field::FullName => "Full Name \n(As it appears on passport)",
            Field::PassportNumber => "Passport number",
            Field::Nationality => "Nationality",
            Field::JobTitle => "Job Title",
            Field::ArrivalDate => "Arrival Date in Bangladesh",
            Field::DepartureDate => "Departure Date",
        }
    }
}

/// Ordered label/value pairs of one applicant
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicantRecord {
    entries: Vec<(String, String)>,
}

impl ApplicantRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pair; a repeated label keeps its position and takes the new value
    pub fn insert(&mut self, label: impl Into<String>, value: impl Into<String>) {
        let label = label.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(l, _)| *l == label) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((label, value)),
        }
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v.as_str())
    }

    /// Value of a known field, or `N/A`
    pub fn field(&self, field: Field) -> &str {
        self.get(field.label()).unwrap_or(MISSING_VALUE)
    }

    /// Full name for reports, or `Unknown`
    pub fn applicant_name(&self) -> &str {
        self.get(Field::FullName.label()).unwrap_or("Unknown")
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(l, v)| (l.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ApplicantRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Self::new();
        for (label, value) in iter {
            record.insert(label, value);
        }
        record
    }
}

impl Serialize for ApplicantRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, value) in &self.entries {
            map.serialize_entry(label, value)?;
        }
        map.end()
    }
}

/// Reads the first table of a `.docx` into an [`ApplicantRecord`]
pub struct RecordExtractor;

impl RecordExtractor {
    /// Rows with at least two cells become `trim(cell 0) -> trim(cell 1)`.
    /// A document without tables gives an empty record.
    pub fn extract(data: &[u8]) -> Result<ApplicantRecord, ExtractionError> {
        let body = docx_core::read_body(data)?;

        let Some(table) = body.first_table() else {
            log::debug!("Document has no table; record is empty");
            return Ok(ApplicantRecord::new());
        };

        let record: ApplicantRecord = table
            .rows
            .iter()
            .filter(|row| row.len() >= 2)
            .map(|row| (row[0].trim(), row[1].trim()))
            .collect();

        log::debug!(
            "Extracted {} fields from {} table rows",
            record.len(),
            table.rows.len()
        );
        Ok(record)
    }
}
