//! OPC container plumbing: zip parts, content types, relationships

use crate::xml::XmlOut;
use crate::{DocxError, Result};
use std::io::{Cursor, Read, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub(crate) const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
pub(crate) const REL_STYLES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
pub(crate) const REL_HEADER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/header";
pub(crate) const REL_FOOTER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/footer";
pub(crate) const REL_IMAGE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

pub(crate) const CT_DOCUMENT: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";
pub(crate) const CT_STYLES: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml";
pub(crate) const CT_HEADER: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.header+xml";
pub(crate) const CT_FOOTER: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.footer+xml";

/// Relationships of one part, numbered rId1, rId2, ...
#[derive(Debug, Default)]
pub(crate) struct Relationships {
    entries: Vec<(String, &'static str, String)>,
}

impl Relationships {
    /// Register a relationship and return its id
    pub(crate) fn add(&mut self, rel_type: &'static str, target: &str) -> String {
        if let Some((id, _, _)) = self
            .entries
            .iter()
            .find(|(_, t, tgt)| *t == rel_type && tgt == target)
        {
            return id.clone();
        }
        let id = format!("rId{}", self.entries.len() + 1);
        self.entries
            .push((id.clone(), rel_type, target.to_string()));
        id
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn to_xml(&self) -> Result<Vec<u8>> {
        let mut out = XmlOut::new()?;
        out.start(
            "Relationships",
            &[(
                "xmlns",
                "http://schemas.openxmlformats.org/package/2006/relationships",
            )],
        )?;
        for (id, rel_type, target) in &self.entries {
            out.empty(
                "Relationship",
                &[
                    ("Id", id.as_str()),
                    ("Type", *rel_type),
                    ("Target", target.as_str()),
                ],
            )?;
        }
        out.end("Relationships")?;
        Ok(out.into_bytes())
    }
}

/// `[Content_Types].xml` builder
#[derive(Debug, Default)]
pub(crate) struct ContentTypes {
    defaults: Vec<(String, String)>,
    overrides: Vec<(String, &'static str)>,
}

impl ContentTypes {
    pub(crate) fn new() -> Self {
        let mut types = Self::default();
        types.add_default(
            "rels",
            "application/vnd.openxmlformats-package.relationships+xml",
        );
        types.add_default("xml", "application/xml");
        types
    }

    pub(crate) fn add_default(&mut self, extension: &str, content_type: &str) {
        if !self.defaults.iter().any(|(ext, _)| ext == extension) {
            self.defaults
                .push((extension.to_string(), content_type.to_string()));
        }
    }

    pub(crate) fn add_override(&mut self, part_name: &str, content_type: &'static str) {
        self.overrides.push((part_name.to_string(), content_type));
    }

    pub(crate) fn to_xml(&self) -> Result<Vec<u8>> {
        let mut out = XmlOut::new()?;
        out.start(
            "Types",
            &[(
                "xmlns",
                "http://schemas.openxmlformats.org/package/2006/content-types",
            )],
        )?;
        for (extension, content_type) in &self.defaults {
            out.empty(
                "Default",
                &[
                    ("Extension", extension.as_str()),
                    ("ContentType", content_type.as_str()),
                ],
            )?;
        }
        for (part_name, content_type) in &self.overrides {
            out.empty(
                "Override",
                &[("PartName", part_name.as_str()), ("ContentType", *content_type)],
            )?;
        }
        out.end("Types")?;
        Ok(out.into_bytes())
    }
}

/// Zip writer for package parts
pub(crate) struct PackageWriter {
    zip: ZipWriter<Cursor<Vec<u8>>>,
    options: SimpleFileOptions,
}

impl PackageWriter {
    pub(crate) fn new() -> Self {
        Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
            options: SimpleFileOptions::default().compression_method(CompressionMethod::Deflated),
        }
    }

    pub(crate) fn add_part(&mut self, name: &str, data: &[u8]) -> Result<()> {
        self.zip.start_file(name, self.options)?;
        self.zip.write_all(data)?;
        Ok(())
    }

    pub(crate) fn finish(self) -> Result<Vec<u8>> {
        Ok(self.zip.finish()?.into_inner())
    }
}

/// Read one part of a package as UTF-8 text
pub(crate) fn read_part(data: &[u8], name: &str) -> Result<String> {
    let mut archive = ZipArchive::new(Cursor::new(data))?;
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => {
            return Err(DocxError::MissingPart(name.to_string()))
        }
        Err(e) => return Err(e.into()),
    };

    let mut text = String::new();
    file.read_to_string(&mut text)?;
    Ok(text)
}
