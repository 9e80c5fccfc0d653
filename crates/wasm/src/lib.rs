//! WASM bindings for invitation letter generation
//!
//! This crate provides JavaScript-friendly API for:
//! - Reading the applicant table of an uploaded `.docx`
//! - Generating `.docx` / `.pdf` letters with optional images
//! - Batch generation packaged as a ZIP archive
//!
//! # Example (JavaScript)
//!
//! ```javascript
//! import init, { LetterGenerator } from 'letter-wasm';
//!
//! await init();
//!
//! const generator = new LetterGenerator();
//! generator.setHeaderImage(headerBytes);
//! generator.setPdfFont(regularTtf, boldTtf); // optional, Helvetica otherwise
//! generator.setOptions(JSON.stringify({ formats: ["docx", "pdf"] }));
//!
//! // Single letter
//! const pdf = generator.generate("jane.docx", docxBytes, "pdf");
//!
//! // Many letters
//! const result = generator.generateBatch(["a.docx", "b.docx"], [aBytes, bBytes]);
//! console.log(result.succeeded, result.failed, result.archiveName);
//! ```

use js_sys::{Array, Object, Reflect, Uint8Array};
use letter::{
    archive_name, Batch, FontFamily, ImageAssets, ImageSlot, InputDocument, OutputFormat,
    RecordExtractor, RenderOptions, SystemClock,
};
use wasm_bindgen::prelude::*;

// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn set(target: &Object, key: &str, value: &JsValue) -> Result<(), JsValue> {
    Reflect::set(target, &JsValue::from_str(key), value)?;
    Ok(())
}

/// Letter generator holding images and options between calls
#[wasm_bindgen]
pub struct LetterGenerator {
    assets: ImageAssets,
    options: RenderOptions,
    pdf_fonts: FontFamily,
}

#[wasm_bindgen]
impl LetterGenerator {
    /// Create a generator with no images and default options
    #[wasm_bindgen(constructor)]
    pub fn new() -> LetterGenerator {
        LetterGenerator {
            assets: ImageAssets::new(),
            options: RenderOptions::default(),
            pdf_fonts: FontFamily::helvetica(),
        }
    }

    /// Set the header image
    ///
    /// @param data - PNG or JPEG bytes (Uint8Array)
    #[wasm_bindgen(js_name = setHeaderImage)]
    pub fn set_header_image(&mut self, data: &[u8]) {
        self.assets.set(ImageSlot::Header, Some(data.to_vec()));
    }

    /// Set the footer image
    ///
    /// @param data - PNG or JPEG bytes (Uint8Array)
    #[wasm_bindgen(js_name = setFooterImage)]
    pub fn set_footer_image(&mut self, data: &[u8]) {
        self.assets.set(ImageSlot::Footer, Some(data.to_vec()));
    }

    /// Set the signature image
    ///
    /// @param data - PNG or JPEG bytes (Uint8Array)
    #[wasm_bindgen(js_name = setSignatureImage)]
    pub fn set_signature_image(&mut self, data: &[u8]) {
        self.assets.set(ImageSlot::Signature, Some(data.to_vec()));
    }

    /// Remove all images
    #[wasm_bindgen(js_name = clearImages)]
    pub fn clear_images(&mut self) {
        self.assets = ImageAssets::new();
    }

    /// Embed TrueType faces for PDF text, so names outside Latin-1 keep
    /// their glyphs
    ///
    /// @param regular - Regular face (.ttf bytes)
    /// @param bold - Bold face; the regular face is used when omitted
    #[wasm_bindgen(js_name = setPdfFont)]
    pub fn set_pdf_font(&mut self, regular: &[u8], bold: Option<Vec<u8>>) -> Result<(), JsValue> {
        self.pdf_fonts = FontFamily::from_ttf(regular.to_vec(), bold).map_err(js_error)?;
        Ok(())
    }

    /// Go back to the built-in Helvetica faces
    #[wasm_bindgen(js_name = clearPdfFont)]
    pub fn clear_pdf_font(&mut self) {
        self.pdf_fonts = FontFamily::helvetica();
    }

    /// Replace render options
    ///
    /// @param json - Options JSON, e.g. `{"pageSize": "a4", "formats": ["pdf"]}`
    #[wasm_bindgen(js_name = setOptions)]
    pub fn set_options(&mut self, json: &str) -> Result<(), JsValue> {
        self.options = RenderOptions::from_json(json).map_err(js_error)?;
        Ok(())
    }

    /// Read the applicant table of a document
    ///
    /// @param docx - Document bytes (Uint8Array)
    /// @returns Object mapping labels to values
    pub fn extract(&self, docx: &[u8]) -> Result<JsValue, JsValue> {
        let record = RecordExtractor::extract(docx).map_err(js_error)?;
        Ok(serde_wasm_bindgen::to_value(&record)?)
    }

    /// Generate one letter
    ///
    /// @param name - Uploaded file name
    /// @param docx - Document bytes (Uint8Array)
    /// @param format - "docx" or "pdf"
    /// @returns Letter bytes (Uint8Array)
    pub fn generate(&self, name: &str, docx: &[u8], format: &str) -> Result<Vec<u8>, JsValue> {
        let format: OutputFormat = format.parse().map_err(js_error)?;
        let clock = SystemClock;
        let files = Batch::new(&clock, &self.assets, self.options.clone())
            .with_formats(&[format])
            .with_pdf_fonts(self.pdf_fonts.clone())
            .generate(&InputDocument::new(name, docx.to_vec()))
            .map_err(js_error)?;

        files
            .into_iter()
            .next()
            .map(|file| file.bytes)
            .ok_or_else(|| JsValue::from_str("No output generated"))
    }

    /// Generate letters for many documents in the configured formats
    ///
    /// @param names - Uploaded file names
    /// @param files - Document bytes, one Uint8Array per name
    /// @returns { succeeded, failed, failures, files, zip, archiveName }
    #[wasm_bindgen(js_name = generateBatch)]
    pub fn generate_batch(&self, names: Vec<String>, files: Array) -> Result<JsValue, JsValue> {
        if names.len() != files.length() as usize {
            return Err(JsValue::from_str("names and files must have the same length"));
        }

        let inputs: Vec<InputDocument> = names
            .into_iter()
            .zip(files.iter())
            .map(|(name, bytes)| InputDocument::new(name, Uint8Array::new(&bytes).to_vec()))
            .collect();

        let clock = SystemClock;
        let report = Batch::new(&clock, &self.assets, self.options.clone())
            .with_pdf_fonts(self.pdf_fonts.clone())
            .run(&inputs);
        let zip = report.to_zip().map_err(js_error)?;

        let failures = Array::new();
        for failure in &report.failures {
            let entry = Object::new();
            set(&entry, "sourceName", &JsValue::from_str(&failure.source_name))?;
            set(&entry, "reason", &JsValue::from_str(&failure.reason))?;
            failures.push(&entry);
        }

        let outputs = Array::new();
        for file in &report.outputs {
            let entry = Object::new();
            set(&entry, "fileName", &JsValue::from_str(&file.file_name))?;
            set(&entry, "applicant", &JsValue::from_str(&file.applicant))?;
            set(&entry, "mediaType", &JsValue::from_str(file.media_type))?;
            outputs.push(&entry);
        }

        let result = Object::new();
        set(&result, "succeeded", &JsValue::from(report.succeeded() as u32))?;
        set(&result, "failed", &JsValue::from(report.failed() as u32))?;
        set(&result, "failures", &failures)?;
        set(&result, "files", &outputs)?;
        set(&result, "zip", &Uint8Array::from(zip.as_slice()))?;
        set(
            &result,
            "archiveName",
            &JsValue::from_str(&archive_name(chrono::Local::now().naive_local())),
        )?;
        Ok(result.into())
    }
}

impl Default for LetterGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    #[wasm_bindgen_test]
    fn test_invalid_options_rejected() {
        let mut generator = LetterGenerator::new();
        assert!(generator.set_options(r#"{"pageSize": "legal"}"#).is_err());
        assert!(generator.set_options(r#"{"pageSize": "a4"}"#).is_ok());
    }

    #[wasm_bindgen_test]
    fn test_invalid_pdf_font_rejected() {
        let mut generator = LetterGenerator::new();
        assert!(generator.set_pdf_font(b"not a font", None).is_err());
        generator.clear_pdf_font();
    }

    #[wasm_bindgen_test]
    fn test_generate_rejects_unknown_format() {
        let generator = LetterGenerator::new();
        assert!(generator.generate("a.docx", &[], "odt").is_err());
    }

    #[wasm_bindgen_test]
    fn test_generate_rejects_corrupt_document() {
        let generator = LetterGenerator::new();
        assert!(generator.generate("a.docx", b"not a zip", "pdf").is_err());
    }
}
