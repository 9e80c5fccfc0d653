//! Image handling for PDF documents

use crate::{PdfError, Result};
use image::{DynamicImage, ImageDecoder, ImageReader};
use lopdf::{Dictionary, Object, Stream};
use std::io::{Cursor, Write};

impl From<image::ImageError> for PdfError {
    fn from(err: image::ImageError) -> Self {
        PdfError::ImageError(err.to_string())
    }
}

/// Detected image format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

impl ImageFormat {
    /// Detect image format from magic bytes
    pub fn detect(data: &[u8]) -> Result<Self> {
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Ok(ImageFormat::Jpeg);
        }
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Ok(ImageFormat::Png);
        }
        Err(PdfError::ImageError(
            "Unsupported image format (expected PNG or JPEG)".to_string(),
        ))
    }
}

/// Pixel dimensions of an image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

/// Read pixel dimensions without decoding the image body
pub fn image_dimensions(data: &[u8]) -> Result<ImageDimensions> {
    match ImageFormat::detect(data)? {
        ImageFormat::Jpeg => {
            let info = jpeg_info(data)?;
            Ok(ImageDimensions {
                width: info.width,
                height: info.height,
            })
        }
        ImageFormat::Png => png_dimensions(data),
    }
}

/// JPEG frame header fields
#[derive(Debug, Clone, Copy)]
struct JpegInfo {
    width: u32,
    height: u32,
    components: u8,
    /// An Adobe APP14 segment precedes the frame (CMYK stored inverted)
    adobe: bool,
}

/// Walk JPEG segments up to the first SOFn marker
fn jpeg_info(data: &[u8]) -> Result<JpegInfo> {
    let mut adobe = false;
    let mut i = 2;
    while i + 9 < data.len() {
        if data[i] != 0xFF {
            i += 1;
            continue;
        }

        let marker = data[i + 1];
        if marker == 0xEE && data[i + 4..].starts_with(b"Adobe") {
            adobe = true;
        }

        // SOF0..SOF15 except DHT (C4), JPG (C8) and DAC (CC)
        if (0xC0..=0xCF).contains(&marker) && !matches!(marker, 0xC4 | 0xC8 | 0xCC) {
            let height = u16::from_be_bytes([data[i + 5], data[i + 6]]) as u32;
            let width = u16::from_be_bytes([data[i + 7], data[i + 8]]) as u32;
            return Ok(JpegInfo {
                width,
                height,
                components: data[i + 9],
                adobe,
            });
        }

        let length = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
        if length < 2 {
            break;
        }
        i += 2 + length;
    }

    Err(PdfError::ImageError("Could not parse JPEG header".to_string()))
}

/// Width and height from the PNG IHDR chunk
fn png_dimensions(data: &[u8]) -> Result<ImageDimensions> {
    if data.len() < 24 {
        return Err(PdfError::ImageError("PNG data too short".to_string()));
    }
    if &data[12..16] != b"IHDR" {
        return Err(PdfError::ImageError(
            "Invalid PNG: IHDR not found".to_string(),
        ));
    }

    Ok(ImageDimensions {
        width: u32::from_be_bytes([data[16], data[17], data[18], data[19]]),
        height: u32::from_be_bytes([data[20], data[21], data[22], data[23]]),
    })
}

/// Image XObject for PDF embedding
#[derive(Debug, Clone)]
pub struct ImageXObject {
    pub width: u32,
    pub height: u32,
    /// "DeviceRGB", "DeviceGray" or "DeviceCMYK"
    pub color_space: &'static str,
    /// Samples are stored inverted (Adobe CMYK JPEG)
    pub inverted: bool,
    /// "DCTDecode" for JPEG passthrough, "FlateDecode" for decoded PNG
    pub filter: &'static str,
    /// Compressed sample data
    pub data: Vec<u8>,
}

impl ImageXObject {
    /// Build an XObject from PNG or JPEG bytes
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        match ImageFormat::detect(data)? {
            ImageFormat::Jpeg => Self::from_jpeg(data),
            ImageFormat::Png => Self::from_png(data),
        }
    }

    /// JPEG data is embedded as-is behind DCTDecode
    fn from_jpeg(data: &[u8]) -> Result<Self> {
        let info = jpeg_info(data)?;
        let color_space = match info.components {
            1 => "DeviceGray",
            3 => "DeviceRGB",
            4 => "DeviceCMYK",
            n => {
                return Err(PdfError::ImageError(format!(
                    "Unsupported JPEG with {n} color components"
                )))
            }
        };

        Ok(Self {
            width: info.width,
            height: info.height,
            color_space,
            inverted: info.components == 4 && info.adobe,
            filter: "DCTDecode",
            data: data.to_vec(),
        })
    }

    /// PNG data is decoded, alpha blended onto white and re-deflated
    fn from_png(data: &[u8]) -> Result<Self> {
        let reader = ImageReader::new(Cursor::new(data)).with_guessed_format()?;
        let decoder = reader.into_decoder()?;
        let (width, height) = decoder.dimensions();
        let color_type = decoder.color_type();
        let image = DynamicImage::from_decoder(decoder)?;

        let blend = |value: u8, alpha: u8| -> u8 {
            let a = alpha as f32 / 255.0;
            (value as f32 * a + 255.0 * (1.0 - a)) as u8
        };

        let (raw, color_space) = match color_type {
            image::ColorType::L8 | image::ColorType::L16 => {
                (image.to_luma8().into_raw(), "DeviceGray")
            }
            image::ColorType::La8 | image::ColorType::La16 => {
                let raw: Vec<u8> = image
                    .to_luma_alpha8()
                    .pixels()
                    .map(|p| blend(p[0], p[1]))
                    .collect();
                (raw, "DeviceGray")
            }
            image::ColorType::Rgba8 | image::ColorType::Rgba16 | image::ColorType::Rgba32F => {
                let rgba = image.to_rgba8();
                let mut raw = Vec::with_capacity((width * height * 3) as usize);
                for p in rgba.pixels() {
                    raw.extend_from_slice(&[blend(p[0], p[3]), blend(p[1], p[3]), blend(p[2], p[3])]);
                }
                (raw, "DeviceRGB")
            }
            _ => (image.to_rgb8().into_raw(), "DeviceRGB"),
        };

        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(&raw)?;
        let data = encoder.finish()?;

        Ok(Self {
            width,
            height,
            color_space,
            inverted: false,
            filter: "FlateDecode",
            data,
        })
    }

    /// Convert to lopdf Stream object
    pub fn to_pdf_stream(&self) -> Stream {
        let mut dict = Dictionary::new();
        dict.set("Type", Object::Name(b"XObject".to_vec()));
        dict.set("Subtype", Object::Name(b"Image".to_vec()));
        dict.set("Width", self.width as i64);
        dict.set("Height", self.height as i64);
        dict.set("ColorSpace", Object::Name(self.color_space.as_bytes().to_vec()));
        dict.set("BitsPerComponent", 8_i64);
        dict.set("Filter", Object::Name(self.filter.as_bytes().to_vec()));
        if self.inverted {
            let decode = [1, 0, 1, 0, 1, 0, 1, 0].map(Object::Integer).to_vec();
            dict.set("Decode", Object::Array(decode));
        }

        // Already compressed; keep lopdf from deflating it again
        Stream::new(dict, self.data.clone()).with_compression(false)
    }
}

/// Generate operators to draw an image XObject
///
/// `x`/`y` are the lower-left corner in PDF coordinates.
pub fn generate_image_operators(
    image_name: &str,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
) -> Vec<u8> {
    format!("q\n{width:.2} 0 0 {height:.2} {x:.2} {y:.2} cm\n/{image_name} Do\nQ\n").into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_jpeg() -> Vec<u8> {
        vec![
            0xFF, 0xD8, // SOI
            0xFF, 0xC0, // SOF0
            0x00, 0x11, // Length
            0x08, // Precision
            0x00, 0x64, // Height (100)
            0x00, 0xC8, // Width (200)
            0x03, // Components
            0x01, 0x22, 0x00, 0x02, 0x11, 0x01, 0x03, 0x11, 0x01, 0xFF, 0xD9, // EOI
        ]
    }

    /// CMYK frame, optionally behind an Adobe APP14 segment
    fn cmyk_jpeg(adobe: bool) -> Vec<u8> {
        let mut data = vec![0xFF, 0xD8];
        if adobe {
            data.extend_from_slice(&[0xFF, 0xEE, 0x00, 0x0E]);
            data.extend_from_slice(b"Adobe");
            data.extend_from_slice(&[0x00, 0x64, 0x00, 0x00, 0x00, 0x00, 0x00]);
        }
        data.extend_from_slice(&[
            0xFF, 0xC0, 0x00, 0x14, 0x08, 0x00, 0x08, 0x00, 0x08, 0x04, // 8x8, 4 components
            0x01, 0x11, 0x00, 0x02, 0x11, 0x00, 0x03, 0x11, 0x00, 0x04, 0x11, 0x00, 0xFF, 0xD9,
        ]);
        data
    }

    fn sample_png(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 128]));
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)
            .unwrap();
        buffer
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(ImageFormat::detect(&sample_jpeg()).unwrap(), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::detect(&sample_png(2, 2)).unwrap(), ImageFormat::Png);
        assert!(ImageFormat::detect(b"GIF89a..").is_err());
        assert!(ImageFormat::detect(&[]).is_err());
    }

    #[test]
    fn test_jpeg_dimensions() {
        let dims = image_dimensions(&sample_jpeg()).unwrap();
        assert_eq!(dims, ImageDimensions { width: 200, height: 100 });
    }

    #[test]
    fn test_png_dimensions() {
        let dims = image_dimensions(&sample_png(30, 12)).unwrap();
        assert_eq!(dims, ImageDimensions { width: 30, height: 12 });
    }

    #[test]
    fn test_truncated_png_is_rejected() {
        let png = sample_png(4, 4);
        assert!(image_dimensions(&png[..10]).is_err());
    }

    #[test]
    fn test_jpeg_without_frame_header() {
        let data = vec![0xFF, 0xD8, 0xFF, 0x00, 0x00, 0x00, 0x00, 0x00];
        assert!(jpeg_info(&data).is_err());
    }

    #[test]
    fn test_jpeg_xobject_passthrough() {
        let jpeg = sample_jpeg();
        let xobject = ImageXObject::from_bytes(&jpeg).unwrap();
        assert_eq!(xobject.filter, "DCTDecode");
        assert_eq!(xobject.color_space, "DeviceRGB");
        assert_eq!(xobject.data, jpeg);
    }

    #[test]
    fn test_cmyk_jpeg_color_space() {
        let plain = ImageXObject::from_bytes(&cmyk_jpeg(false)).unwrap();
        assert_eq!(plain.color_space, "DeviceCMYK");
        assert!(!plain.inverted);
        assert!(plain.to_pdf_stream().dict.get(b"Decode").is_err());

        let adobe = ImageXObject::from_bytes(&cmyk_jpeg(true)).unwrap();
        assert_eq!(adobe.color_space, "DeviceCMYK");
        assert!(adobe.inverted);
        let stream = adobe.to_pdf_stream();
        let decode = stream.dict.get(b"Decode").unwrap().as_array().unwrap();
        assert_eq!(decode.len(), 8);
        assert_eq!(decode[0].as_i64().unwrap(), 1);
    }

    #[test]
    fn test_jpeg_with_two_components_is_rejected() {
        let mut data = sample_jpeg();
        data[11] = 0x02;
        assert!(matches!(
            ImageXObject::from_bytes(&data),
            Err(PdfError::ImageError(_))
        ));
    }

    #[test]
    fn test_png_xobject_blends_alpha() {
        let xobject = ImageXObject::from_bytes(&sample_png(3, 2)).unwrap();
        assert_eq!(xobject.filter, "FlateDecode");
        assert_eq!(xobject.color_space, "DeviceRGB");
        assert_eq!((xobject.width, xobject.height), (3, 2));

        let stream = xobject.to_pdf_stream();
        assert_eq!(stream.dict.get(b"Width").unwrap().as_i64().unwrap(), 3);
        assert_eq!(
            stream.dict.get(b"Subtype").unwrap().as_name().unwrap(),
            b"Image"
        );
    }

    #[test]
    fn test_image_operators() {
        let ops = String::from_utf8(generate_image_operators("Im1", 100.0, 200.0, 50.0, 75.0))
            .unwrap();
        assert_eq!(ops, "q\n50.00 0 0 75.00 100.00 200.00 cm\n/Im1 Do\nQ\n");
    }
}
