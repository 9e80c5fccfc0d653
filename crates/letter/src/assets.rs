//! Optional header, footer and signature images

use pdf_core::Align;
use std::fmt;

/// Where an image asset goes in the letter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageSlot {
    Header,
    Footer,
    Signature,
}

impl fmt::Display for ImageSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImageSlot::Header => "header",
            ImageSlot::Footer => "footer",
            ImageSlot::Signature => "signature",
        };
        f.write_str(name)
    }
}

/// Fixed size and alignment of a slot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub width_inches: f64,
    /// Set when the image is stretched to a fixed box in the fixed layout
    pub height_inches: Option<f64>,
    pub align: Align,
}

impl ImageSlot {
    pub const ALL: [ImageSlot; 3] = [ImageSlot::Header, ImageSlot::Footer, ImageSlot::Signature];

    pub fn placement(self) -> Placement {
        match self {
            ImageSlot::Header => Placement {
                width_inches: 3.44,
                height_inches: None,
                align: Align::Right,
            },
            ImageSlot::Footer => Placement {
                width_inches: 6.75,
                height_inches: None,
                align: Align::Center,
            },
            ImageSlot::Signature => Placement {
                width_inches: 2.5,
                height_inches: Some(1.0),
                align: Align::Left,
            },
        }
    }
}

/// Owned image bytes, borrowed by every serializer call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageAssets {
    pub header: Option<Vec<u8>>,
    pub footer: Option<Vec<u8>>,
    pub signature: Option<Vec<u8>>,
}

impl ImageAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(mut self, data: Vec<u8>) -> Self {
        self.header = Some(data);
        self
    }

    pub fn with_footer(mut self, data: Vec<u8>) -> Self {
        self.footer = Some(data);
        self
    }

    pub fn with_signature(mut self, data: Vec<u8>) -> Self {
        self.signature = Some(data);
        self
    }

    /// Replace or clear one slot
    pub fn set(&mut self, slot: ImageSlot, data: Option<Vec<u8>>) {
        match slot {
            ImageSlot::Header => self.header = data,
            ImageSlot::Footer => self.footer = data,
            ImageSlot::Signature => self.signature = data,
        }
    }

    pub fn get(&self, slot: ImageSlot) -> Option<&[u8]> {
        match slot {
            ImageSlot::Header => self.header.as_deref(),
            ImageSlot::Footer => self.footer.as_deref(),
            ImageSlot::Signature => self.signature.as_deref(),
        }
    }

    pub fn has(&self, slot: ImageSlot) -> bool {
        self.get(slot).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_set_and_get() {
        let mut assets = ImageAssets::new().with_footer(vec![1, 2, 3]);
        assert!(assets.has(ImageSlot::Footer));
        assert!(!assets.has(ImageSlot::Header));

        assets.set(ImageSlot::Header, Some(vec![9]));
        assets.set(ImageSlot::Footer, None);
        assert_eq!(assets.get(ImageSlot::Header), Some(&[9u8][..]));
        assert_eq!(assets.get(ImageSlot::Footer), None);
    }

    #[test]
    fn test_placements() {
        assert_eq!(ImageSlot::Header.placement().width_inches, 3.44);
        assert_eq!(ImageSlot::Footer.placement().align, Align::Center);
        assert_eq!(ImageSlot::Signature.placement().height_inches, Some(1.0));
        assert_eq!(ImageSlot::Signature.to_string(), "signature");
    }
}
