use std::fmt;
use std::path::Path;

use image::{DynamicImage, GrayImage, RgbImage};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{DiagramError, Result};

/// Channel depth a stage consumes or produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ChannelLayout {
    /// Three-channel color
    Color,
    /// Single-channel luminance
    Gray,
}

impl fmt::Display for ChannelLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelLayout::Color => write!(f, "multi-channel"),
            ChannelLayout::Gray => write!(f, "single-channel"),
        }
    }
}

/// Immutable decoded image. Stages never mutate an `Image`; they build a new one.
#[derive(Debug, Clone, PartialEq)]
pub enum Image {
    Color(RgbImage),
    Gray(GrayImage),
}

impl Image {
    /// Layout of every decoded image
    pub const DECODED_LAYOUT: ChannelLayout = ChannelLayout::Color;

    /// Decode an image file. Every input is normalized to 8-bit RGB.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let decoded = image::open(path).map_err(|source| DiagramError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_dynamic(decoded))
    }

    /// Decode an in-memory encoded image (png, jpeg).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let decoded = image::load_from_memory(bytes).map_err(DiagramError::DecodeBytes)?;
        Ok(Self::from_dynamic(decoded))
    }

    pub fn from_dynamic(image: DynamicImage) -> Self {
        Image::Color(image.to_rgb8())
    }

    pub fn layout(&self) -> ChannelLayout {
        match self {
            Image::Color(_) => ChannelLayout::Color,
            Image::Gray(_) => ChannelLayout::Gray,
        }
    }

    pub fn width(&self) -> u32 {
        match self {
            Image::Color(img) => img.width(),
            Image::Gray(img) => img.width(),
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            Image::Color(img) => img.height(),
            Image::Gray(img) => img.height(),
        }
    }

    pub fn as_color(&self) -> Result<&RgbImage> {
        match self {
            Image::Color(img) => Ok(img),
            other => Err(DiagramError::ChannelMismatch {
                expected: ChannelLayout::Color,
                found: other.layout(),
            }),
        }
    }

    pub fn as_gray(&self) -> Result<&GrayImage> {
        match self {
            Image::Gray(img) => Ok(img),
            other => Err(DiagramError::ChannelMismatch {
                expected: ChannelLayout::Gray,
                found: other.layout(),
            }),
        }
    }

    /// Single-channel view used by detectors, converting color input if needed.
    pub fn to_luma(&self) -> GrayImage {
        match self {
            Image::Color(img) => image::imageops::grayscale(img),
            Image::Gray(img) => img.clone(),
        }
    }

    /// Raw pixel bytes, row-major.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Image::Color(img) => img.as_raw(),
            Image::Gray(img) => img.as_raw(),
        }
    }
}

impl From<GrayImage> for Image {
    fn from(image: GrayImage) -> Self {
        Image::Gray(image)
    }
}

impl From<RgbImage> for Image {
    fn from(image: RgbImage) -> Self {
        Image::Color(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Luma};
    use std::io::Cursor;

    #[test]
    fn test_decoding_normalizes_to_color() {
        let mut gray = GrayImage::new(8, 4);
        gray.put_pixel(1, 1, Luma([200u8]));

        let mut bytes = Vec::new();
        DynamicImage::ImageLuma8(gray)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .expect("encode png");

        let image = Image::from_bytes(&bytes).expect("decode png");
        assert_eq!(image.layout(), ChannelLayout::Color);
        assert_eq!((image.width(), image.height()), (8, 4));
    }

    #[test]
    fn test_corrupt_bytes_fail_to_decode() {
        let err = Image::from_bytes(b"definitely not a png").unwrap_err();
        assert!(matches!(err, DiagramError::DecodeBytes(_)));
    }

    #[test]
    fn test_missing_file_is_decode_error() {
        let err = Image::open("/nonexistent/diagram.png").unwrap_err();
        assert!(matches!(err, DiagramError::Decode { .. }));
    }

    #[test]
    fn test_layout_accessors() {
        let image = Image::from(GrayImage::new(2, 2));
        assert!(image.as_gray().is_ok());
        assert!(matches!(
            image.as_color(),
            Err(DiagramError::ChannelMismatch { expected: ChannelLayout::Color, .. })
        ));
    }
}
