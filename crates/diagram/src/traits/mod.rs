use image::GrayImage;

use crate::{
    error::Result,
    raster::{ChannelLayout, Image},
    types::Point,
};

/// Trait for image preprocessing stages (`Image -> Image`)
pub trait ImagePreprocessor: Send + Sync {
    /// Stable snake_case name used in errors and logs
    fn name(&self) -> &'static str;

    /// Channel layout this stage accepts
    fn requires(&self) -> ChannelLayout;

    /// Channel layout this stage emits
    fn produces(&self) -> ChannelLayout;

    /// Reject parameters the stage cannot run with
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Transform the input into a new image
    fn preprocess(&self, image: &Image) -> Result<Image>;
}

/// Trait for feature detectors. Unlike preprocessors they emit structured
/// features, not images.
pub trait FeatureDetector: Send + Sync {
    type Feature: Send;

    /// Name reported when detection fails
    fn name(&self) -> &'static str;

    /// Detect every feature of this kind in the preprocessed image
    fn detect(&self, image: &Image) -> Result<Vec<Self::Feature>>;
}

/// A word recognized by an OCR engine, with its pixel bounding box.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizedWord {
    pub text: String,
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
    pub confidence: f32,
    /// Tesseract-style (block, paragraph, line) grouping key
    pub line_key: (u32, u32, u32),
}

/// Trait for text recognition backends
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, image: &GrayImage) -> Result<Vec<RecognizedWord>>;
}

/// Trait for straight line segment extraction
pub trait LineSegmentDetector: Send + Sync {
    /// Extract segments from a binary image where foreground pixels are non-zero
    fn detect_segments(&self, foreground: &GrayImage) -> Result<Vec<(Point, Point)>>;
}
