use image::{GrayImage, Luma};
use imageproc::integral_image::{integral_image, sum_image_pixels};

use crate::{
    error::{DiagramError, Result},
    raster::{ChannelLayout, Image},
    traits::ImagePreprocessor,
};

/// Collapses RGB input to single-channel luminance
#[derive(Debug, Clone, Default)]
pub struct GrayscalePreprocessor;

impl ImagePreprocessor for GrayscalePreprocessor {
    fn name(&self) -> &'static str {
        "grayscale"
    }

    fn requires(&self) -> ChannelLayout {
        ChannelLayout::Color
    }

    fn produces(&self) -> ChannelLayout {
        ChannelLayout::Gray
    }

    fn preprocess(&self, image: &Image) -> Result<Image> {
        let color = image.as_color()?;
        Ok(Image::Gray(image::imageops::grayscale(color)))
    }
}

/// Local-mean adaptive threshold.
///
/// A pixel becomes white when it is brighter than the mean of its
/// `block_size` x `block_size` neighborhood minus `c`, black otherwise.
/// Windows are clipped at the image border.
#[derive(Debug, Clone)]
pub struct AdaptiveThresholdPreprocessor {
    pub block_size: u32,
    pub c: f64,
}

impl Default for AdaptiveThresholdPreprocessor {
    fn default() -> Self {
        Self {
            block_size: 11,
            c: 2.0,
        }
    }
}

impl AdaptiveThresholdPreprocessor {
    pub const FOREGROUND: u8 = 0;
    pub const BACKGROUND: u8 = 255;

    fn threshold(&self, gray: &GrayImage) -> GrayImage {
        let (width, height) = gray.dimensions();
        let mut out = GrayImage::new(width, height);
        if width == 0 || height == 0 {
            return out;
        }

        let integral = integral_image::<_, u64>(gray);
        let radius = self.block_size / 2;

        for y in 0..height {
            let top = y.saturating_sub(radius);
            let bottom = (y + radius).min(height - 1);
            for x in 0..width {
                let left = x.saturating_sub(radius);
                let right = (x + radius).min(width - 1);

                let sum = sum_image_pixels(&integral, left, top, right, bottom)[0];
                let count = (right - left + 1) * (bottom - top + 1);
                let mean = sum as f64 / f64::from(count);

                let value = if f64::from(gray.get_pixel(x, y)[0]) > mean - self.c {
                    Self::BACKGROUND
                } else {
                    Self::FOREGROUND
                };
                out.put_pixel(x, y, Luma([value]));
            }
        }
        out
    }
}

impl ImagePreprocessor for AdaptiveThresholdPreprocessor {
    fn name(&self) -> &'static str {
        "adaptive_threshold"
    }

    fn requires(&self) -> ChannelLayout {
        ChannelLayout::Gray
    }

    fn produces(&self) -> ChannelLayout {
        ChannelLayout::Gray
    }

    /// The window must be odd and at least 3 pixels wide
    fn validate(&self) -> Result<()> {
        if self.block_size < 3 || self.block_size % 2 == 0 {
            return Err(DiagramError::InvalidStage {
                stage: self.name().to_string(),
                reason: format!("block_size must be odd and >= 3, got {}", self.block_size),
            });
        }
        Ok(())
    }

    fn preprocess(&self, image: &Image) -> Result<Image> {
        self.validate()?;
        let gray = image.as_gray()?;
        Ok(Image::Gray(self.threshold(gray)))
    }
}
