pub mod preprocessing;
pub mod extraction;
pub mod hough;
pub mod ocr;
pub mod detection;
pub mod relationships;

pub use preprocessing::*;
pub use extraction::{ImageprocContourExtractor, ApproximatedShape};
pub use hough::HoughSegmentDetector;
pub use ocr::TesseractEngine;
pub use detection::*;
pub use relationships::*;
