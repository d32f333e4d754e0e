//! # Diagram Analysis Library
//!
//! Turns a raster image of a diagram (boxes, arrows, labels) into structured
//! data: text regions, boxes, arrow segments, and the directed relationships
//! between boxes that the arrows imply.
//!
//! ## Core Features
//!
//! - **Validated Preprocessing**: stages declare the channel layout they need
//!   and produce, and incompatible orderings are rejected when the pipeline is built
//! - **Independent Detectors**: text (OCR), boxes (contours) and arrows (Hough)
//!   each read the same preprocessed image and may run in parallel
//! - **Relationship Inference**: arrow endpoints are matched to the nearest box outline
//! - **Explicit Configuration**: every strategy is built from an [`AnalyzerConfig`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use diagram::{Analyzer, AnalyzerConfig};
//!
//! let analyzer = Analyzer::from_config(&AnalyzerConfig::default())?;
//! let result = analyzer.analyze("diagram.png")?;
//!
//! for relationship in &result.relationships {
//!     println!("{:?} -> {:?}", relationship.source, relationship.destination);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Custom Pipeline
//!
//! ```rust,no_run
//! use diagram::{algorithms::*, Analyzer, Detectors, PreprocessingPipeline};
//!
//! let pipeline = PreprocessingPipeline::builder()
//!     .with_grayscale()
//!     .with_adaptive_threshold(15, 3.0)
//!     .build()?;
//!
//! let detectors = Detectors::new(
//!     TextDetector::new(TesseractEngine::default()),
//!     BoxDetector::default(),
//!     ArrowDetector::new(HoughSegmentDetector::default(), BoxDetector::default()),
//! );
//!
//! let analyzer = Analyzer::new(pipeline, detectors, RelationshipCalculator::new(8.0))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Core modules
pub mod error;
pub mod types;
pub mod raster;
pub mod traits;
pub mod config;
pub mod algorithms;
pub mod pipeline;
pub mod analyzer;

// Re-exports for convenience
pub use error::{DiagramError, Result};
pub use types::{AnalysisResult, Arrow, Point, Rectangle, Relationship, TextBlock};
pub use raster::{ChannelLayout, Image};
pub use traits::*;
pub use config::AnalyzerConfig;
pub use pipeline::{builder::PipelineBuilder, PreprocessingPipeline};
pub use analyzer::{Analyzer, Detectors};
