use crate::{
    algorithms::{AdaptiveThresholdPreprocessor, GrayscalePreprocessor},
    config::StageConfig,
    error::Result,
    pipeline::PreprocessingPipeline,
    traits::ImagePreprocessor,
};

/// Builder for creating preprocessing pipelines with a fluent API
#[derive(Default)]
pub struct PipelineBuilder {
    preprocessors: Vec<Box<dyn ImagePreprocessor>>,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self {
            preprocessors: Vec::new(),
        }
    }

    /// Add a preprocessor to the pipeline
    pub fn add_preprocessor<P>(mut self, preprocessor: P) -> Self
    where
        P: ImagePreprocessor + 'static,
    {
        self.preprocessors.push(Box::new(preprocessor));
        self
    }

    /// Add grayscale conversion as the next stage
    pub fn with_grayscale(self) -> Self {
        self.add_preprocessor(GrayscalePreprocessor)
    }

    /// Add adaptive thresholding as the next stage
    pub fn with_adaptive_threshold(self, block_size: u32, c: f64) -> Self {
        self.add_preprocessor(AdaptiveThresholdPreprocessor { block_size, c })
    }

    /// Append the stage described by a config entry
    pub fn with_stage(self, stage: &StageConfig) -> Self {
        match stage {
            StageConfig::Grayscale => self.with_grayscale(),
            StageConfig::AdaptiveThreshold { block_size, c } => {
                self.with_adaptive_threshold(*block_size, *c)
            }
        }
    }

    /// Validate the stage chain and build the pipeline
    pub fn build(self) -> Result<PreprocessingPipeline> {
        PreprocessingPipeline::new(self.preprocessors)
    }

    /// Grayscale followed by an 11px, c=2 adaptive threshold
    pub fn build_default() -> Result<PreprocessingPipeline> {
        Self::new()
            .with_grayscale()
            .with_adaptive_threshold(11, 2.0)
            .build()
    }
}
