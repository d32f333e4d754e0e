pub mod builder;

use tracing::debug;

use crate::{
    error::{DiagramError, Result},
    raster::{ChannelLayout, Image},
    traits::ImagePreprocessor,
};

/// An ordered, validated chain of preprocessing stages.
///
/// Adjacent stages are checked at construction: each stage must accept the
/// channel layout its predecessor produces.
pub struct PreprocessingPipeline {
    stages: Vec<Box<dyn ImagePreprocessor>>,
}

impl std::fmt::Debug for PreprocessingPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreprocessingPipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}

impl PreprocessingPipeline {
    /// Create a new pipeline builder
    pub fn builder() -> builder::PipelineBuilder {
        builder::PipelineBuilder::new()
    }

    /// Create a pipeline, rejecting incompatible stage orderings
    pub fn new(stages: Vec<Box<dyn ImagePreprocessor>>) -> Result<Self> {
        for stage in &stages {
            stage.validate()?;
        }
        for (position, pair) in stages.windows(2).enumerate() {
            let (previous, stage) = (&pair[0], &pair[1]);
            if previous.produces() != stage.requires() {
                return Err(DiagramError::IncompatibleStages {
                    position: position + 1,
                    previous: previous.name().to_string(),
                    previous_produces: previous.produces(),
                    stage: stage.name().to_string(),
                    stage_requires: stage.requires(),
                });
            }
        }
        Ok(Self { stages })
    }

    /// The layout the first stage expects, if any
    pub fn input_layout(&self) -> Option<ChannelLayout> {
        self.stages.first().map(|stage| stage.requires())
    }

    /// Check that the first stage accepts images produced by `source`
    pub fn check_input(&self, source: &str, layout: ChannelLayout) -> Result<()> {
        match self.stages.first() {
            Some(first) if first.requires() != layout => Err(DiagramError::IncompatibleStages {
                position: 0,
                previous: source.to_string(),
                previous_produces: layout,
                stage: first.name().to_string(),
                stage_requires: first.requires(),
            }),
            _ => Ok(()),
        }
    }

    /// The layout the last stage emits, if any
    pub fn output_layout(&self) -> Option<ChannelLayout> {
        self.stages.last().map(|stage| stage.produces())
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run every stage in order. The first failing stage aborts the run.
    pub fn run(&self, image: &Image) -> Result<Image> {
        let mut current = image.clone();
        for stage in &self.stages {
            debug!(stage = stage.name(), "running preprocessing stage");
            current = stage
                .preprocess(&current)
                .map_err(|e| DiagramError::Preprocess {
                    stage: stage.name().to_string(),
                    cause: e.to_string(),
                })?;
        }
        Ok(current)
    }
}
