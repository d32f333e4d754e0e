use std::path::Path;

use tracing::{debug, info, instrument};

use crate::{
    algorithms::{ArrowDetector, BoxDetector, RelationshipCalculator, TextDetector},
    config::AnalyzerConfig,
    error::{DiagramError, Result},
    pipeline::{builder::PipelineBuilder, PreprocessingPipeline},
    raster::Image,
    traits::FeatureDetector,
    types::{AnalysisResult, Arrow, Rectangle, TextBlock},
};

pub type TextFeatureDetector = Box<dyn FeatureDetector<Feature = TextBlock>>;
pub type BoxFeatureDetector = Box<dyn FeatureDetector<Feature = Rectangle>>;
pub type ArrowFeatureDetector = Box<dyn FeatureDetector<Feature = Arrow>>;

/// One detector per feature category.
pub struct Detectors {
    pub text: TextFeatureDetector,
    pub boxes: BoxFeatureDetector,
    pub arrows: ArrowFeatureDetector,
}

impl Detectors {
    pub fn new<T, B, A>(text: T, boxes: B, arrows: A) -> Self
    where
        T: FeatureDetector<Feature = TextBlock> + 'static,
        B: FeatureDetector<Feature = Rectangle> + 'static,
        A: FeatureDetector<Feature = Arrow> + 'static,
    {
        Self {
            text: Box::new(text),
            boxes: Box::new(boxes),
            arrows: Box::new(arrows),
        }
    }

    /// Tesseract text, contour boxes and Hough arrows
    pub fn from_config(config: &AnalyzerConfig) -> Self {
        Self::new(
            TextDetector::from_config(&config.text),
            BoxDetector::new(config.boxes.clone()),
            ArrowDetector::from_config(&config.arrows, &config.boxes),
        )
    }

    /// Replace the text detector (replaces any existing one)
    pub fn with_text_detector<T>(mut self, text: T) -> Self
    where
        T: FeatureDetector<Feature = TextBlock> + 'static,
    {
        self.text = Box::new(text);
        self
    }
}

fn run_detector<F: Send>(detector: &dyn FeatureDetector<Feature = F>, image: &Image) -> Result<Vec<F>> {
    debug!(detector = detector.name(), "running detector");
    detector
        .detect(image)
        .map_err(|e| DiagramError::Detection {
            detector: detector.name().to_string(),
            cause: e.to_string(),
        })
}

/// Diagram analyzer: preprocessing, detection fan-out, relationship fan-in.
///
/// Holds only fixed configuration, so one analyzer can serve concurrent
/// calls without locking. Each call either succeeds completely or fails.
pub struct Analyzer {
    pipeline: PreprocessingPipeline,
    detectors: Detectors,
    calculator: RelationshipCalculator,
    parallel_detection: bool,
}

impl Analyzer {
    /// Fails if the pipeline's first stage cannot take a decoded image
    pub fn new(
        pipeline: PreprocessingPipeline,
        detectors: Detectors,
        calculator: RelationshipCalculator,
    ) -> Result<Self> {
        pipeline.check_input("decoder", Image::DECODED_LAYOUT)?;
        Ok(Self {
            pipeline,
            detectors,
            calculator,
            parallel_detection: true,
        })
    }

    /// Build every strategy from configuration. Fails if the configured
    /// stages are misconfigured or cannot be chained from a decoded image.
    pub fn from_config(config: &AnalyzerConfig) -> Result<Self> {
        Self::from_config_with_detectors(config, Detectors::from_config(config))
    }

    /// Configured pipeline and calculator with caller-supplied detectors
    pub fn from_config_with_detectors(config: &AnalyzerConfig, detectors: Detectors) -> Result<Self> {
        let pipeline = config
            .preprocessing
            .iter()
            .fold(PipelineBuilder::new(), |builder, stage| builder.with_stage(stage))
            .build()?;

        Ok(Self::new(
            pipeline,
            detectors,
            RelationshipCalculator::from_config(&config.relationships),
        )?
        .with_parallel_detection(config.parallel_detection))
    }

    pub fn with_parallel_detection(mut self, parallel: bool) -> Self {
        self.parallel_detection = parallel;
        self
    }

    pub fn pipeline(&self) -> &PreprocessingPipeline {
        &self.pipeline
    }

    /// Analyze the image stored at `path`
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn analyze<P: AsRef<Path>>(&self, path: P) -> Result<AnalysisResult> {
        let image = Image::open(path)?;
        self.analyze_image(&image)
    }

    /// Analyze an encoded image held in memory
    pub fn analyze_bytes(&self, bytes: &[u8]) -> Result<AnalysisResult> {
        let image = Image::from_bytes(bytes)?;
        self.analyze_image(&image)
    }

    /// Analyze an already decoded image
    pub fn analyze_image(&self, image: &Image) -> Result<AnalysisResult> {
        info!(
            width = image.width(),
            height = image.height(),
            stages = self.pipeline.len(),
            "analyzing diagram"
        );

        let processed = self.pipeline.run(image)?;
        let (texts, boxes, arrows) = self.detect(&processed)?;
        let relationships = self.calculator.calculate(&texts, &boxes, &arrows);

        info!(
            texts = texts.len(),
            boxes = boxes.len(),
            arrows = arrows.len(),
            relationships = relationships.len(),
            "analysis complete"
        );

        Ok(AnalysisResult {
            texts,
            boxes,
            arrows,
            relationships,
        })
    }

    fn detect(&self, image: &Image) -> Result<(Vec<TextBlock>, Vec<Rectangle>, Vec<Arrow>)> {
        let text = self.detectors.text.as_ref();
        let boxes = self.detectors.boxes.as_ref();
        let arrows = self.detectors.arrows.as_ref();

        if self.parallel_detection {
            let (texts, (boxes, arrows)) = rayon::join(
                || run_detector(text, image),
                || rayon::join(|| run_detector(boxes, image), || run_detector(arrows, image)),
            );
            // Joined by category, so the reported failure never depends on timing
            Ok((texts?, boxes?, arrows?))
        } else {
            Ok((
                run_detector(text, image)?,
                run_detector(boxes, image)?,
                run_detector(arrows, image)?,
            ))
        }
    }
}
