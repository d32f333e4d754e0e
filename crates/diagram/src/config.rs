use std::fs;
use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr, VariantNames};

use crate::error::{DiagramError, Result};

/// One preprocessing stage, in pipeline order.
#[derive(
    Debug, Clone,
    Serialize, Deserialize, JsonSchema,
    Display, VariantNames, IntoStaticStr,
    PartialEq
)]
#[serde(tag = "type", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StageConfig {
    /// Collapse color to luminance
    Grayscale,

    /// Binarize against the local neighborhood mean
    AdaptiveThreshold {
        #[schemars(range(min = 3))]
        block_size: u32,
        c: f64,
    },
}

/// Whether recognized words are reported individually or merged per line.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TextGranularity {
    #[default]
    Word,
    Line,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct TextDetectorConfig {
    /// Tesseract executable to invoke
    pub tesseract_path: String,
    pub language: String,
    /// Tesseract `--psm` value; 11 is sparse text, which suits diagrams
    pub page_segmentation_mode: u8,
    /// Words below this confidence (0-100) are dropped
    pub min_confidence: f32,
    pub granularity: TextGranularity,
}

impl Default for TextDetectorConfig {
    fn default() -> Self {
        Self {
            tesseract_path: "tesseract".to_string(),
            language: "eng".to_string(),
            page_segmentation_mode: 11,
            min_confidence: 0.0,
            granularity: TextGranularity::Word,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct BoxDetectorConfig {
    /// Smallest accepted box area in square pixels
    pub min_area: f64,
    /// Largest accepted long-side / short-side ratio
    pub max_aspect_ratio: f64,
    /// Polygon approximation tolerance as a fraction of the contour perimeter
    pub approximation_epsilon: f64,
    pub min_vertices: usize,
    pub max_vertices: usize,
}

impl Default for BoxDetectorConfig {
    fn default() -> Self {
        Self {
            min_area: 400.0,
            max_aspect_ratio: 20.0,
            approximation_epsilon: 0.02,
            min_vertices: 4,
            max_vertices: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct ArrowDetectorConfig {
    /// Minimum Hough accumulator votes for a line
    pub vote_threshold: u32,
    /// Non-maximum suppression radius in the Hough accumulator
    pub suppression_radius: u32,
    /// Segments shorter than this are discarded
    pub min_length: f64,
    /// Background pixels bridged inside a single segment
    pub max_gap: u32,
    /// Distance within which a segment counts as lying on a box edge
    pub edge_tolerance: f64,
    /// Half-size of the window used to find the arrowhead
    pub head_window: u32,
}

impl Default for ArrowDetectorConfig {
    fn default() -> Self {
        Self {
            vote_threshold: 40,
            suppression_radius: 8,
            min_length: 20.0,
            max_gap: 2,
            edge_tolerance: 4.0,
            head_window: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct RelationshipConfig {
    /// Maximum endpoint-to-box-boundary distance for a match
    pub proximity_threshold: f64,
}

impl Default for RelationshipConfig {
    fn default() -> Self {
        Self {
            proximity_threshold: 10.0,
        }
    }
}

/// Full analyzer configuration. Every field has a default, so an empty
/// file is a valid config.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub preprocessing: Vec<StageConfig>,
    pub text: TextDetectorConfig,
    pub boxes: BoxDetectorConfig,
    pub arrows: ArrowDetectorConfig,
    pub relationships: RelationshipConfig,
    /// Run the three detectors on separate worker threads
    pub parallel_detection: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            preprocessing: vec![
                StageConfig::Grayscale,
                StageConfig::AdaptiveThreshold {
                    block_size: 11,
                    c: 2.0,
                },
            ],
            text: TextDetectorConfig::default(),
            boxes: BoxDetectorConfig::default(),
            arrows: ArrowDetectorConfig::default(),
            relationships: RelationshipConfig::default(),
            parallel_detection: true,
        }
    }
}

impl AnalyzerConfig {
    /// Get the JSON schema for the configuration
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(AnalyzerConfig)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from JSON string
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Auto-detect file format and load configuration
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml(&fs::read_to_string(path)?),
            Some("json") => Self::from_json(&fs::read_to_string(path)?),
            _ => Err(DiagramError::UnsupportedConfigFormat),
        }
    }

    /// Convert configuration to JSON string
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_is_default() {
        let config = AnalyzerConfig::from_toml("").expect("empty config parses");
        assert_eq!(config, AnalyzerConfig::default());
    }

    #[test]
    fn test_toml_stage_list() {
        let config = AnalyzerConfig::from_toml(
            r#"
            parallel_detection = false

            [[preprocessing]]
            type = "grayscale"

            [[preprocessing]]
            type = "adaptive_threshold"
            block_size = 15
            c = 3.0

            [relationships]
            proximity_threshold = 6.5
            "#,
        )
        .expect("valid toml");

        assert!(!config.parallel_detection);
        assert_eq!(
            config.preprocessing[1],
            StageConfig::AdaptiveThreshold { block_size: 15, c: 3.0 }
        );
        assert_eq!(config.relationships.proximity_threshold, 6.5);
        assert_eq!(config.boxes, BoxDetectorConfig::default());
    }

    #[test]
    fn test_json_roundtrip_keeps_granularity() {
        let mut config = AnalyzerConfig::default();
        config.text.granularity = TextGranularity::Line;

        let json = config.to_json().expect("serializable");
        let parsed = AnalyzerConfig::from_json(&json).expect("parsable");
        assert_eq!(parsed.text.granularity, TextGranularity::Line);
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let err = AnalyzerConfig::from_file("analyzer.yaml").unwrap_err();
        assert!(matches!(err, DiagramError::UnsupportedConfigFormat));
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(StageConfig::Grayscale.to_string(), "grayscale");
        assert!(StageConfig::VARIANTS.contains(&"adaptive_threshold"));
    }

    #[test]
    fn test_schema_lists_sections() {
        let schema = serde_json::to_value(AnalyzerConfig::schema()).expect("schema json");
        assert!(schema["properties"]["preprocessing"].is_object());
        assert!(schema["properties"]["relationships"].is_object());
    }
}
