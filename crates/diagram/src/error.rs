use std::path::PathBuf;

use thiserror::Error;

use crate::raster::ChannelLayout;

#[derive(Error, Debug)]
pub enum DiagramError {
    #[error("Failed to decode image {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to decode image bytes: {0}")]
    DecodeBytes(#[source] image::ImageError),

    #[error("Preprocessing stage '{stage}' failed: {cause}")]
    Preprocess { stage: String, cause: String },

    #[error("Detector '{detector}' failed: {cause}")]
    Detection { detector: String, cause: String },

    #[error(
        "Stage '{stage}' at position {position} requires {stage_requires} input \
         but '{previous}' produces {previous_produces}"
    )]
    IncompatibleStages {
        position: usize,
        previous: String,
        previous_produces: ChannelLayout,
        stage: String,
        stage_requires: ChannelLayout,
    },

    #[error("Stage '{stage}' is misconfigured: {reason}")]
    InvalidStage { stage: String, reason: String },

    #[error("Expected {expected} image, found {found}")]
    ChannelMismatch {
        expected: ChannelLayout,
        found: ChannelLayout,
    },

    #[error("OCR error: {0}")]
    Ocr(String),

    #[error("Line detection error: {0}")]
    LineDetection(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("Unsupported config format. Please use .toml or .json files")]
    UnsupportedConfigFormat,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DiagramError>;
