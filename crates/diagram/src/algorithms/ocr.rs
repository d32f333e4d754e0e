use std::process::Command;

use image::{GrayImage, ImageFormat};
use serde::Deserialize;
use tracing::debug;

use crate::{
    config::TextDetectorConfig,
    error::{DiagramError, Result},
    traits::{OcrEngine, RecognizedWord},
};

/// Tesseract TSV row level for single words
const WORD_LEVEL: u32 = 5;

/// OCR engine that shells out to the `tesseract` executable and reads its
/// TSV report.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    pub binary: String,
    pub language: String,
    pub page_segmentation_mode: u8,
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::from_config(&TextDetectorConfig::default())
    }
}

impl TesseractEngine {
    pub fn from_config(config: &TextDetectorConfig) -> Self {
        Self {
            binary: config.tesseract_path.clone(),
            language: config.language.clone(),
            page_segmentation_mode: config.page_segmentation_mode,
        }
    }
}

impl OcrEngine for TesseractEngine {
    fn recognize(&self, image: &GrayImage) -> Result<Vec<RecognizedWord>> {
        let input = tempfile::Builder::new()
            .prefix("diagram-ocr-")
            .suffix(".png")
            .tempfile()?;
        image
            .save_with_format(input.path(), ImageFormat::Png)
            .map_err(|e| DiagramError::Ocr(format!("failed to write OCR input: {e}")))?;

        let output = Command::new(&self.binary)
            .arg(input.path())
            .arg("stdout")
            .args(["-l", &self.language])
            .args(["--psm", &self.page_segmentation_mode.to_string()])
            .arg("tsv")
            .output()
            .map_err(|e| DiagramError::Ocr(format!("failed to run {}: {e}", self.binary)))?;

        if !output.status.success() {
            return Err(DiagramError::Ocr(format!(
                "{} exited with {}: {}",
                self.binary,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let words = parse_tsv(&String::from_utf8_lossy(&output.stdout))?;
        debug!(words = words.len(), "tesseract finished");
        Ok(words)
    }
}

/// One row of Tesseract's TSV report. Page and word numbers are ignored.
#[derive(Debug, Deserialize)]
struct TsvRow {
    level: u32,
    block_num: u32,
    par_num: u32,
    line_num: u32,
    left: u32,
    top: u32,
    width: u32,
    height: u32,
    conf: f32,
    #[serde(default)]
    text: Option<String>,
}

/// Parse Tesseract's TSV report, keeping word-level rows with text.
pub fn parse_tsv(report: &str) -> Result<Vec<RecognizedWord>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .quoting(false)
        .flexible(true)
        .from_reader(report.as_bytes());

    let mut words = Vec::new();
    for row in reader.deserialize() {
        let row: TsvRow = row.map_err(|e| DiagramError::Ocr(format!("malformed TSV report: {e}")))?;
        if row.level != WORD_LEVEL {
            continue;
        }
        let Some(text) = row.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) else {
            continue;
        };

        words.push(RecognizedWord {
            text: text.to_string(),
            left: row.left,
            top: row.top,
            width: row.width,
            height: row.height,
            confidence: row.conf,
            line_key: (row.block_num, row.par_num, row.line_num),
        });
    }

    Ok(words)
}
