use std::fs;
use std::path::Path;

use diagram::{AnalysisResult, AnalyzerConfig, DiagramError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Diagram(#[from] DiagramError),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Analyzer configuration from a `.toml`/`.json` file, or the defaults
pub fn load_config(path: Option<&Path>) -> Result<AnalyzerConfig, CliError> {
    match path {
        Some(path) => Ok(AnalyzerConfig::from_file(path)?),
        None => Ok(AnalyzerConfig::default()),
    }
}

/// Pretty JSON for a result, written to `output` or returned for printing
pub fn emit_result(result: &AnalysisResult, output: Option<&Path>) -> Result<Option<String>, CliError> {
    let json = serde_json::to_string_pretty(result)?;
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, json)?;
            Ok(None)
        }
        None => Ok(Some(json)),
    }
}

/// Pretty JSON schema of [`AnalyzerConfig`]
pub fn config_schema() -> Result<String, CliError> {
    Ok(serde_json::to_string_pretty(&AnalyzerConfig::schema())?)
}
