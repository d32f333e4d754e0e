use std::io::Write;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{info, warn};

use crate::error::StorageError;

pub const ALLOWED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// An uploaded image written to disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub filename: String,
    pub path: PathBuf,
}

/// Reduce a client-supplied name to a plain file name: no directory
/// components, ASCII letters, digits, `.`, `-` and `_` only.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(|c| c == '/' || c == '\\').next().unwrap_or_default();
    let cleaned: String = base
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();
    cleaned.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// True when `filename` has a stem and an allowed image extension (any case)
pub fn is_allowed(filename: &str) -> bool {
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            let ext = ext.to_ascii_lowercase();
            ALLOWED_EXTENSIONS.contains(&ext.as_str())
        }
        _ => false,
    }
}

/// Upload directory for diagrams awaiting analysis.
///
/// Every upload gets its own file, named `{stem}-{random}.{ext}` after the
/// sanitized client name, so concurrent uploads never share a path.
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a stored file, or `None` if `filename` is not a plain file name
    pub fn resolve(&self, filename: &str) -> Option<PathBuf> {
        (!filename.is_empty() && sanitize_filename(filename) == filename)
            .then(|| self.root.join(filename))
    }

    pub async fn save(&self, filename: &str, bytes: &[u8]) -> Result<StoredImage, StorageError> {
        let sanitized = sanitize_filename(filename);
        let Some((stem, ext)) = sanitized.rsplit_once('.').filter(|_| is_allowed(&sanitized)) else {
            warn!(filename, "rejected upload");
            return Err(StorageError::InvalidFileType(filename.to_string()));
        };

        let root = self.root.clone();
        let prefix = format!("{stem}-");
        let suffix = format!(".{ext}");
        let contents = bytes.to_vec();
        let path = tokio::task::spawn_blocking(move || -> Result<PathBuf, StorageError> {
            std::fs::create_dir_all(&root)?;
            let mut file = tempfile::Builder::new()
                .prefix(&prefix)
                .suffix(&suffix)
                .rand_bytes(8)
                .tempfile_in(&root)?;
            file.write_all(&contents)?;
            let (_, path) = file.keep().map_err(|e| e.error)?;
            Ok(path)
        })
        .await
        .map_err(|e| StorageError::Io(std::io::Error::other(e)))??;

        let stored_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
            .to_string();
        info!(filename = %stored_name, path = %path.display(), bytes = bytes.len(), "upload saved");
        Ok(StoredImage {
            filename: stored_name,
            path,
        })
    }

    /// Remove a stored file. Deleting a missing file only logs a warning.
    pub async fn delete(&self, path: &Path) -> Result<(), StorageError> {
        match fs::remove_file(path).await {
            Ok(()) => {
                info!(path = %path.display(), "upload deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "upload not found, skipping deletion");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
