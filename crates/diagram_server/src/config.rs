use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to listen on, e.g. `127.0.0.1:5000`
    pub bind_addr: String,
    /// Directory uploads are written to
    pub upload_dir: PathBuf,
    /// Leave uploads on disk after analysis so `/uploads/{filename}` can serve them
    pub keep_uploads: bool,
    /// Largest accepted request body in bytes
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5000".to_string(),
            upload_dir: PathBuf::from("uploads"),
            keep_uploads: false,
            max_upload_bytes: 16 * 1024 * 1024,
        }
    }
}
