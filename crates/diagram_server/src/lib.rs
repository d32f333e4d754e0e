//! HTTP front end for the diagram analyzer.
//!
//! `POST /analyze_diagram` accepts a multipart upload in the `diagram` field,
//! stores it, analyzes it on a blocking worker and answers with the JSON
//! analysis result. When uploads are kept, the stored name is returned in
//! the `x-upload-filename` header and `GET /uploads/{filename}` serves it.

pub mod api;
pub mod config;
pub mod error;
pub mod storage;

pub use api::{router, AppState, UPLOAD_FIELD, UPLOAD_HEADER};
pub use config::ServerConfig;
pub use error::{ApiError, StorageError};
pub use storage::{StoredImage, UploadStore};

use diagram::Analyzer;
use tracing::info;

/// Bind `config.bind_addr` and serve until the process is stopped
pub async fn serve(config: ServerConfig, analyzer: Analyzer) -> std::io::Result<()> {
    tokio::fs::create_dir_all(&config.upload_dir).await?;

    let app = router(AppState::new(analyzer, &config), config.max_upload_bytes);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    info!(
        addr = %listener.local_addr()?,
        upload_dir = %config.upload_dir.display(),
        keep_uploads = config.keep_uploads,
        "diagram server listening"
    );
    axum::serve(listener, app).await
}
