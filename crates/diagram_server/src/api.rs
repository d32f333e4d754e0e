use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use diagram::{AnalysisResult, Analyzer};
use tracing::{error, info, instrument};

use crate::{
    config::ServerConfig,
    error::{ApiError, ApiResult},
    storage::UploadStore,
};

/// Multipart field carrying the diagram image
pub const UPLOAD_FIELD: &str = "diagram";

/// Response header naming a kept upload, for `GET /uploads/{filename}`
pub const UPLOAD_HEADER: &str = "x-upload-filename";

/// Shared by every request. The analyzer holds only fixed configuration.
#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<Analyzer>,
    pub store: UploadStore,
    pub keep_uploads: bool,
}

impl AppState {
    pub fn new(analyzer: Analyzer, config: &ServerConfig) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
            store: UploadStore::new(&config.upload_dir),
            keep_uploads: config.keep_uploads,
        }
    }
}

pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/analyze_diagram", post(analyze_diagram))
        .route("/uploads/:filename", get(uploaded_file))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

async fn read_upload(multipart: &mut Multipart) -> ApiResult<Option<(String, Bytes)>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;
        return Ok(Some((filename, bytes)));
    }
    Ok(None)
}

#[instrument(skip_all)]
async fn analyze_diagram(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Response> {
    let (filename, bytes) = read_upload(&mut multipart)
        .await?
        .ok_or_else(|| ApiError::BadRequest("No file provided".to_string()))?;

    let stored = state.store.save(&filename, &bytes).await?;

    let analyzer = Arc::clone(&state.analyzer);
    let path = stored.path.clone();
    let outcome = tokio::task::spawn_blocking(move || analyzer.analyze(&path)).await;

    if !state.keep_uploads {
        if let Err(e) = state.store.delete(&stored.path).await {
            error!(path = %stored.path.display(), error = %e, "failed to delete upload");
        }
    }

    let result = outcome.map_err(|e| ApiError::Internal(e.to_string()))??;
    info!(
        filename = %stored.filename,
        relationships = result.relationships.len(),
        "diagram analyzed"
    );

    let mut response = Json::<AnalysisResult>(result).into_response();
    if state.keep_uploads {
        let value = HeaderValue::from_str(&stored.filename)
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        response.headers_mut().insert(UPLOAD_HEADER, value);
    }
    Ok(response)
}

fn content_type(filename: &str) -> &'static str {
    match filename.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()) {
        Some(ext) if ext == "png" => "image/png",
        Some(ext) if ext == "jpg" || ext == "jpeg" => "image/jpeg",
        _ => "application/octet-stream",
    }
}

async fn uploaded_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let path = state
        .store
        .resolve(&filename)
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid file name: {filename}")))?;

    match tokio::fs::read(&path).await {
        Ok(bytes) => Ok(([(header::CONTENT_TYPE, content_type(&filename))], bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ApiError::NotFound(format!("File not found: {filename}")))
        }
        Err(e) => Err(ApiError::Internal(e.to_string())),
    }
}
