//! Media library API: listing, uploads, deletion and blob storage sync.
//!
//! Sync endpoints answer with `application/x-ndjson`, one [`SyncEvent`] per
//! line, so the client can render progress while files transfer.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    Json, Router,
    body::Body,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::instrument;

use emporium_core::MAX_UPLOAD_BYTES;

use crate::{
    db::settings::{self, LAST_MEDIA_SYNC},
    error::AppError,
    middleware::{RequireAdminAuth, RequireWriteAccess},
    services::media::{
        MediaError, MediaFile, SyncDirection, SyncEvent, UploadOutcome, UploadStatus,
        library::validate_key, store_upload, sync::SyncSummary, sync_stream,
    },
    state::AppState,
    storage::{BlobStore, S3BlobStore},
};

/// Files accepted in one multipart request.
const MAX_FILES_PER_UPLOAD: usize = 20;

/// Build the media router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/media", get(list))
        .route(
            "/api/media/upload",
            post(upload).layer(DefaultBodyLimit::max(
                MAX_UPLOAD_BYTES * MAX_FILES_PER_UPLOAD + 64 * 1024,
            )),
        )
        .route("/api/media/upload-media", post(upload_media))
        .route("/api/media/sync", post(sync))
        .route("/api/media/{*key}", delete(destroy))
}

/// Per-file upload results.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub uploaded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub files: Vec<UploadOutcome>,
}

impl UploadResponse {
    fn new(files: Vec<UploadOutcome>) -> Self {
        let count = |status| files.iter().filter(|f| f.status == status).count();
        Self {
            uploaded: count(UploadStatus::Uploaded),
            skipped: count(UploadStatus::Skipped),
            failed: count(UploadStatus::Failed),
            files,
        }
    }
}

/// Delete query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct DeleteQuery {
    /// Also delete the blob storage copy.
    #[serde(default)]
    pub remote: bool,
}

/// Sync request body.
#[derive(Debug, Default, Deserialize)]
pub struct SyncRequest {
    #[serde(default)]
    pub direction: SyncDirection,
}

/// What is remembered about the last completed sync.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LastSync<'a> {
    direction: SyncDirection,
    finished_at: DateTime<Utc>,
    #[serde(flatten)]
    summary: &'a SyncSummary,
}

#[instrument(skip(_admin, state))]
async fn list(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<MediaFile>>, AppError> {
    Ok(Json(state.media().list().await?))
}

/// Multipart upload. File parts may be preceded by a `folder` text part.
#[instrument(skip(admin, state, multipart), fields(admin_id = %admin.id))]
async fn upload(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut folder: Option<String> = None;
    let mut files: Vec<(String, Vec<u8>)> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid multipart body: {e}")))?
    {
        if field.name() == Some("folder") {
            let text = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(format!("invalid folder: {e}")))?;
            folder = Some(text.trim().trim_matches('/').to_owned()).filter(|f| !f.is_empty());
            continue;
        }

        let Some(file_name) = field.file_name().map(str::to_owned) else {
            continue;
        };
        if files.len() == MAX_FILES_PER_UPLOAD {
            return Err(AppError::BadRequest(format!(
                "At most {MAX_FILES_PER_UPLOAD} files can be uploaded at once"
            )));
        }
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("failed to read {file_name}: {e}")))?;
        files.push((file_name, data.to_vec()));
    }

    if files.is_empty() {
        return Err(AppError::BadRequest("No files were uploaded".to_owned()));
    }

    let blob = state.blob().map(Arc::as_ref);
    let mut outcomes = Vec::with_capacity(files.len());
    for (file_name, data) in files {
        outcomes.push(store_upload(state.media(), blob, &file_name, folder.as_deref(), data).await);
    }

    let response = UploadResponse::new(outcomes);
    tracing::info!(
        uploaded = response.uploaded,
        skipped = response.skipped,
        failed = response.failed,
        "Media upload finished"
    );
    Ok(Json(response))
}

#[instrument(skip(admin, state), fields(admin_id = %admin.id))]
async fn destroy(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> Result<StatusCode, AppError> {
    validate_key(&key)?;

    let blob = if query.remote {
        Some(state.blob().ok_or_else(|| {
            AppError::BadRequest("Blob storage is not configured".to_owned())
        })?)
    } else {
        None
    };

    match state.media().delete(&key).await {
        Ok(()) => {}
        // The remote copy can still be removed.
        Err(MediaError::NotFound(_)) if blob.is_some() => {}
        Err(e) => return Err(e.into()),
    }
    if let Some(blob) = blob {
        blob.delete(&key).await?;
    }

    tracing::info!(%key, remote = query.remote, "Media deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Push every local file missing from blob storage.
#[instrument(skip(admin, state), fields(admin_id = %admin.id))]
async fn upload_media(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    sync_response(&state, SyncDirection::Upload)
}

/// Reconcile the local library with blob storage.
#[instrument(skip(admin, state, body), fields(admin_id = %admin.id))]
async fn sync(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    body: Option<Json<SyncRequest>>,
) -> Result<Response, AppError> {
    let direction = body.map(|Json(b)| b.direction).unwrap_or_default();
    sync_response(&state, direction)
}

fn sync_response(state: &AppState, direction: SyncDirection) -> Result<Response, AppError> {
    let store = state
        .blob()
        .cloned()
        .ok_or_else(|| AppError::BadRequest("Blob storage is not configured".to_owned()))?;

    let events = ndjson_events(state.media().clone(), store, direction, state.pool().clone());
    Ok((
        [
            (header::CONTENT_TYPE, "application/x-ndjson"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(events),
    )
        .into_response())
}

/// Encode sync events as NDJSON lines, recording the summary on completion.
fn ndjson_events(
    library: crate::services::media::MediaLibrary,
    store: Arc<S3BlobStore>,
    direction: SyncDirection,
    pool: PgPool,
) -> impl futures::Stream<Item = Result<String, Infallible>> + Send + 'static {
    async_stream::stream! {
        let events = sync_stream(library, store, direction);
        let mut events = std::pin::pin!(events);
        while let Some(event) = events.next().await {
            if let SyncEvent::Complete(summary) = &event {
                record_sync(&pool, direction, summary).await;
            }
            yield Ok(event.to_ndjson());
        }
    }
}

async fn record_sync(pool: &PgPool, direction: SyncDirection, summary: &SyncSummary) {
    let last = LastSync {
        direction,
        finished_at: Utc::now(),
        summary,
    };
    if let Err(e) = settings::set_typed(pool, LAST_MEDIA_SYNC, &last).await {
        tracing::warn!(error = %e, "Failed to record media sync summary");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn outcome(status: UploadStatus) -> UploadOutcome {
        UploadOutcome {
            file_name: "a.png".to_owned(),
            key: Some("a.png".to_owned()),
            status,
            remote: false,
            error: None,
        }
    }

    #[test]
    fn test_upload_response_counts() {
        let response = UploadResponse::new(vec![
            outcome(UploadStatus::Uploaded),
            outcome(UploadStatus::Skipped),
            outcome(UploadStatus::Uploaded),
            outcome(UploadStatus::Failed),
        ]);
        assert_eq!(
            (response.uploaded, response.skipped, response.failed),
            (2, 1, 1)
        );
    }

    #[test]
    fn test_sync_request_direction() {
        let body: SyncRequest = serde_json::from_str(r#"{"direction":"download"}"#).unwrap();
        assert_eq!(body.direction, SyncDirection::Download);

        let body: SyncRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(body.direction, SyncDirection::Both);
    }

    #[test]
    fn test_last_sync_shape() {
        let summary = SyncSummary {
            uploaded: 2,
            total: 2,
            ..SyncSummary::default()
        };
        let value = serde_json::to_value(LastSync {
            direction: SyncDirection::Upload,
            finished_at: Utc::now(),
            summary: &summary,
        })
        .unwrap();
        assert_eq!(value["direction"], "upload");
        assert_eq!(value["uploaded"], 2);
        assert!(value.get("finishedAt").is_some());
    }
}
