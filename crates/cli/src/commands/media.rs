//! Media library commands.
//!
//! # Usage
//!
//! ```bash
//! em-cli media sync --direction upload
//! ```
//!
//! # Environment Variables
//!
//! - `MEDIA_ROOT` - local media directory (default `./public/media`)
//! - `BLOB_BUCKET`, `BLOB_ACCESS_KEY`, `BLOB_SECRET_KEY` - required
//! - `BLOB_REGION`, `BLOB_ENDPOINT`, `BLOB_PREFIX`, `BLOB_PATH_STYLE` - optional

use std::sync::Arc;

use futures::StreamExt;
use thiserror::Error;

use emporium_admin::config::{BlobConfig, ConfigError, PathsConfig};
use emporium_admin::services::media::{MediaLibrary, SyncDirection, SyncEvent, sync_stream};
use emporium_admin::storage::S3BlobStore;

/// Errors that can occur during media commands.
#[derive(Debug, Error)]
pub enum MediaCommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Blob storage is not configured (set BLOB_BUCKET, BLOB_ACCESS_KEY and BLOB_SECRET_KEY)")]
    NotConfigured,

    #[error("Media sync failed: {0}")]
    Sync(String),

    #[error("{0} file(s) failed to transfer")]
    Failures(usize),
}

/// Sync the local media library with blob storage, logging progress.
///
/// # Errors
///
/// Returns `MediaCommandError` if blob storage is not configured, listing
/// fails, or any file fails to transfer.
pub async fn sync(direction: SyncDirection) -> Result<(), MediaCommandError> {
    let blob = BlobConfig::from_env()?.ok_or(MediaCommandError::NotConfigured)?;
    let library = MediaLibrary::new(PathsConfig::from_env().media_root);
    let store = Arc::new(S3BlobStore::new(&blob));

    tracing::info!(
        "Syncing {} with bucket {} ({:?})",
        library.root().display(),
        store.bucket(),
        direction
    );

    let events = sync_stream(library, store, direction);
    let mut events = std::pin::pin!(events);
    while let Some(event) = events.next().await {
        match event {
            SyncEvent::Stats(stats) => tracing::info!(
                "{} local, {} remote, {} to upload, {} to download, {} already synced",
                stats.local,
                stats.remote,
                stats.to_upload,
                stats.to_download,
                stats.already_synced
            ),
            SyncEvent::Progress(progress) => match &progress.error {
                None => tracing::info!(
                    "[{}/{}] {:?} {}",
                    progress.current,
                    progress.total,
                    progress.status,
                    progress.file
                ),
                Some(error) => tracing::warn!(
                    "[{}/{}] failed {}: {}",
                    progress.current,
                    progress.total,
                    progress.file,
                    error
                ),
            },
            SyncEvent::Complete(summary) => {
                tracing::info!(
                    "Sync complete: {} uploaded, {} downloaded, {} failed, {} already synced",
                    summary.uploaded,
                    summary.downloaded,
                    summary.failed,
                    summary.already_synced
                );
                if summary.failed > 0 {
                    return Err(MediaCommandError::Failures(summary.failed));
                }
            }
            SyncEvent::Error { message } => return Err(MediaCommandError::Sync(message)),
        }
    }
    Ok(())
}
