//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AdminConfig;
use crate::services::media::MediaLibrary;
use crate::storage::S3BlobStore;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    pool: PgPool,
    media: MediaLibrary,
    blob: Option<Arc<S3BlobStore>>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Blob storage is only set up when configured.
    #[must_use]
    pub fn new(config: AdminConfig, pool: PgPool) -> Self {
        let media = MediaLibrary::new(config.paths.media_root.clone());
        let blob = config.blob().map(|blob| Arc::new(S3BlobStore::new(blob)));
        if blob.is_none() {
            tracing::info!("Blob storage not configured; media sync disabled");
        }

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                media,
                blob,
            }),
        }
    }

    /// Get a reference to the admin configuration.
    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get the local media library.
    #[must_use]
    pub fn media(&self) -> &MediaLibrary {
        &self.inner.media
    }

    /// Get the blob store, if configured.
    #[must_use]
    pub fn blob(&self) -> Option<&Arc<S3BlobStore>> {
        self.inner.blob.as_ref()
    }
}
