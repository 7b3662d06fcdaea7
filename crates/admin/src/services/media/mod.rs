//! Media management: local library, uploads and cloud sync.

pub mod library;
pub mod sync;
pub mod upload;

use thiserror::Error;

use emporium_core::{MediaKindError, SlugError};

use crate::storage::StorageError;

pub use library::{MediaFile, MediaLibrary};
pub use sync::{SyncDirection, SyncEvent, SyncPlan, sync_stream};
pub use upload::{UploadOutcome, UploadStatus, store_upload, upload_key};

/// Errors from media operations.
#[derive(Debug, Error)]
pub enum MediaError {
    /// The key is not a safe relative path.
    #[error("invalid media key: {0}")]
    InvalidKey(String),

    /// The file is not an accepted media type or size.
    #[error(transparent)]
    Kind(#[from] MediaKindError),

    /// No usable name could be derived from the file name.
    #[error("invalid file name: {0}")]
    FileName(#[from] SlugError),

    /// The file does not exist.
    #[error("media file not found: {0}")]
    NotFound(String),

    /// Filesystem failure.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Blob storage failure.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl MediaError {
    /// Whether the error was caused by the request rather than the server.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidKey(_) | Self::Kind(_) | Self::FileName(_))
    }
}
