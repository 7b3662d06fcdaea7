//! Multipart media uploads.
//!
//! Each file is handled on its own: a bad or failing file is reported and
//! the rest of the batch continues.

use serde::Serialize;
use tracing::{info, warn};

use emporium_core::{MediaKind, Slug};

use super::{MediaError, MediaLibrary, library::validate_key};
use crate::storage::BlobStore;

/// What happened to one uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Uploaded,
    Skipped,
    Failed,
}

/// Per-file result of an upload request.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UploadOutcome {
    /// File name as sent by the client.
    pub file_name: String,
    /// Storage key, when one could be derived.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub status: UploadStatus,
    /// Whether the file was also pushed to blob storage.
    pub remote: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UploadOutcome {
    fn failed(file_name: &str, key: Option<String>, error: &MediaError) -> Self {
        Self {
            file_name: file_name.to_owned(),
            key,
            status: UploadStatus::Failed,
            remote: false,
            error: Some(error.to_string()),
        }
    }
}

/// Derive the storage key for an uploaded file.
///
/// The stem is slugified and the extension lowercased; `folder`, when
/// given, is prefixed after validation.
///
/// # Errors
///
/// Returns `MediaError::Kind` for unsupported types, `MediaError::FileName`
/// when the stem has no usable characters, or `MediaError::InvalidKey` for
/// a bad folder.
///
/// ```
/// use emporium_admin::services::media::upload_key;
///
/// assert_eq!(upload_key("Summer Hat (2).JPG", None).unwrap(), "summer-hat-2.jpg");
/// assert_eq!(upload_key("logo.svg", Some("brands/")).unwrap(), "brands/logo.svg");
/// ```
pub fn upload_key(file_name: &str, folder: Option<&str>) -> Result<String, MediaError> {
    MediaKind::from_file_name(file_name)?;

    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    let (stem, ext) = base
        .rsplit_once('.')
        .ok_or_else(|| MediaError::InvalidKey(file_name.to_owned()))?;
    let name = format!("{}.{}", Slug::generate(stem)?, ext.to_ascii_lowercase());

    match folder.map(|f| f.trim().trim_matches('/')).filter(|f| !f.is_empty()) {
        Some(folder) => {
            let key = format!("{folder}/{name}");
            validate_key(&key)?;
            Ok(key)
        }
        None => Ok(name),
    }
}

/// Validate and store one uploaded file.
///
/// Files whose key already exists locally are skipped. New files are
/// written locally and, when `blob` is given, pushed to blob storage unless
/// an object with the same key is already there.
pub async fn store_upload<S: BlobStore>(
    library: &MediaLibrary,
    blob: Option<&S>,
    file_name: &str,
    folder: Option<&str>,
    data: Vec<u8>,
) -> UploadOutcome {
    let key = match upload_key(file_name, folder) {
        Ok(key) => key,
        Err(e) => return UploadOutcome::failed(file_name, None, &e),
    };
    let kind = match MediaKind::from_file_name(&key) {
        Ok(kind) => kind,
        Err(e) => return UploadOutcome::failed(file_name, Some(key), &e.into()),
    };
    if let Err(e) = MediaKind::check_size(data.len()) {
        return UploadOutcome::failed(file_name, Some(key), &e.into());
    }

    match library.exists(&key).await {
        Ok(true) => {
            info!(%key, "Media file already exists, skipping");
            return UploadOutcome {
                file_name: file_name.to_owned(),
                key: Some(key),
                status: UploadStatus::Skipped,
                remote: false,
                error: None,
            };
        }
        Ok(false) => {}
        Err(e) => return UploadOutcome::failed(file_name, Some(key), &e),
    }

    if let Err(e) = library.write(&key, &data).await {
        warn!(%key, error = %e, "Failed to write media file");
        return UploadOutcome::failed(file_name, Some(key), &e);
    }

    let mut remote = false;
    if let Some(blob) = blob {
        let pushed = match blob.exists(&key).await {
            Ok(true) => Ok(()),
            Ok(false) => blob.put(&key, data, kind.content_type()).await,
            Err(e) => Err(e),
        };
        match pushed {
            Ok(()) => remote = true,
            Err(e) => {
                warn!(%key, error = %e, "Stored media locally but blob upload failed");
                return UploadOutcome {
                    file_name: file_name.to_owned(),
                    key: Some(key),
                    status: UploadStatus::Uploaded,
                    remote: false,
                    error: Some(e.to_string()),
                };
            }
        }
    }

    info!(%key, remote, "Stored media upload");
    UploadOutcome {
        file_name: file_name.to_owned(),
        key: Some(key),
        status: UploadStatus::Uploaded,
        remote,
        error: None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryBlobStore;

    #[test]
    fn test_upload_key_slugifies_stem() {
        assert_eq!(upload_key("My Photo.PNG", None).unwrap(), "my-photo.png");
        assert_eq!(
            upload_key("C:\\Users\\me\\Crème Brûlée.webp", None).unwrap(),
            "creme-brulee.webp"
        );
        assert_eq!(
            upload_key("x.gif", Some(" /products/teapots/ ")).unwrap(),
            "products/teapots/x.gif"
        );
    }

    #[test]
    fn test_upload_key_rejects_bad_input() {
        assert!(matches!(
            upload_key("virus.exe", None),
            Err(MediaError::Kind(_))
        ));
        assert!(matches!(
            upload_key("!!!.png", None),
            Err(MediaError::FileName(_))
        ));
        assert!(matches!(
            upload_key("a.png", Some("../etc")),
            Err(MediaError::InvalidKey(_))
        ));
    }

    #[tokio::test]
    async fn test_store_upload_writes_local_and_remote() {
        let dir = tempfile::tempdir().unwrap();
        let library = MediaLibrary::new(dir.path());
        let blob = MemoryBlobStore::default();

        let outcome =
            store_upload(&library, Some(&blob), "Hat.JPG", None, b"jpeg".to_vec()).await;

        assert_eq!(outcome.status, UploadStatus::Uploaded);
        assert_eq!(outcome.key.as_deref(), Some("hat.jpg"));
        assert!(outcome.remote);
        assert_eq!(library.read("hat.jpg").await.unwrap(), b"jpeg");
        assert_eq!(blob.data("hat.jpg").unwrap(), b"jpeg");
    }

    #[tokio::test]
    async fn test_store_upload_skips_existing() {
        let dir = tempfile::tempdir().unwrap();
        let library = MediaLibrary::new(dir.path());
        library.write("hat.jpg", b"old").await.unwrap();

        let outcome =
            store_upload::<MemoryBlobStore>(&library, None, "hat.jpg", None, b"new".to_vec())
                .await;

        assert_eq!(outcome.status, UploadStatus::Skipped);
        assert_eq!(library.read("hat.jpg").await.unwrap(), b"old");
    }

    #[tokio::test]
    async fn test_store_upload_rejects_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let library = MediaLibrary::new(dir.path());

        let outcome =
            store_upload::<MemoryBlobStore>(&library, None, "a.png", None, Vec::new()).await;

        assert_eq!(outcome.status, UploadStatus::Failed);
        assert_eq!(outcome.error.as_deref(), Some("file is empty"));
        assert!(!library.exists("a.png").await.unwrap());
    }

    #[tokio::test]
    async fn test_store_upload_reports_remote_failure() {
        let dir = tempfile::tempdir().unwrap();
        let library = MediaLibrary::new(dir.path());
        let blob = MemoryBlobStore::default();
        blob.fail_on("a.png");

        let outcome = store_upload(&library, Some(&blob), "a.png", None, b"png".to_vec()).await;

        assert_eq!(outcome.status, UploadStatus::Uploaded);
        assert!(!outcome.remote);
        assert!(outcome.error.is_some());
        assert!(library.exists("a.png").await.unwrap());
    }
}
