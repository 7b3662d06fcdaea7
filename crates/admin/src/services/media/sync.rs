//! Two-way media sync between the local library and blob storage.
//!
//! Progress is reported as a stream of [`SyncEvent`]s, serialized one JSON
//! object per line:
//!
//! ```text
//! {"type":"stats","local":3,"remote":2,"toUpload":1,"toDownload":0,"alreadySynced":2}
//! {"type":"progress","current":1,"total":1,"file":"a.jpg","direction":"upload","status":"uploaded"}
//! {"type":"complete","uploaded":1,"downloaded":0,"failed":0,"alreadySynced":2,"total":1}
//! ```
//!
//! Transfers run one at a time; a failed file is reported and the loop
//! moves on.

use std::collections::BTreeSet;
use std::sync::Arc;

use futures::Stream;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use emporium_core::MediaKind;

use super::{MediaError, MediaLibrary};
use crate::storage::BlobStore;

/// Which way files are copied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncDirection {
    /// Local → blob only.
    Upload,
    /// Blob → local only.
    Download,
    /// Both ways.
    #[default]
    Both,
}

impl SyncDirection {
    const fn uploads(self) -> bool {
        matches!(self, Self::Upload | Self::Both)
    }

    const fn downloads(self) -> bool {
        matches!(self, Self::Download | Self::Both)
    }
}

/// Direction of a single file transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferDirection {
    Upload,
    Download,
}

/// Result of a single file transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    Uploaded,
    Downloaded,
    Failed,
}

/// Counts computed before any transfer starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStats {
    pub local: usize,
    pub remote: usize,
    pub to_upload: usize,
    pub to_download: usize,
    pub already_synced: usize,
}

/// One file transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncProgress {
    /// 1-based position in the transfer list.
    pub current: usize,
    pub total: usize,
    pub file: String,
    pub direction: TransferDirection,
    pub status: TransferStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Totals once every transfer has been attempted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSummary {
    pub uploaded: usize,
    pub downloaded: usize,
    pub failed: usize,
    pub already_synced: usize,
    pub total: usize,
}

/// A progress event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SyncEvent {
    Stats(SyncStats),
    Progress(SyncProgress),
    Complete(SyncSummary),
    Error { message: String },
}

impl SyncEvent {
    /// Serialize as one NDJSON line (trailing newline included).
    #[must_use]
    pub fn to_ndjson(&self) -> String {
        let mut line = serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"error","message":"failed to encode event: {e}"}}"#)
        });
        line.push('\n');
        line
    }
}

/// Keys to copy in each direction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    pub local: usize,
    pub remote: usize,
    pub to_upload: Vec<String>,
    pub to_download: Vec<String>,
    pub already_synced: usize,
}

impl SyncPlan {
    /// Compare local and remote keys.
    ///
    /// Only accepted media kinds take part. Output lists are sorted and
    /// free of duplicates; directions not requested stay empty.
    #[must_use]
    pub fn build<L, R>(local: L, remote: R, direction: SyncDirection) -> Self
    where
        L: IntoIterator,
        L::Item: AsRef<str>,
        R: IntoIterator,
        R::Item: AsRef<str>,
    {
        let media = |keys: &mut dyn Iterator<Item = String>| -> BTreeSet<String> {
            keys.filter(|k| MediaKind::is_media(k)).collect()
        };
        let local = media(&mut local.into_iter().map(|k| k.as_ref().to_owned()));
        let remote = media(&mut remote.into_iter().map(|k| k.as_ref().to_owned()));

        let to_upload = if direction.uploads() {
            local.difference(&remote).cloned().collect()
        } else {
            Vec::new()
        };
        let to_download = if direction.downloads() {
            remote.difference(&local).cloned().collect()
        } else {
            Vec::new()
        };

        Self {
            local: local.len(),
            remote: remote.len(),
            already_synced: local.intersection(&remote).count(),
            to_upload,
            to_download,
        }
    }

    /// Number of transfers the plan will attempt.
    #[must_use]
    pub fn total(&self) -> usize {
        self.to_upload.len() + self.to_download.len()
    }

    fn stats(&self) -> SyncStats {
        SyncStats {
            local: self.local,
            remote: self.remote,
            to_upload: self.to_upload.len(),
            to_download: self.to_download.len(),
            already_synced: self.already_synced,
        }
    }
}

/// Run a sync and stream its progress.
///
/// The stream always ends with exactly one `complete` or `error` event.
pub fn sync_stream<S>(
    library: MediaLibrary,
    store: Arc<S>,
    direction: SyncDirection,
) -> impl Stream<Item = SyncEvent> + Send
where
    S: BlobStore + 'static,
{
    async_stream::stream! {
        let local = match library.list().await {
            Ok(files) => files.into_iter().map(|f| f.key).collect::<Vec<_>>(),
            Err(e) => {
                warn!(error = %e, "Media sync failed to list local files");
                yield SyncEvent::Error { message: format!("Failed to list local media: {e}") };
                return;
            }
        };
        let remote = match store.list().await {
            Ok(objects) => objects.into_iter().map(|o| o.key).collect::<Vec<_>>(),
            Err(e) => {
                warn!(error = %e, "Media sync failed to list blob storage");
                yield SyncEvent::Error { message: format!("Failed to list remote media: {e}") };
                return;
            }
        };

        let plan = SyncPlan::build(&local, &remote, direction);
        let total = plan.total();
        info!(?direction, to_upload = plan.to_upload.len(), to_download = plan.to_download.len(), "Starting media sync");
        yield SyncEvent::Stats(plan.stats());

        let mut summary = SyncSummary {
            already_synced: plan.already_synced,
            total,
            ..SyncSummary::default()
        };
        let mut current = 0;

        for key in &plan.to_upload {
            current += 1;
            let result = upload_one(&library, store.as_ref(), key).await;
            yield progress(current, total, key, TransferDirection::Upload, result, &mut summary);
        }

        for key in &plan.to_download {
            current += 1;
            let result = download_one(&library, store.as_ref(), key).await;
            yield progress(current, total, key, TransferDirection::Download, result, &mut summary);
        }

        info!(uploaded = summary.uploaded, downloaded = summary.downloaded, failed = summary.failed, "Media sync complete");
        yield SyncEvent::Complete(summary);
    }
}

async fn upload_one<S: BlobStore>(
    library: &MediaLibrary,
    store: &S,
    key: &str,
) -> Result<(), MediaError> {
    let kind = MediaKind::from_file_name(key)?;
    let data = library.read(key).await?;
    store.put(key, data, kind.content_type()).await?;
    Ok(())
}

async fn download_one<S: BlobStore>(
    library: &MediaLibrary,
    store: &S,
    key: &str,
) -> Result<(), MediaError> {
    let data = store.get(key).await?;
    library.write(key, &data).await
}

fn progress(
    current: usize,
    total: usize,
    key: &str,
    direction: TransferDirection,
    result: Result<(), MediaError>,
    summary: &mut SyncSummary,
) -> SyncEvent {
    let (status, error) = match (direction, result) {
        (TransferDirection::Upload, Ok(())) => {
            summary.uploaded += 1;
            (TransferStatus::Uploaded, None)
        }
        (TransferDirection::Download, Ok(())) => {
            summary.downloaded += 1;
            (TransferStatus::Downloaded, None)
        }
        (_, Err(e)) => {
            warn!(%key, ?direction, error = %e, "Media transfer failed");
            summary.failed += 1;
            (TransferStatus::Failed, Some(e.to_string()))
        }
    };

    SyncEvent::Progress(SyncProgress {
        current,
        total,
        file: key.to_owned(),
        direction,
        status,
        error,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryBlobStore;
    use futures::StreamExt;

    #[test]
    fn test_plan_set_difference() {
        let plan = SyncPlan::build(
            ["b.jpg", "a.png", "shared.gif"],
            ["shared.gif", "z/remote.webp"],
            SyncDirection::Both,
        );
        assert_eq!(plan.to_upload, vec!["a.png", "b.jpg"]);
        assert_eq!(plan.to_download, vec!["z/remote.webp"]);
        assert_eq!(plan.already_synced, 1);
        assert_eq!((plan.local, plan.remote), (3, 2));
        assert_eq!(plan.total(), 3);
    }

    #[test]
    fn test_plan_respects_direction_and_media_kinds() {
        let local = ["a.png", "notes.txt"];
        let remote = ["b.png", "backup.zip"];

        let up = SyncPlan::build(local, remote, SyncDirection::Upload);
        assert_eq!(up.to_upload, vec!["a.png"]);
        assert!(up.to_download.is_empty());
        assert_eq!((up.local, up.remote), (1, 1));

        let down = SyncPlan::build(local, remote, SyncDirection::Download);
        assert!(down.to_upload.is_empty());
        assert_eq!(down.to_download, vec!["b.png"]);
    }

    #[test]
    fn test_event_ndjson_shape() {
        let stats = SyncEvent::Stats(SyncStats {
            local: 3,
            remote: 2,
            to_upload: 1,
            to_download: 0,
            already_synced: 2,
        });
        assert_eq!(
            stats.to_ndjson(),
            "{\"type\":\"stats\",\"local\":3,\"remote\":2,\"toUpload\":1,\"toDownload\":0,\"alreadySynced\":2}\n"
        );

        let failed = SyncEvent::Progress(SyncProgress {
            current: 1,
            total: 2,
            file: "a.jpg".to_string(),
            direction: TransferDirection::Download,
            status: TransferStatus::Failed,
            error: Some("boom".to_string()),
        });
        let value: serde_json::Value = serde_json::from_str(failed.to_ndjson().trim_end()).unwrap();
        assert_eq!(value["type"], "progress");
        assert_eq!(value["direction"], "download");
        assert_eq!(value["status"], "failed");
        assert_eq!(value["error"], "boom");

        let error = SyncEvent::Error {
            message: "nope".to_string(),
        };
        assert_eq!(error.to_ndjson(), "{\"type\":\"error\",\"message\":\"nope\"}\n");
    }

    #[tokio::test]
    async fn test_sync_stream_copies_both_ways() {
        let dir = tempfile::tempdir().unwrap();
        let library = MediaLibrary::new(dir.path());
        library.write("local.png", b"L").await.unwrap();
        library.write("both.jpg", b"B").await.unwrap();

        let store = Arc::new(MemoryBlobStore::with_objects([
            ("both.jpg", b"B".as_slice()),
            ("remote/r.webp", b"R".as_slice()),
        ]));

        let events: Vec<SyncEvent> =
            sync_stream(library.clone(), store.clone(), SyncDirection::Both)
                .collect()
                .await;

        assert_eq!(events.len(), 4);
        assert!(matches!(&events[0], SyncEvent::Stats(s) if s.to_upload == 1 && s.to_download == 1 && s.already_synced == 1));
        assert!(matches!(&events[1], SyncEvent::Progress(p) if p.file == "local.png" && p.status == TransferStatus::Uploaded && p.current == 1));
        assert!(matches!(&events[2], SyncEvent::Progress(p) if p.file == "remote/r.webp" && p.status == TransferStatus::Downloaded && p.current == 2));
        assert_eq!(
            events[3],
            SyncEvent::Complete(SyncSummary {
                uploaded: 1,
                downloaded: 1,
                failed: 0,
                already_synced: 1,
                total: 2,
            })
        );

        assert_eq!(store.data("local.png").unwrap(), b"L");
        assert_eq!(library.read("remote/r.webp").await.unwrap(), b"R");
    }

    #[tokio::test]
    async fn test_sync_stream_continues_past_failures() {
        let dir = tempfile::tempdir().unwrap();
        let library = MediaLibrary::new(dir.path());
        library.write("a.png", b"A").await.unwrap();
        library.write("b.png", b"B").await.unwrap();

        let store = Arc::new(MemoryBlobStore::default());
        store.fail_on("a.png");

        let events: Vec<SyncEvent> = sync_stream(library, store.clone(), SyncDirection::Upload)
            .collect()
            .await;

        assert!(matches!(&events[1], SyncEvent::Progress(p) if p.file == "a.png" && p.status == TransferStatus::Failed && p.error.is_some()));
        assert!(matches!(&events[2], SyncEvent::Progress(p) if p.file == "b.png" && p.status == TransferStatus::Uploaded));
        assert!(matches!(&events[3], SyncEvent::Complete(s) if s.uploaded == 1 && s.failed == 1));
        assert_eq!(store.keys(), vec!["b.png"]);
    }

    #[tokio::test]
    async fn test_sync_stream_nothing_to_do() {
        let dir = tempfile::tempdir().unwrap();
        let library = MediaLibrary::new(dir.path());
        let store = Arc::new(MemoryBlobStore::default());

        let events: Vec<SyncEvent> = sync_stream(library, store, SyncDirection::Both)
            .collect()
            .await;

        assert_eq!(events.len(), 2);
        assert!(matches!(&events[1], SyncEvent::Complete(s) if s.total == 0));
    }
}
