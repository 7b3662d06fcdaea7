//! Local media directory.
//!
//! Files are addressed by key: a `/`-separated path relative to the media
//! root. Keys are validated before touching the filesystem so requests
//! cannot escape the root.

use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, instrument};
use walkdir::WalkDir;

use emporium_core::MediaKind;

use super::MediaError;

/// A media file on local disk.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MediaFile {
    pub key: String,
    pub size: u64,
    pub kind: MediaKind,
    pub modified: Option<DateTime<Utc>>,
}

/// Media files under a root directory.
#[derive(Debug, Clone)]
pub struct MediaLibrary {
    root: PathBuf,
}

impl MediaLibrary {
    /// Create a library rooted at `root`. The directory is created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a key to a path under the root.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::InvalidKey` for empty keys, absolute paths,
    /// backslashes, `.`/`..` segments or empty segments.
    pub fn resolve(&self, key: &str) -> Result<PathBuf, MediaError> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }

    /// List every accepted media file, sorted by key.
    ///
    /// A missing root yields an empty list. Non-media files are ignored.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::Io` if the directory walk fails.
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub async fn list(&self) -> Result<Vec<MediaFile>, MediaError> {
        let root = self.root.clone();
        let files = tokio::task::spawn_blocking(move || walk(&root))
            .await
            .map_err(|e| MediaError::Io {
                path: self.root.display().to_string(),
                source: std::io::Error::other(e),
            })??;
        debug!(count = files.len(), "Listed local media");
        Ok(files)
    }

    /// Whether a file exists for `key`.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::InvalidKey` or `MediaError::Io`.
    pub async fn exists(&self, key: &str) -> Result<bool, MediaError> {
        let path = self.resolve(key)?;
        tokio::fs::try_exists(&path)
            .await
            .map_err(|source| io_error(&path, source))
    }

    /// Read a file's bytes.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::NotFound` if the file is missing.
    pub async fn read(&self, key: &str) -> Result<Vec<u8>, MediaError> {
        let path = self.resolve(key)?;
        tokio::fs::read(&path).await.map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                MediaError::NotFound(key.to_owned())
            } else {
                io_error(&path, source)
            }
        })
    }

    /// Write a file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::InvalidKey` or `MediaError::Io`.
    pub async fn write(&self, key: &str, data: &[u8]) -> Result<(), MediaError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| io_error(parent, source))?;
        }
        tokio::fs::write(&path, data)
            .await
            .map_err(|source| io_error(&path, source))
    }

    /// Delete a file.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::NotFound` if the file is missing.
    pub async fn delete(&self, key: &str) -> Result<(), MediaError> {
        let path = self.resolve(key)?;
        tokio::fs::remove_file(&path).await.map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                MediaError::NotFound(key.to_owned())
            } else {
                io_error(&path, source)
            }
        })
    }
}

fn io_error(path: &Path, source: std::io::Error) -> MediaError {
    MediaError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Reject keys that are not plain relative paths.
///
/// # Errors
///
/// Returns `MediaError::InvalidKey` with the offending key.
pub fn validate_key(key: &str) -> Result<(), MediaError> {
    let invalid = key.is_empty()
        || key.contains('\\')
        || key.contains('\0')
        || key.starts_with('/')
        || key
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..");
    if invalid {
        return Err(MediaError::InvalidKey(key.to_owned()));
    }
    Ok(())
}

fn walk(root: &Path) -> Result<Vec<MediaFile>, MediaError> {
    if !root.exists() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).follow_links(false) {
        let entry = entry.map_err(|e| MediaError::Io {
            path: e
                .path()
                .map_or_else(|| root.display().to_string(), |p| p.display().to_string()),
            source: e.into(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(key) = relative_key(root, entry.path()) else {
            continue;
        };
        let Ok(kind) = MediaKind::from_file_name(&key) else {
            continue;
        };
        let metadata = entry.metadata().map_err(|e| MediaError::Io {
            path: entry.path().display().to_string(),
            source: e.into(),
        })?;
        files.push(MediaFile {
            key,
            size: metadata.len(),
            kind,
            modified: metadata.modified().ok().map(to_utc),
        });
    }

    files.sort_by(|a, b| a.key.cmp(&b.key));
    Ok(files)
}

/// `/`-joined path of `path` relative to `root`, if every segment is UTF-8.
fn relative_key(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(segment) => segments.push(segment.to_str()?),
            _ => return None,
        }
    }
    Some(segments.join("/"))
}

fn to_utc(time: SystemTime) -> DateTime<Utc> {
    DateTime::<Utc>::from(time)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key() {
        assert!(validate_key("a.jpg").is_ok());
        assert!(validate_key("products/teapots/a.jpg").is_ok());

        for bad in ["", "/etc/passwd", "../a.jpg", "a/../../b.png", "a//b.png", "a\\b.png", "./a.png"] {
            assert!(validate_key(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[tokio::test]
    async fn test_list_skips_non_media_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        let library = MediaLibrary::new(dir.path());

        library.write("b.png", b"png").await.unwrap();
        library.write("nested/a.JPG", b"jpg").await.unwrap();
        tokio::fs::write(dir.path().join("notes.txt"), b"text").await.unwrap();

        let files = library.list().await.unwrap();
        let keys: Vec<_> = files.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, vec!["b.png", "nested/a.JPG"]);
        assert_eq!(files[0].size, 3);
        assert_eq!(files[1].kind, MediaKind::Jpeg);
    }

    #[tokio::test]
    async fn test_list_missing_root_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let library = MediaLibrary::new(dir.path().join("does-not-exist"));
        assert!(library.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_read_write_delete() {
        let dir = tempfile::tempdir().unwrap();
        let library = MediaLibrary::new(dir.path());

        assert!(!library.exists("x/y.gif").await.unwrap());
        library.write("x/y.gif", b"gif").await.unwrap();
        assert!(library.exists("x/y.gif").await.unwrap());
        assert_eq!(library.read("x/y.gif").await.unwrap(), b"gif");

        library.delete("x/y.gif").await.unwrap();
        assert!(matches!(
            library.read("x/y.gif").await,
            Err(MediaError::NotFound(_))
        ));
        assert!(matches!(
            library.delete("x/y.gif").await,
            Err(MediaError::NotFound(_))
        ));
    }
}
