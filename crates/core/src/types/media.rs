//! Accepted media file types.
//!
//! Only image formats the storefront can render are accepted by uploads and
//! considered by media sync; anything else in the media directory or the
//! blob namespace is ignored.

use serde::{Deserialize, Serialize};

/// Largest accepted upload, in bytes (10 MiB).
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Reasons a file is refused as media.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MediaKindError {
    /// The file name has no extension.
    #[error("file has no extension: {0}")]
    MissingExtension(String),
    /// The extension is not an accepted image type.
    #[error("unsupported file type '.{0}' (allowed: jpg, jpeg, png, gif, webp, avif, svg)")]
    Unsupported(String),
    /// The file exceeds [`MAX_UPLOAD_BYTES`].
    #[error("file is {size} bytes; the limit is {max} bytes")]
    TooLarge {
        /// Actual size.
        size: usize,
        /// Limit.
        max: usize,
    },
    /// The file is empty.
    #[error("file is empty")]
    Empty,
}

/// An accepted image format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Jpeg,
    Png,
    Gif,
    Webp,
    Avif,
    Svg,
}

impl MediaKind {
    /// Classify a file name (or key) by its extension, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`MediaKindError`] when the extension is missing or unsupported.
    pub fn from_file_name(name: &str) -> Result<Self, MediaKindError> {
        let base = name.rsplit('/').next().unwrap_or(name);
        let (_, ext) = base
            .rsplit_once('.')
            .filter(|(stem, ext)| !stem.is_empty() && !ext.is_empty())
            .ok_or_else(|| MediaKindError::MissingExtension(base.to_owned()))?;

        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            "gif" => Ok(Self::Gif),
            "webp" => Ok(Self::Webp),
            "avif" => Ok(Self::Avif),
            "svg" => Ok(Self::Svg),
            other => Err(MediaKindError::Unsupported(other.to_owned())),
        }
    }

    /// Whether a file name is accepted media.
    #[must_use]
    pub fn is_media(name: &str) -> bool {
        Self::from_file_name(name).is_ok()
    }

    /// Validate the size of an upload of this kind.
    ///
    /// # Errors
    ///
    /// Returns [`MediaKindError::Empty`] or [`MediaKindError::TooLarge`].
    pub const fn check_size(size: usize) -> Result<(), MediaKindError> {
        if size == 0 {
            return Err(MediaKindError::Empty);
        }
        if size > MAX_UPLOAD_BYTES {
            return Err(MediaKindError::TooLarge {
                size,
                max: MAX_UPLOAD_BYTES,
            });
        }
        Ok(())
    }

    /// MIME type sent with stored objects.
    #[must_use]
    pub const fn content_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::Webp => "image/webp",
            Self::Avif => "image/avif",
            Self::Svg => "image/svg+xml",
        }
    }

    /// Canonical lowercase extension (without the dot).
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::Webp => "webp",
            Self::Avif => "avif",
            Self::Svg => "svg",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_file_name_is_case_insensitive() {
        assert_eq!(MediaKind::from_file_name("a.JPG").unwrap(), MediaKind::Jpeg);
        assert_eq!(MediaKind::from_file_name("a.jpeg").unwrap(), MediaKind::Jpeg);
        assert_eq!(
            MediaKind::from_file_name("products/b.WebP").unwrap(),
            MediaKind::Webp
        );
    }

    #[test]
    fn test_rejects_unsupported_and_missing() {
        assert_eq!(
            MediaKind::from_file_name("notes.txt"),
            Err(MediaKindError::Unsupported("txt".to_string()))
        );
        assert!(matches!(
            MediaKind::from_file_name("README"),
            Err(MediaKindError::MissingExtension(_))
        ));
        assert!(matches!(
            MediaKind::from_file_name(".png"),
            Err(MediaKindError::MissingExtension(_))
        ));
        // A dot in a directory name must not count as an extension
        assert!(!MediaKind::is_media("v1.2/README"));
    }

    #[test]
    fn test_check_size() {
        assert!(MediaKind::check_size(1).is_ok());
        assert!(MediaKind::check_size(MAX_UPLOAD_BYTES).is_ok());
        assert_eq!(MediaKind::check_size(0), Err(MediaKindError::Empty));
        assert!(matches!(
            MediaKind::check_size(MAX_UPLOAD_BYTES + 1),
            Err(MediaKindError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_content_type() {
        assert_eq!(MediaKind::Svg.content_type(), "image/svg+xml");
        assert_eq!(MediaKind::Jpeg.extension(), "jpg");
    }
}
