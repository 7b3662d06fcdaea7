//! URL handles for brands, categories, products and pages.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Errors that can occur when validating a [`Slug`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SlugError {
    /// Nothing usable was left after normalization.
    #[error("slug cannot be empty")]
    Empty,
    /// The input is longer than [`Slug::MAX_LENGTH`].
    #[error("slug must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains characters outside `[a-z0-9-]` or misplaced hyphens.
    #[error("slug may only contain lowercase letters, digits and single inner hyphens: {0}")]
    Invalid(String),
}

/// A lowercase, hyphen-separated URL handle such as `summer-sale-2024`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Maximum length of a slug.
    pub const MAX_LENGTH: usize = 120;

    /// Derive a slug from free text (a product name, a page title, a file stem).
    ///
    /// ASCII letters are lowercased and digits kept; common Latin accents are
    /// folded to their base letter; every other run of characters becomes a
    /// single hyphen. Leading and trailing hyphens are dropped and the result
    /// is truncated to [`Slug::MAX_LENGTH`] on a character boundary.
    ///
    /// # Errors
    ///
    /// Returns [`SlugError::Empty`] if the text has no letters or digits.
    ///
    /// ```
    /// use emporium_core::Slug;
    ///
    /// let slug = Slug::generate("  Crème Brûlée — 12oz Jar!").unwrap();
    /// assert_eq!(slug.as_str(), "creme-brulee-12oz-jar");
    /// ```
    pub fn generate(text: &str) -> Result<Self, SlugError> {
        let mut out = String::with_capacity(text.len());
        let mut pending_hyphen = false;

        for c in text.chars() {
            let mapped = fold_char(c);
            if let Some(m) = mapped {
                if pending_hyphen && !out.is_empty() {
                    out.push('-');
                }
                pending_hyphen = false;
                out.push(m);
            } else {
                pending_hyphen = true;
            }
        }

        if out.len() > Self::MAX_LENGTH {
            out.truncate(Self::MAX_LENGTH);
            while out.ends_with('-') {
                out.pop();
            }
        }

        if out.is_empty() {
            return Err(SlugError::Empty);
        }
        Ok(Self(out))
    }

    /// Validate an existing handle without rewriting it.
    ///
    /// # Errors
    ///
    /// Returns a [`SlugError`] if the handle is empty, too long, or not in
    /// canonical form.
    pub fn parse(s: &str) -> Result<Self, SlugError> {
        if s.is_empty() {
            return Err(SlugError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(SlugError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        let canonical = s
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
            && !s.starts_with('-')
            && !s.ends_with('-')
            && !s.contains("--");
        if !canonical {
            return Err(SlugError::Invalid(s.to_owned()));
        }
        Ok(Self(s.to_owned()))
    }

    /// Use `explicit` when given (validated), otherwise derive from `fallback`.
    ///
    /// # Errors
    ///
    /// Propagates the error from [`Slug::parse`] or [`Slug::generate`].
    pub fn from_input(explicit: Option<&str>, fallback: &str) -> Result<Self, SlugError> {
        match explicit.map(str::trim).filter(|s| !s.is_empty()) {
            Some(s) => Self::parse(s),
            None => Self::generate(fallback),
        }
    }

    /// Returns the slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Slug` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

fn fold_char(c: char) -> Option<char> {
    if c.is_ascii_alphanumeric() {
        return Some(c.to_ascii_lowercase());
    }
    let folded = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => 'a',
        'ç' | 'Ç' => 'c',
        'è' | 'é' | 'ê' | 'ë' | 'È' | 'É' | 'Ê' | 'Ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' | 'Ì' | 'Í' | 'Î' | 'Ï' => 'i',
        'ñ' | 'Ñ' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' => 'o',
        'ù' | 'ú' | 'û' | 'ü' | 'Ù' | 'Ú' | 'Û' | 'Ü' => 'u',
        'ý' | 'ÿ' | 'Ý' => 'y',
        _ => return None,
    };
    Some(folded)
}

impl<'de> Deserialize<'de> for Slug {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_collapses_separators() {
        let slug = Slug::generate("Summer   Sale -- 2024!!").unwrap();
        assert_eq!(slug.as_str(), "summer-sale-2024");
    }

    #[test]
    fn test_generate_trims_edges() {
        let slug = Slug::generate("***Hello***").unwrap();
        assert_eq!(slug.as_str(), "hello");
    }

    #[test]
    fn test_generate_empty() {
        assert_eq!(Slug::generate("!!!"), Err(SlugError::Empty));
        assert_eq!(Slug::generate(""), Err(SlugError::Empty));
    }

    #[test]
    fn test_generate_truncates_without_trailing_hyphen() {
        let text = format!("{} tail", "a".repeat(Slug::MAX_LENGTH));
        let slug = Slug::generate(&text).unwrap();
        assert_eq!(slug.as_str().len(), Slug::MAX_LENGTH);
        assert!(!slug.as_str().ends_with('-'));
    }

    #[test]
    fn test_parse_rejects_non_canonical() {
        assert!(Slug::parse("ok-slug-1").is_ok());
        assert!(Slug::parse("Upper").is_err());
        assert!(Slug::parse("-lead").is_err());
        assert!(Slug::parse("trail-").is_err());
        assert!(Slug::parse("dou--ble").is_err());
        assert!(Slug::parse("sp ace").is_err());
    }

    #[test]
    fn test_from_input_prefers_explicit() {
        let slug = Slug::from_input(Some("custom-handle"), "Ignored Name").unwrap();
        assert_eq!(slug.as_str(), "custom-handle");

        let slug = Slug::from_input(Some("   "), "Fallback Name").unwrap();
        assert_eq!(slug.as_str(), "fallback-name");

        let slug = Slug::from_input(None, "Fallback Name").unwrap();
        assert_eq!(slug.as_str(), "fallback-name");
    }
}
