//! Snippet data model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Maximum title length in Unicode code points.
pub const TITLE_MAX_CHARS: usize = 100;
/// Maximum content length in Unicode code points.
pub const CONTENT_MAX_CHARS: usize = 250;
/// Expiry choices offered by the create form, in days.
pub const PERMITTED_EXPIRY_DAYS: [i32; 3] = [1, 7, 365];

/// Positive snippet identifier.
///
/// # Examples
/// ```
/// use snippetbox::domain::SnippetId;
///
/// let id: SnippetId = "42".parse().unwrap();
/// assert_eq!(id.get(), 42);
/// assert!("0".parse::<SnippetId>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct SnippetId(i32);

/// Returned when a path segment is not a usable snippet id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SnippetIdError {
    /// The value was not an integer.
    #[error("snippet id must be an integer")]
    NotANumber,
    /// The value was zero or negative.
    #[error("snippet id must be at least 1")]
    NotPositive,
}

impl SnippetId {
    /// Validate a raw identifier.
    ///
    /// # Errors
    /// Returns [`SnippetIdError::NotPositive`] for values below 1.
    pub const fn new(raw: i32) -> Result<Self, SnippetIdError> {
        if raw < 1 {
            return Err(SnippetIdError::NotPositive);
        }
        Ok(Self(raw))
    }

    /// Underlying integer value.
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl FromStr for SnippetId {
    type Err = SnippetIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.parse::<i32>().map_err(|_| SnippetIdError::NotANumber)?;
        Self::new(raw)
    }
}

impl fmt::Display for SnippetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored piece of text with an expiry.
///
/// Reads only ever surface snippets whose `expires` is still in the future.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snippet {
    /// Database identifier.
    pub id: SnippetId,
    /// Short title, at most [`TITLE_MAX_CHARS`] code points.
    pub title: String,
    /// Body text, at most [`CONTENT_MAX_CHARS`] code points.
    pub content: String,
    /// Creation instant.
    pub created: DateTime<Utc>,
    /// Instant after which the snippet is hidden.
    pub expires: DateTime<Utc>,
}

impl Snippet {
    /// Whether the snippet is still visible at `now`.
    #[must_use]
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.expires > now
    }
}
