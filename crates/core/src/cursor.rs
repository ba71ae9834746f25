//! Opaque continuation cursors for "show more" retrieval.
//!
//! Two token shapes share the same opaque string space:
//!
//! - `cursor_page_<N>` is a bare page index (N >= 1). It carries no
//!   knowledge of which notes were already shown, so it is only stable while
//!   the corpus ordering does not change between calls.
//! - `cursor_after_<token>` encodes the keyset boundary of the last note
//!   shown (creation time plus id, URL-safe base64). Resuming after a
//!   boundary is unaffected by notes inserted in the meantime.
//!
//! The absence of a cursor (`None`) means "start of corpus" on input and
//! "no further pages" on output; it is never represented by this type.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt;
use std::str::FromStr;

use crate::error::CursorError;

/// Prefix of page-index cursors.
pub const PAGE_PREFIX: &str = "cursor_page_";

/// Prefix of keyset cursors.
pub const AFTER_PREFIX: &str = "cursor_after_";

/// A parsed continuation cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cursor {
    /// A 1-based page index.
    Page(u64),
    /// Resume strictly after this note in newest-first order.
    After(KeysetBoundary),
}

/// The sort key of a note in newest-first order.
///
/// Notes are ordered by `created_at` descending, ties broken by `id`
/// descending, so the pair is a total order over the corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeysetBoundary {
    pub created_at: DateTime<Utc>,
    pub id: i64,
}

impl KeysetBoundary {
    /// Whether a note with the given sort key comes strictly after this
    /// boundary in newest-first order.
    pub fn precedes(&self, created_at: &DateTime<Utc>, id: i64) -> bool {
        (created_at, id) < (&self.created_at, self.id)
    }
}

impl Cursor {
    /// The cursor of the first page.
    pub fn first_page() -> Self {
        Cursor::Page(1)
    }

    /// Parse an optional incoming token; `None` means start of corpus.
    pub fn parse_optional(token: Option<&str>) -> Result<Self, CursorError> {
        match token {
            None => Ok(Self::first_page()),
            Some(t) => t.parse(),
        }
    }

    /// The page number for page cursors.
    pub fn page(&self) -> Option<u64> {
        match self {
            Cursor::Page(n) => Some(*n),
            Cursor::After(_) => None,
        }
    }

    /// The page following a page cursor.
    pub fn next_page(&self) -> Option<Cursor> {
        self.page().map(|n| Cursor::Page(n.saturating_add(1)))
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cursor::Page(n) => write!(f, "{PAGE_PREFIX}{n}"),
            Cursor::After(boundary) => {
                let raw = format!(
                    "{}|{}",
                    boundary
                        .created_at
                        .to_rfc3339_opts(SecondsFormat::Nanos, true),
                    boundary.id
                );
                write!(f, "{AFTER_PREFIX}{}", URL_SAFE_NO_PAD.encode(raw))
            }
        }
    }
}

impl FromStr for Cursor {
    type Err = CursorError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let token = token.trim();

        if let Some(page) = token.strip_prefix(PAGE_PREFIX) {
            let n: u64 = page
                .parse()
                .map_err(|_| CursorError::InvalidPage(token.to_string()))?;
            if n == 0 {
                return Err(CursorError::InvalidPage(token.to_string()));
            }
            return Ok(Cursor::Page(n));
        }

        if let Some(encoded) = token.strip_prefix(AFTER_PREFIX) {
            let invalid = || CursorError::InvalidBoundary(token.to_string());
            let bytes = URL_SAFE_NO_PAD.decode(encoded).map_err(|_| invalid())?;
            let raw = String::from_utf8(bytes).map_err(|_| invalid())?;
            let (ts, id) = raw.rsplit_once('|').ok_or_else(invalid)?;
            let created_at = DateTime::parse_from_rfc3339(ts)
                .map_err(|_| invalid())?
                .with_timezone(&Utc);
            let id: i64 = id.parse().map_err(|_| invalid())?;
            return Ok(Cursor::After(KeysetBoundary { created_at, id }));
        }

        Err(CursorError::Unrecognised(token.to_string()))
    }
}
