//! Retriever: turns the note corpus into a page of retrieval chunks.
//!
//! The retriever does paging, not scoring. Relevance is left entirely to the
//! generation backend, so the query is accepted but never used to filter or
//! order the corpus.
//!
//! Two paging modes are supported (see [`PagingMode`]):
//!
//! - **Advisory**: every note is returned on every call. The page size only
//!   decides whether a `cursor_page_<N+1>` continuation is advertised.
//! - **Sliced**: at most `page_size` notes are returned, resuming strictly
//!   after the keyset boundary carried by a `cursor_after_…` token.

use async_trait::async_trait;
use std::sync::Arc;
use teamkb_config::{PagingMode, RetrievalConfig};
use teamkb_core::cursor::Cursor;
use teamkb_core::error::{CursorError, Result};
use teamkb_core::note::sort_newest_first;
use teamkb_core::{Note, NoteStore, RetrievalChunk};
use tracing::{debug, warn};

/// Page size used when none is configured.
pub const DEFAULT_PAGE_SIZE: usize = 4;

/// One page of retrieval results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetrievalPage {
    /// Chunks to show the generation backend, newest note first
    pub chunks: Vec<RetrievalChunk>,

    /// Token for the next page, or `None` when nothing remains
    pub next_cursor: Option<String>,
}

impl RetrievalPage {
    /// No context available.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// The retrieval stage of the assistant pipeline.
///
/// Implementations may return an error; the orchestrator treats it as an
/// internal failure. [`NoteRetriever`] never does.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, query: &str, cursor: Option<&str>) -> Result<RetrievalPage>;
}

/// Retriever over a [`NoteStore`], one chunk per note.
pub struct NoteRetriever {
    store: Arc<dyn NoteStore>,
    page_size: usize,
    paging: PagingMode,
}

impl NoteRetriever {
    pub fn new(store: Arc<dyn NoteStore>) -> Self {
        Self {
            store,
            page_size: DEFAULT_PAGE_SIZE,
            paging: PagingMode::default(),
        }
    }

    pub fn from_config(store: Arc<dyn NoteStore>, config: &RetrievalConfig) -> Self {
        Self::new(store)
            .with_page_size(config.page_size)
            .with_paging(config.paging)
    }

    /// A zero page size is treated as one.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_paging(mut self, paging: PagingMode) -> Self {
        self.paging = paging;
        self
    }

    async fn fetch_page(&self, cursor: Option<&str>) -> Result<RetrievalPage> {
        let cursor = Cursor::parse_optional(cursor)?;
        let mut notes = self.store.list_all_notes().await?;
        // Stores order by their own encoding of `created_at`; settle on one order here.
        sort_newest_first(&mut notes);

        let page = match self.paging {
            PagingMode::Advisory => advisory_page(&notes, &cursor, self.page_size)?,
            PagingMode::Sliced => sliced_page(&notes, &cursor, self.page_size),
        };

        debug!(
            store = %self.store.name(),
            corpus = notes.len(),
            chunks = page.chunks.len(),
            next_cursor = ?page.next_cursor,
            "Retrieved page"
        );
        Ok(page)
    }
}

#[async_trait]
impl Retriever for NoteRetriever {
    async fn retrieve(&self, _query: &str, cursor: Option<&str>) -> Result<RetrievalPage> {
        match self.fetch_page(cursor).await {
            Ok(page) => Ok(page),
            Err(e) => {
                warn!(error = %e, cursor = ?cursor, "Retrieval failed, continuing without context");
                Ok(RetrievalPage::empty())
            }
        }
    }
}

fn advisory_page(
    notes: &[Note],
    cursor: &Cursor,
    page_size: usize,
) -> std::result::Result<RetrievalPage, CursorError> {
    let page = cursor.page().ok_or_else(|| {
        CursorError::Unrecognised(format!("{cursor} is not a page cursor"))
    })?;
    let tag = Cursor::Page(page).to_string();

    let chunks = notes
        .iter()
        .map(|note| RetrievalChunk::from_note(note, tag.as_str()))
        .collect();

    let next_cursor = if notes.len() > page_size {
        cursor.next_page().map(|c| c.to_string())
    } else {
        None
    };

    Ok(RetrievalPage {
        chunks,
        next_cursor,
    })
}

/// `notes` must already be newest first.
fn sliced_page(notes: &[Note], cursor: &Cursor, page_size: usize) -> RetrievalPage {
    let start = match cursor {
        Cursor::Page(n) => {
            let offset = (n.saturating_sub(1) as usize).saturating_mul(page_size);
            offset.min(notes.len())
        }
        Cursor::After(boundary) => notes
            .iter()
            .position(|note| boundary.precedes(&note.created_at, note.id))
            .unwrap_or(notes.len()),
    };
    let end = start.saturating_add(page_size).min(notes.len());
    let shown = &notes[start..end];
    let tag = cursor.to_string();

    let chunks = shown
        .iter()
        .map(|note| RetrievalChunk::from_note(note, tag.as_str()))
        .collect();

    let next_cursor = match shown.last() {
        Some(last) if end < notes.len() => Some(Cursor::After(last.boundary()).to_string()),
        _ => None,
    };

    RetrievalPage {
        chunks,
        next_cursor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{FailingStore, UnorderedStore, note_at};
    use teamkb_store::InMemoryNoteStore;

    fn corpus(n: i64) -> Arc<InMemoryNoteStore> {
        Arc::new(InMemoryNoteStore::with_notes((1..=n).map(note_at).collect()))
    }

    fn ids(page: &RetrievalPage) -> Vec<String> {
        page.chunks.iter().map(|c| c.id.clone()).collect()
    }

    #[tokio::test]
    async fn five_notes_advertise_a_second_page() {
        let retriever = NoteRetriever::new(corpus(5));
        let page = retriever.retrieve("anything", None).await.unwrap();

        assert_eq!(page.next_cursor.as_deref(), Some("cursor_page_2"));
        assert_eq!(page.chunks.len(), 5);
        assert!(page.chunks.iter().all(|c| c.cursor == "cursor_page_1"));
        assert_eq!(ids(&page), vec!["5", "4", "3", "2", "1"]);
    }

    #[tokio::test]
    async fn advisory_cursor_pages_increase() {
        let retriever = NoteRetriever::new(corpus(6)).with_page_size(2);

        let mut cursor: Option<String> = None;
        for expected in ["cursor_page_2", "cursor_page_3", "cursor_page_4"] {
            let page = retriever.retrieve("q", cursor.as_deref()).await.unwrap();
            assert_eq!(page.next_cursor.as_deref(), Some(expected));
            cursor = page.next_cursor;
        }

        let page = retriever.retrieve("q", Some("cursor_page_7")).await.unwrap();
        assert!(page.chunks.iter().all(|c| c.cursor == "cursor_page_7"));
    }

    #[tokio::test]
    async fn small_corpus_has_no_next_cursor() {
        let retriever = NoteRetriever::new(corpus(4));
        let page = retriever.retrieve("q", None).await.unwrap();
        assert_eq!(page.chunks.len(), 4);
        assert!(page.next_cursor.is_none());

        let empty = NoteRetriever::new(corpus(0)).retrieve("q", None).await.unwrap();
        assert_eq!(empty, RetrievalPage::empty());
    }

    #[tokio::test]
    async fn zero_page_size_acts_as_one() {
        let retriever = NoteRetriever::new(corpus(2)).with_page_size(0);
        let page = retriever.retrieve("q", None).await.unwrap();

        assert_eq!(page.chunks.len(), 2);
        assert_eq!(page.next_cursor.as_deref(), Some("cursor_page_2"));
    }

    #[tokio::test]
    async fn both_modes_reorder_unsorted_store_output() {
        let notes = vec![note_at(1), note_at(3), note_at(2)];

        let advisory = NoteRetriever::new(Arc::new(UnorderedStore(notes.clone())));
        let page = advisory.retrieve("q", None).await.unwrap();
        assert_eq!(ids(&page), vec!["3", "2", "1"]);

        let sliced = NoteRetriever::new(Arc::new(UnorderedStore(notes)))
            .with_paging(PagingMode::Sliced)
            .with_page_size(2);
        let page = sliced.retrieve("q", None).await.unwrap();
        assert_eq!(ids(&page), vec!["3", "2"]);
    }

    #[tokio::test]
    async fn store_failure_degrades_to_empty_page() {
        let retriever = NoteRetriever::new(Arc::new(FailingStore));
        let page = retriever.retrieve("q", Some("cursor_page_3")).await.unwrap();
        assert_eq!(page, RetrievalPage::empty());
    }

    #[tokio::test]
    async fn malformed_cursor_degrades_to_empty_page() {
        let retriever = NoteRetriever::new(corpus(5));
        for bad in ["page_2", "cursor_page_0", "cursor_page_x", "cursor_after_%%%"] {
            let page = retriever.retrieve("q", Some(bad)).await.unwrap();
            assert_eq!(page, RetrievalPage::empty(), "cursor {bad}");
        }
    }

    #[tokio::test]
    async fn advisory_mode_rejects_keyset_cursors() {
        let sliced = NoteRetriever::new(corpus(5)).with_paging(PagingMode::Sliced);
        let first = sliced.retrieve("q", None).await.unwrap();
        let token = first.next_cursor.unwrap();

        let advisory = NoteRetriever::new(corpus(5));
        let page = advisory.retrieve("q", Some(&token)).await.unwrap();
        assert_eq!(page, RetrievalPage::empty());
    }

    #[tokio::test]
    async fn sliced_mode_walks_the_corpus_once() {
        let retriever = NoteRetriever::new(corpus(10))
            .with_page_size(4)
            .with_paging(PagingMode::Sliced);

        let first = retriever.retrieve("q", None).await.unwrap();
        assert_eq!(ids(&first), vec!["10", "9", "8", "7"]);
        assert!(first.chunks.iter().all(|c| c.cursor == "cursor_page_1"));
        let token = first.next_cursor.clone().unwrap();
        assert!(token.starts_with("cursor_after_"));

        let second = retriever.retrieve("q", Some(&token)).await.unwrap();
        assert_eq!(ids(&second), vec!["6", "5", "4", "3"]);
        assert!(second.chunks.iter().all(|c| c.cursor == token));

        let third = retriever
            .retrieve("q", second.next_cursor.as_deref())
            .await
            .unwrap();
        assert_eq!(ids(&third), vec!["2", "1"]);
        assert!(third.next_cursor.is_none());
    }

    #[tokio::test]
    async fn sliced_mode_is_stable_under_inserts() {
        let store = corpus(6);
        let retriever = NoteRetriever::new(store.clone())
            .with_page_size(3)
            .with_paging(PagingMode::Sliced);

        let first = retriever.retrieve("q", None).await.unwrap();
        assert_eq!(ids(&first), vec!["6", "5", "4"]);

        // A newer note lands between the two calls.
        store.insert(note_at(7)).await;

        let second = retriever
            .retrieve("q", first.next_cursor.as_deref())
            .await
            .unwrap();
        assert_eq!(ids(&second), vec!["3", "2", "1"]);
        assert!(second.next_cursor.is_none());
    }

    #[tokio::test]
    async fn sliced_mode_accepts_page_cursors_as_offsets() {
        let retriever = NoteRetriever::new(corpus(5))
            .with_page_size(2)
            .with_paging(PagingMode::Sliced);

        let page = retriever.retrieve("q", Some("cursor_page_2")).await.unwrap();
        assert_eq!(ids(&page), vec!["3", "2"]);
        assert!(page.next_cursor.is_some());

        let past_end = retriever.retrieve("q", Some("cursor_page_9")).await.unwrap();
        assert!(past_end.chunks.is_empty());
        assert!(past_end.next_cursor.is_none());
    }

    #[tokio::test]
    async fn from_config_applies_settings() {
        let config = RetrievalConfig {
            page_size: 2,
            paging: PagingMode::Sliced,
        };
        let retriever = NoteRetriever::from_config(corpus(3), &config);
        let page = retriever.retrieve("q", None).await.unwrap();
        assert_eq!(page.chunks.len(), 2);
    }
}
