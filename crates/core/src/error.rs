//! Error types for the TeamKB domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all TeamKB operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Note store errors ---
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // --- Generation backend errors ---
    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    // --- Pagination errors ---
    #[error("Cursor error: {0}")]
    Cursor(#[from] CursorError),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Note store unavailable: {0}")]
    Unavailable(String),

    #[error("Corrupt note record: {0}")]
    Corrupt(String),

    #[error("Note not found: {0}")]
    NotFound(i64),

    #[error("Invalid note: {0}")]
    Validation(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}

#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Backend returned status {status_code}: {message}")]
    Status { status_code: u16, message: String },

    #[error("Malformed response envelope: {0}")]
    MalformedEnvelope(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CursorError {
    #[error("Unrecognised cursor token: {0}")]
    Unrecognised(String),

    #[error("Invalid page number in cursor: {0}")]
    InvalidPage(String),

    #[error("Invalid keyset boundary in cursor: {0}")]
    InvalidBoundary(String),
}
