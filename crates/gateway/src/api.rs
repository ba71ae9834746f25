//! JSON API handlers.
//!
//! Endpoints:
//!
//! - `POST   /api/assistant`     — Ask a question, get a grounded answer
//! - `GET    /api/notes`         — List notes, newest first
//! - `POST   /api/notes`         — Create a note
//! - `GET    /api/notes/{id}`    — Get a note
//! - `PUT    /api/notes/{id}`    — Replace a note's title and content
//! - `DELETE /api/notes/{id}`    — Delete a note

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::{Instrument, error, info, info_span};

use teamkb_core::{AssistantRequest, AssistantResponse, Note, NoteDraft, StoreError};

use crate::AppState;

/// Build the `/api` router. Nest this under "/api" in the main router.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/assistant", post(assistant_handler))
        .route("/notes", get(list_notes_handler).post(create_note_handler))
        .route(
            "/notes/{id}",
            get(get_note_handler)
                .put(update_note_handler)
                .delete(delete_note_handler),
        )
        .with_state(state)
}

// ── Errors ────────────────────────────────────────────────────────────────

/// Body of every non-2xx notes response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// A store failure mapped onto an HTTP status.
pub struct ApiError(StoreError);

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            StoreError::Validation(_) => StatusCode::BAD_REQUEST,
            StoreError::NotFound(_) => StatusCode::NOT_FOUND,
            other => {
                error!(error = %other, "Note store request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (
            status,
            Json(ErrorBody {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

// ── Assistant ─────────────────────────────────────────────────────────────

/// 200 for answers and fallbacks alike; 500 only when the pipeline failed.
async fn assistant_handler(
    State(state): State<AppState>,
    Json(request): Json<AssistantRequest>,
) -> (StatusCode, Json<AssistantResponse>) {
    let request_id = uuid::Uuid::new_v4();
    let span = info_span!("assistant", %request_id);

    let outcome = async {
        info!(
            query_len = request.query.len(),
            history = request.conversation_history.len(),
            cursor = ?request.cursor,
            "Assistant request received"
        );
        state.orchestrator.handle_request(&request).await
    }
    .instrument(span)
    .await;

    let status = if outcome.is_internal_error() {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    };
    (status, Json(outcome.response))
}

// ── Notes ─────────────────────────────────────────────────────────────────

async fn list_notes_handler(State(state): State<AppState>) -> Result<Json<Vec<Note>>, ApiError> {
    Ok(Json(state.store.list_all_notes().await?))
}

async fn get_note_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Note>, ApiError> {
    let note = state.store.get(id).await?.ok_or(StoreError::NotFound(id))?;
    Ok(Json(note))
}

async fn create_note_handler(
    State(state): State<AppState>,
    Json(draft): Json<NoteDraft>,
) -> Result<(StatusCode, Json<Note>), ApiError> {
    let note = state.store.create(draft).await?;
    info!(id = note.id, "Note created");
    Ok((StatusCode::CREATED, Json(note)))
}

async fn update_note_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(draft): Json<NoteDraft>,
) -> Result<StatusCode, ApiError> {
    if state.store.update(id, draft).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(StoreError::NotFound(id).into())
    }
}

async fn delete_note_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if state.store.delete(id).await? {
        info!(id, "Note deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(StoreError::NotFound(id).into())
    }
}
