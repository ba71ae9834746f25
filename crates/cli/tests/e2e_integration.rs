//! End-to-end integration tests for the TeamKB assistant.
//!
//! These tests exercise the full pipeline from an HTTP request to the
//! gateway, through retrieval, prompt assembly, and a real HTTP call to a
//! fake chat-completions backend, to the validated JSON answer.

use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use http_body_util::BodyExt;
use tower::ServiceExt;

use teamkb_assistant::{NoteRetriever, Orchestrator};
use teamkb_config::PagingMode;
use teamkb_core::response::{FALLBACK_ANSWER, FALLBACK_FOLLOW_UP};
use teamkb_core::{AssistantResponse, NoteDraft, NoteStore};
use teamkb_gateway::{AppState, build_router};
use teamkb_providers::OpenAiCompatGenerator;
use teamkb_store::InMemoryNoteStore;

// ── Fake backend ─────────────────────────────────────────────────────────

/// Requests seen by the fake backend, as raw JSON bodies.
type Seen = Arc<Mutex<Vec<serde_json::Value>>>;

/// Start a chat-completions backend that always answers with `content`.
async fn spawn_backend(content: &'static str) -> (String, Seen) {
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route(
            "/v1/chat/completions",
            post(
                move |State(seen): State<Seen>, Json(body): Json<serde_json::Value>| async move {
                    seen.lock().unwrap().push(body);
                    Json(serde_json::json!({
                        "model": "llama-3-8b",
                        "choices": [{ "index": 0, "message": { "role": "assistant", "content": content } }]
                    }))
                },
            ),
        )
        .with_state(seen.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/v1"), seen)
}

async fn seeded_store(count: usize) -> Arc<InMemoryNoteStore> {
    let store = Arc::new(InMemoryNoteStore::new());
    for i in 1..=count {
        store
            .create(NoteDraft::new(
                format!("Runbook {i}"),
                Some(format!("Step {i}: restart the worker")),
            ))
            .await
            .unwrap();
        // Distinct creation times keep the newest-first order unambiguous.
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }
    store
}

fn app(store: Arc<InMemoryNoteStore>, backend_url: &str, paging: PagingMode) -> Router {
    let generator = OpenAiCompatGenerator::new(reqwest::Client::new(), backend_url, "llama-3-8b");
    let retriever = NoteRetriever::new(store.clone()).with_paging(paging);
    let orchestrator = Orchestrator::new(Arc::new(retriever), Arc::new(generator));
    build_router(AppState::new(Arc::new(orchestrator), store), &[])
}

async fn ask(app: &Router, body: serde_json::Value) -> (StatusCode, AssistantResponse) {
    let request = Request::builder()
        .method("POST")
        .uri("/api/assistant")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

// ── Tests ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn grounded_answer_flows_through_the_whole_pipeline() {
    let (url, seen) = spawn_backend(
        r#"{"answer":"Restart the worker [doc:5,cursor:cursor_page_1]",
            "citations":["doc:5,cursor:cursor_page_1","doc:77,cursor:cursor_page_1"],
            "next_cursor":"cursor_page_42",
            "follow_up":"Ask about escalation"}"#,
    )
    .await;
    let app = app(seeded_store(5).await, &url, PagingMode::Advisory);

    let (status, answer) = ask(
        &app,
        serde_json::json!({
            "query": "How do I fix a stuck worker?",
            "conversationHistory": ["hello"],
            "cursor": null
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(answer.answer, "Restart the worker [doc:5,cursor:cursor_page_1]");
    assert_eq!(answer.citations, vec!["doc:5,cursor:cursor_page_1"]);
    assert_eq!(answer.next_cursor.as_deref(), Some("cursor_page_2"));
    assert_eq!(answer.follow_up, "Ask about escalation");

    let requests = seen.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let body = &requests[0];
    assert_eq!(body["model"], "llama-3-8b");
    assert_eq!(body["temperature"], 0.0);
    assert_eq!(body["max_tokens"], 512);
    assert_eq!(body["messages"][0]["role"], "system");
    let prompt = body["messages"][1]["content"].as_str().unwrap();
    assert!(prompt.contains("Document 5 (Source: Runbook 5, Cursor: cursor_page_1):"));
    assert!(prompt.contains("Document 1 (Source: Runbook 1, Cursor: cursor_page_1):"));
    assert!(prompt.contains("User 1: hello"));
    assert!(prompt.contains("RETRIEVER_NEXT_CURSOR:\ncursor_page_2"));
}

#[tokio::test]
async fn malformed_backend_output_falls_back_with_cursor() {
    let (url, _) = spawn_backend("This is not valid JSON").await;
    let app = app(seeded_store(5).await, &url, PagingMode::Advisory);

    let (status, answer) = ask(
        &app,
        serde_json::json!({ "query": "more", "conversationHistory": [], "cursor": "cursor_page_2" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        answer,
        AssistantResponse {
            answer: FALLBACK_ANSWER.into(),
            citations: vec![],
            next_cursor: Some("cursor_page_3".into()),
            follow_up: FALLBACK_FOLLOW_UP.into(),
        }
    );
}

#[tokio::test]
async fn unreachable_backend_still_answers() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let app = app(
        seeded_store(2).await,
        &format!("http://{addr}/v1"),
        PagingMode::Advisory,
    );

    let (status, answer) = ask(&app, serde_json::json!({ "query": "anything" })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(answer, AssistantResponse::fallback(None));
}

#[tokio::test]
async fn empty_corpus_prompt_says_so() {
    let (url, seen) = spawn_backend(
        r#"{"answer":"I don't know","citations":[],"next_cursor":null,"follow_up":"Add a runbook"}"#,
    )
    .await;
    let app = app(Arc::new(InMemoryNoteStore::new()), &url, PagingMode::Advisory);

    let (status, answer) = ask(&app, serde_json::json!({ "query": "Who is on call?" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(answer.answer, "I don't know");
    assert!(answer.next_cursor.is_none());

    let requests = seen.lock().unwrap();
    let prompt = requests[0]["messages"][1]["content"].as_str().unwrap();
    assert!(prompt.contains("No documents retrieved"));
    assert!(prompt.contains("No previous conversation"));
}

#[tokio::test]
async fn sliced_paging_shows_each_note_once() {
    let (url, seen) = spawn_backend(
        r#"{"answer":"ok","citations":[],"follow_up":"more?"}"#,
    )
    .await;
    let store = seeded_store(5).await;
    let app = app(store.clone(), &url, PagingMode::Sliced);

    let (_, first) = ask(&app, serde_json::json!({ "query": "list runbooks" })).await;
    let cursor = first.next_cursor.clone().unwrap();
    assert!(cursor.starts_with("cursor_after_"));

    // A note written between pages must not shift the second page.
    store
        .create(NoteDraft::new("Brand new", Some("fresh".into())))
        .await
        .unwrap();

    let (_, second) = ask(
        &app,
        serde_json::json!({ "query": "more", "cursor": cursor }),
    )
    .await;
    assert!(second.next_cursor.is_none());

    let requests = seen.lock().unwrap();
    let first_prompt = requests[0]["messages"][1]["content"].as_str().unwrap();
    let second_prompt = requests[1]["messages"][1]["content"].as_str().unwrap();
    for i in 2..=5 {
        assert!(first_prompt.contains(&format!("Document {i} ")));
    }
    assert!(second_prompt.contains("Document 1 "));
    assert!(!second_prompt.contains("Brand new"));
    assert!(!second_prompt.contains("Document 2 "));
}

#[tokio::test]
async fn notes_written_over_http_are_retrieved() {
    let (url, seen) = spawn_backend(
        r#"{"answer":"Fridays are frozen","citations":["doc:1,cursor:cursor_page_1"],"follow_up":"f"}"#,
    )
    .await;
    let store = Arc::new(InMemoryNoteStore::new());
    let app = app(store.clone(), &url, PagingMode::Advisory);

    let create = Request::builder()
        .method("POST")
        .uri("/api/notes")
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::json!({ "title": "Deploy policy", "content": "No deploys on Friday" })
                .to_string(),
        ))
        .unwrap();
    let response = app.clone().oneshot(create).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(store.count().await.unwrap(), 1);

    let (status, answer) = ask(&app, serde_json::json!({ "query": "Can I deploy Friday?" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(answer.citations, vec!["doc:1,cursor:cursor_page_1"]);

    let requests = seen.lock().unwrap();
    let prompt = requests[0]["messages"][1]["content"].as_str().unwrap();
    assert!(prompt.contains("Document 1 (Source: Deploy policy, Cursor: cursor_page_1):\nNo deploys on Friday"));
}
