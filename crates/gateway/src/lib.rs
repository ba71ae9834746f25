//! HTTP API gateway for TeamKB.
//!
//! Exposes the assistant endpoint, the notes CRUD surface, and a health
//! check. Built on Axum.

pub mod api;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::{Router, response::Json, routing::get};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};

use teamkb_assistant::{NoteRetriever, Orchestrator};
use teamkb_config::AppConfig;
use teamkb_core::NoteStore;
use teamkb_providers::OpenAiCompatGenerator;

/// Request bodies above this size are rejected.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Shared application state for the gateway.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub store: Arc<dyn NoteStore>,
}

impl AppState {
    pub fn new(orchestrator: Arc<Orchestrator>, store: Arc<dyn NoteStore>) -> Self {
        Self {
            orchestrator,
            store,
        }
    }

    /// Open the note store and wire the assistant pipeline from configuration.
    pub async fn from_config(config: &AppConfig) -> teamkb_core::Result<Self> {
        let store = teamkb_store::open_from_config(&config.store).await?;
        let generator = OpenAiCompatGenerator::from_config(&config.generation)?;
        info!(
            backend = %generator.base_url(),
            model = %generator.model(),
            "Generation backend configured"
        );

        let retriever = NoteRetriever::from_config(store.clone(), &config.retrieval);
        let orchestrator = Orchestrator::new(Arc::new(retriever), Arc::new(generator));
        Ok(Self::new(Arc::new(orchestrator), store))
    }
}

/// Build the full router.
///
/// Layers applied:
/// - CORS restricted to the configured origins (any origin when empty)
/// - Request body size limit (1 MB)
/// - HTTP trace logging
pub fn build_router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .nest("/api", api::api_router(state))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors_layer(cors_origins))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(Duration::from_secs(3600));

    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let state = AppState::from_config(&config).await?;
    let app = build_router(state, &config.gateway.cors_origins);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".into(),
        timestamp: chrono::Utc::now(),
    })
}
