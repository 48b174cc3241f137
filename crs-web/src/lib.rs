//! crs-web library - Crop Recommendation Service
//!
//! Session-gated web front end for the crop classifier: registration, login,
//! and the prediction form.

use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod auth;
pub mod recommend;

use auth::{CredentialStore, SessionRegistry};
use recommend::Recommender;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Registered users (process lifetime)
    pub credentials: Arc<CredentialStore>,
    /// Per-client sessions
    pub sessions: Arc<SessionRegistry>,
    /// Loaded pipeline and classifier (read-only)
    pub recommender: Recommender,
}

impl AppState {
    /// Create new application state with an empty credential store
    pub fn new(recommender: Recommender, session_idle_timeout: Duration) -> Self {
        Self {
            credentials: Arc::new(CredentialStore::new()),
            sessions: Arc::new(SessionRegistry::new(session_idle_timeout)),
            recommender,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    let pages = Router::new()
        .route("/", get(api::home))
        .route("/register", get(api::register_page).post(api::register))
        .route("/login", get(api::login_page).post(api::login))
        .route("/logout", get(api::logout))
        .route("/index", get(api::index))
        .route("/predict", post(api::predict));

    Router::new()
        .merge(pages)
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
