//! Page and form handlers
//!
//! Every user-facing failure becomes a redirect plus a notice on the next
//! page; only infrastructure failures produce an error status.

use super::client::ClientSession;
use super::ui;
use crate::auth::{NoticeLevel, Session, VerifiedLogin};
use crate::recommend::{LoginReason, PredictionOutcome};
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use tracing::{error, info, warn};

// ============================================================================
// Request Types
// ============================================================================

/// Username/password form used by both /register and /login
#[derive(Debug, Deserialize)]
pub struct CredentialsForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

// ============================================================================
// Errors
// ============================================================================

/// Infrastructure failures inside a handler
#[derive(Debug)]
pub enum ApiError {
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let ApiError::Internal(message) = self;
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": message })),
        )
            .into_response()
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        error!("Blocking task failed: {}", e);
        ApiError::Internal("Password hashing task failed".to_string())
    }
}

// ============================================================================
// Registration
// ============================================================================

/// GET / - new visitors start at registration
pub async fn home() -> Redirect {
    Redirect::to("/register")
}

/// GET /register
pub async fn register_page(client: ClientSession) -> Response {
    let notices = client.take_notices();
    client.respond(ui::register_page(&notices))
}

/// POST /register
pub async fn register(
    State(state): State<AppState>,
    client: ClientSession,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, ApiError> {
    let CredentialsForm { username, password } = form;
    if username.trim().is_empty() || password.is_empty() {
        client.notify(NoticeLevel::Danger, "Username and password are required.");
        return Ok(client.respond(Redirect::to("/register")));
    }

    let store = state.credentials.clone();
    let name = username.clone();
    let result = tokio::task::spawn_blocking(move || store.register(&name, &password)).await?;

    let target = match result {
        Ok(()) => {
            info!("Registered user {}", username);
            client.notify(NoticeLevel::Success, "Registration successful! Please log in.");
            "/login"
        }
        Err(e) => {
            warn!("{}", e);
            client.notify(
                NoticeLevel::Danger,
                "Username already exists. Please choose another.",
            );
            "/register"
        }
    };
    Ok(client.respond(Redirect::to(target)))
}

// ============================================================================
// Login / Logout
// ============================================================================

/// GET /login
pub async fn login_page(client: ClientSession) -> Response {
    let notices = client.take_notices();
    client.respond(ui::login_page(&notices))
}

/// POST /login
///
/// The password check runs on the blocking pool without holding the session;
/// only its outcome is applied afterwards.
pub async fn login(
    State(state): State<AppState>,
    client: ClientSession,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, ApiError> {
    let CredentialsForm { username, password } = form;
    let store = state.credentials.clone();
    let result =
        tokio::task::spawn_blocking(move || VerifiedLogin::check(&store, &username, &password))
            .await?;

    let target = match result {
        Ok(verified) => {
            info!("User {} logged in", verified.username());
            client.update(|session| {
                session.complete_login(verified);
                session.notify(NoticeLevel::Success, "Logged in successfully!");
            });
            "/index"
        }
        Err(_) => {
            warn!("Rejected login attempt");
            client.notify(NoticeLevel::Danger, LoginReason::InvalidCredentials.notice());
            "/login"
        }
    };
    Ok(client.respond(Redirect::to(target)))
}

/// GET /logout
pub async fn logout(client: ClientSession) -> Response {
    let previous = client.update(|session| {
        let previous = session.require_authenticated().ok().map(str::to_string);
        session.logout();
        session.notify(NoticeLevel::Success, "Logged out successfully.");
        previous
    });
    if let Some(user) = previous {
        info!("User {} logged out", user);
    }
    client.respond(Redirect::to("/login"))
}

// ============================================================================
// Prediction
// ============================================================================

/// Send an anonymous client to /login with the reason as a notice
fn redirect_to_login(client: ClientSession, reason: LoginReason) -> Response {
    client.notify(NoticeLevel::Danger, reason.notice());
    client.respond(Redirect::to("/login"))
}

fn render_index(client: ClientSession, result: Option<&str>) -> Response {
    let (user, notices) = client.update(|session| (identity(session), session.take_notices()));
    client.respond(ui::index_page(&user, &notices, result))
}

fn identity(session: &Session) -> String {
    session
        .require_authenticated()
        .map(str::to_string)
        .unwrap_or_default()
}

/// GET /index - prediction form (login required)
pub async fn index(client: ClientSession) -> Response {
    if client.snapshot().require_authenticated().is_err() {
        return redirect_to_login(client, LoginReason::NotLoggedIn);
    }
    render_index(client, None)
}

/// POST /predict - run the recommendation pipeline (login required)
pub async fn predict(
    State(state): State<AppState>,
    client: ClientSession,
    Form(fields): Form<HashMap<String, String>>,
) -> Response {
    let session = client.snapshot();
    match state.recommender.predict(&session, &fields) {
        Ok(PredictionOutcome::RedirectToLogin(reason)) => redirect_to_login(client, reason),
        Ok(outcome) => {
            let sentence = outcome.sentence();
            render_index(client, sentence.as_deref())
        }
        Err(e) => {
            warn!("Rejected prediction input: {}", e);
            client.notify(NoticeLevel::Danger, format!("Invalid input: {}", e));
            client.respond(Redirect::to("/index"))
        }
    }
}
