//! Session cookie extractor
//!
//! Every page handler takes a `ClientSession`. It carries only the session id;
//! all reads and writes go through the registry, so concurrent requests from
//! the same client see each other's changes. `ClientSession::respond` sets the
//! cookie for new clients.

use crate::auth::{Notice, NoticeLevel, Session, SessionRegistry};
use crate::AppState;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
};
use std::convert::Infallible;
use std::sync::Arc;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "crs_session";

pub struct ClientSession {
    id: Uuid,
    is_new: bool,
    registry: Arc<SessionRegistry>,
}

impl ClientSession {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Change the stored session in place
    pub fn update<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        self.registry.update(self.id, f)
    }

    pub fn snapshot(&self) -> Session {
        self.registry.snapshot(self.id)
    }

    pub fn notify(&self, level: NoticeLevel, message: impl Into<String>) {
        self.update(|session| session.notify(level, message));
    }

    pub fn take_notices(&self) -> Vec<Notice> {
        self.update(Session::take_notices)
    }

    /// Attach the cookie if the client needs one
    pub fn respond(self, response: impl IntoResponse) -> Response {
        let mut response = response.into_response();
        if self.is_new {
            let cookie = format!(
                "{}={}; Path=/; HttpOnly; SameSite=Lax",
                SESSION_COOKIE, self.id
            );
            if let Ok(value) = HeaderValue::from_str(&cookie) {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
        }
        response
    }
}

#[async_trait]
impl FromRequestParts<AppState> for ClientSession {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let (id, is_new) = state.sessions.resolve(session_id(&parts.headers));
        Ok(Self {
            id,
            is_new,
            registry: Arc::clone(&state.sessions),
        })
    }
}

/// Session id from the Cookie header(s), if present and well-formed
pub fn session_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_among_other_cookies() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("theme=dark; crs_session={id}; lang=en")).unwrap(),
        );
        assert_eq!(session_id(&headers), Some(id));
    }

    #[test]
    fn test_missing_or_garbage_cookie() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_id(&headers), None);

        headers.insert(header::COOKIE, HeaderValue::from_static("crs_session=admin"));
        assert_eq!(session_id(&headers), None);
    }
}
