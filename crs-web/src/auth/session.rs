//! Per-client sessions
//!
//! A `Session` is the authentication state machine for one client:
//!
//! ```text
//!   Anonymous --login(ok)--> Authenticated(user)
//!   Authenticated(user) --logout--> Anonymous
//! ```
//!
//! `SessionRegistry` maps opaque session ids (random UUIDs carried in a
//! cookie) to sessions. Sessions are only changed in place under the registry
//! lock, so overlapping requests from one client never overwrite each other.
//! Slow work such as password verification happens outside the lock; only its
//! result is applied.

use super::credentials::CredentialStore;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use thiserror::Error;
use uuid::Uuid;

/// Login attempt did not match a registered user
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Invalid credentials")]
pub struct InvalidCredentials;

/// Protected operation attempted without a logged-in identity
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Not logged in")]
pub struct Unauthenticated;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Anonymous,
    Authenticated(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Danger,
}

impl NoticeLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoticeLevel::Success => "success",
            NoticeLevel::Danger => "danger",
        }
    }
}

/// One-shot message shown on the next rendered page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// A username/password pair that matched the credential store
///
/// The only way for a `Session` to become authenticated.
#[derive(Debug)]
pub struct VerifiedLogin {
    username: String,
}

impl VerifiedLogin {
    /// Check credentials without touching any session
    pub fn check(
        store: &CredentialStore,
        username: &str,
        password: &str,
    ) -> Result<Self, InvalidCredentials> {
        if !store.verify(username, password) {
            return Err(InvalidCredentials);
        }
        Ok(Self {
            username: username.to_string(),
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    state: AuthState,
    notices: Vec<Notice>,
    last_seen: Instant,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: AuthState::Anonymous,
            notices: Vec::new(),
            last_seen: Instant::now(),
        }
    }

    /// Authenticate against `store`
    ///
    /// On failure the current state is left as it was.
    pub fn login(
        &mut self,
        store: &CredentialStore,
        username: &str,
        password: &str,
    ) -> Result<(), InvalidCredentials> {
        let verified = VerifiedLogin::check(store, username, password)?;
        self.complete_login(verified);
        Ok(())
    }

    /// Apply a credential check that was run separately
    pub fn complete_login(&mut self, login: VerifiedLogin) {
        self.state = AuthState::Authenticated(login.username);
    }

    pub fn logout(&mut self) {
        self.state = AuthState::Anonymous;
    }

    /// Gate for every protected operation
    pub fn require_authenticated(&self) -> Result<&str, Unauthenticated> {
        match &self.state {
            AuthState::Authenticated(identity) => Ok(identity.as_str()),
            AuthState::Anonymous => Err(Unauthenticated),
        }
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.notices.push(Notice {
            level,
            message: message.into(),
        });
    }

    /// Drain pending notices
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_seen)
    }
}

/// All live sessions, keyed by session id
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<Uuid, Session>>,
    idle_timeout: Duration,
}

impl SessionRegistry {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            idle_timeout,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, Session>> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Live session id for this client, creating a fresh anonymous session
    /// when `id` is absent, unknown or expired
    ///
    /// Returns `(id, is_new)`. Unknown and expired ids are never reused, so a
    /// client cannot pick its own session id.
    pub fn resolve(&self, id: Option<Uuid>) -> (Uuid, bool) {
        let now = Instant::now();
        let mut sessions = self.lock();

        if let Some(id) = id {
            let fresh = sessions
                .get(&id)
                .map(|session| session.idle_for(now) <= self.idle_timeout);
            match fresh {
                Some(true) => {
                    if let Some(session) = sessions.get_mut(&id) {
                        session.last_seen = now;
                    }
                    return (id, false);
                }
                Some(false) => {
                    sessions.remove(&id);
                }
                None => {}
            }
        }

        let id = Uuid::new_v4();
        sessions.insert(id, Session::new());
        (id, true)
    }

    /// Run `f` on the stored session for `id` while holding the registry lock
    ///
    /// A session purged since `resolve` is recreated as anonymous.
    pub fn update<R>(&self, id: Uuid, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut sessions = self.lock();
        let session = sessions.entry(id).or_default();
        session.last_seen = Instant::now();
        f(session)
    }

    /// Point-in-time copy of the session for read-only work
    pub fn snapshot(&self, id: Uuid) -> Session {
        self.update(id, |session| session.clone())
    }

    /// Drop sessions idle longer than the timeout; returns how many were removed
    pub fn purge_idle(&self) -> usize {
        let now = Instant::now();
        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|_, session| session.idle_for(now) <= self.idle_timeout);
        before - sessions.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn store_with(username: &str, password: &str) -> CredentialStore {
        let store = CredentialStore::new();
        store.register(username, password).unwrap();
        store
    }

    #[test]
    fn test_fresh_session_is_anonymous() {
        let session = Session::new();
        assert_eq!(session.state(), &AuthState::Anonymous);
        assert_eq!(session.require_authenticated(), Err(Unauthenticated));
    }

    #[test]
    fn test_login_logout_cycle() {
        let store = store_with("asha", "monsoon");
        let mut session = Session::new();

        session.login(&store, "asha", "monsoon").unwrap();
        assert_eq!(session.require_authenticated(), Ok("asha"));

        session.logout();
        assert_eq!(session.require_authenticated(), Err(Unauthenticated));

        session.login(&store, "asha", "monsoon").unwrap();
        assert_eq!(session.require_authenticated(), Ok("asha"));
    }

    #[test]
    fn test_failed_login_keeps_state() {
        let store = store_with("asha", "monsoon");
        let mut session = Session::new();

        assert_eq!(session.login(&store, "asha", "drought"), Err(InvalidCredentials));
        assert_eq!(session.state(), &AuthState::Anonymous);

        session.login(&store, "asha", "monsoon").unwrap();
        assert_eq!(session.login(&store, "ghost", "x"), Err(InvalidCredentials));
        assert_eq!(session.require_authenticated(), Ok("asha"));
    }

    #[test]
    fn test_logout_when_anonymous_is_harmless() {
        let mut session = Session::new();
        session.logout();
        assert_eq!(session.state(), &AuthState::Anonymous);
    }

    #[test]
    fn test_notices_drain_once() {
        let mut session = Session::new();
        session.notify(NoticeLevel::Success, "Logged in successfully!");
        session.notify(NoticeLevel::Danger, "Something else");

        let notices = session.take_notices();
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[0].level, NoticeLevel::Success);
        assert!(session.take_notices().is_empty());
    }

    #[test]
    fn test_verified_login_leaves_sessions_alone_until_applied() {
        let store = store_with("asha", "monsoon");
        let mut session = Session::new();

        assert_eq!(
            VerifiedLogin::check(&store, "asha", "drought").unwrap_err(),
            InvalidCredentials
        );
        let verified = VerifiedLogin::check(&store, "asha", "monsoon").unwrap();
        assert_eq!(verified.username(), "asha");
        assert_eq!(session.state(), &AuthState::Anonymous);

        session.complete_login(verified);
        assert_eq!(session.require_authenticated(), Ok("asha"));
    }

    #[test]
    fn test_registry_isolates_clients() {
        let store = store_with("asha", "monsoon");
        let registry = SessionRegistry::new(Duration::from_secs(60));

        let (alice_id, is_new) = registry.resolve(None);
        assert!(is_new);
        registry
            .update(alice_id, |s| s.login(&store, "asha", "monsoon"))
            .unwrap();

        let (bob_id, _) = registry.resolve(None);
        assert_ne!(alice_id, bob_id);
        assert_eq!(
            registry.snapshot(bob_id).require_authenticated(),
            Err(Unauthenticated)
        );

        let (same_id, is_new) = registry.resolve(Some(alice_id));
        assert_eq!(same_id, alice_id);
        assert!(!is_new);
        assert_eq!(registry.snapshot(alice_id).require_authenticated(), Ok("asha"));
    }

    #[test]
    fn test_unknown_id_gets_fresh_id() {
        let registry = SessionRegistry::new(Duration::from_secs(60));
        let forged = Uuid::new_v4();
        let (id, is_new) = registry.resolve(Some(forged));
        assert_ne!(id, forged);
        assert!(is_new);
        assert_eq!(registry.snapshot(id).state(), &AuthState::Anonymous);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_idle_sessions_expire() {
        let registry = SessionRegistry::new(Duration::ZERO);
        let (id, _) = registry.resolve(None);
        std::thread::sleep(Duration::from_millis(5));

        let (new_id, is_new) = registry.resolve(Some(id));
        assert!(is_new);
        assert_ne!(new_id, id);
        assert_eq!(registry.len(), 1);

        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(registry.purge_idle(), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_concurrent_updates_to_one_session_are_all_kept() {
        let registry = Arc::new(SessionRegistry::new(Duration::from_secs(60)));
        let (id, _) = registry.resolve(None);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    registry.update(id, |s| s.notify(NoticeLevel::Success, format!("notice {i}")))
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(registry.update(id, |s| s.take_notices()).len(), 8);
    }

    #[test]
    fn test_failed_check_does_not_undo_logout() {
        let store = store_with("asha", "monsoon");
        let registry = SessionRegistry::new(Duration::from_secs(60));
        let (id, _) = registry.resolve(None);
        registry
            .update(id, |s| s.login(&store, "asha", "monsoon"))
            .unwrap();

        // A second request from the same client is mid-verification
        let pending = VerifiedLogin::check(&store, "asha", "drought");
        registry.update(id, |s| s.logout());
        if let Ok(verified) = pending {
            registry.update(id, |s| s.complete_login(verified));
        }

        assert_eq!(registry.snapshot(id).state(), &AuthState::Anonymous);
    }
}
