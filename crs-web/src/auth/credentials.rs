//! In-memory credential store
//!
//! Holds username → Argon2id PHC hash for the life of the process. Plaintext
//! passwords are never stored.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;

/// Registration failed because the username is taken
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Username already exists: {0}")]
pub struct DuplicateUsername(pub String);

/// Username → password hash
///
/// Writers are serialized by the lock; the existence check and the insert
/// happen under one write guard, so of two racing registrations for the same
/// name exactly one succeeds.
#[derive(Debug, Default)]
pub struct CredentialStore {
    users: RwLock<HashMap<String, String>>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a salted one-way hash of `password` under `username`
    pub fn register(&self, username: &str, password: &str) -> Result<(), DuplicateUsername> {
        // Hash outside the lock; a losing duplicate only wastes its own CPU time.
        let hash = hash_password(password);

        let mut users = self.users.write().unwrap_or_else(|e| e.into_inner());
        match users.entry(username.to_string()) {
            Entry::Occupied(_) => Err(DuplicateUsername(username.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(hash);
                Ok(())
            }
        }
    }

    /// True iff `username` exists and `password` matches its hash
    ///
    /// Unknown users and wrong passwords are indistinguishable to the caller.
    pub fn verify(&self, username: &str, password: &str) -> bool {
        let stored = {
            let users = self.users.read().unwrap_or_else(|e| e.into_inner());
            match users.get(username) {
                Some(hash) => hash.clone(),
                None => return false,
            }
        };

        match PasswordHash::new(&stored) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                tracing::error!("Stored hash for {} is unreadable: {}", username, e);
                false
            }
        }
    }

    pub fn contains(&self, username: &str) -> bool {
        self.users
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(username)
    }

    pub fn len(&self) -> usize {
        self.users.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn hash_password(password: &str) -> String {
    let salt = SaltString::generate(&mut OsRng);
    match Argon2::default().hash_password(password.as_bytes(), &salt) {
        Ok(hash) => hash.to_string(),
        // Default params and a generated salt are always accepted.
        Err(e) => unreachable!("argon2 rejected default parameters: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_verify_after_register() {
        let store = CredentialStore::new();
        store.register("asha", "monsoon-2024").unwrap();

        assert!(store.verify("asha", "monsoon-2024"));
        assert!(!store.verify("asha", "monsoon-2025"));
        assert!(!store.verify("asha", ""));
    }

    #[test]
    fn test_unknown_user_is_false_not_error() {
        let store = CredentialStore::new();
        assert!(!store.verify("nobody", "anything"));
    }

    #[test]
    fn test_plaintext_is_not_stored() {
        let store = CredentialStore::new();
        store.register("ravi", "paddy-field").unwrap();

        let users = store.users.read().unwrap();
        let stored = users.get("ravi").unwrap();
        assert!(!stored.contains("paddy-field"));
        assert!(stored.starts_with("$argon2id$"));
    }

    #[test]
    fn test_duplicate_keeps_single_entry_and_first_password() {
        let store = CredentialStore::new();
        store.register("meera", "first").unwrap();

        let err = store.register("meera", "second").unwrap_err();
        assert_eq!(err, DuplicateUsername("meera".to_string()));
        assert_eq!(store.len(), 1);
        assert!(store.verify("meera", "first"));
        assert!(!store.verify("meera", "second"));
    }

    #[test]
    fn test_racing_registrations_exactly_one_wins() {
        let store = Arc::new(CredentialStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || store.register("kiran", &format!("pw-{i}")).is_ok())
            })
            .collect();

        let wins = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();

        assert_eq!(wins, 1);
        assert_eq!(store.len(), 1);
        assert!(store.contains("kiran"));
    }
}
