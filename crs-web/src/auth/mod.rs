//! Access control: credential store and per-client sessions

pub mod credentials;
pub mod session;

pub use credentials::{CredentialStore, DuplicateUsername};
pub use session::{
    AuthState, InvalidCredentials, Notice, NoticeLevel, Session, SessionRegistry, Unauthenticated,
    VerifiedLogin,
};
