//! HTTP API module for crs-web

pub mod client;
pub mod handlers;
pub mod health;
pub mod ui;

pub use client::{ClientSession, SESSION_COOKIE};
pub use handlers::{home, index, login, login_page, logout, predict, register, register_page};
pub use health::health_routes;
