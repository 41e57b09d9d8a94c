//! Session and toggle-relation core of a video platform backend.
//!
//! Login issues a short-lived access token and a long-lived refresh token;
//! only the refresh token is tracked server-side (as a digest on the user
//! record) and it is rotated on every refresh. Likes and subscriptions are
//! toggle relations with at most one edge per (actor, target, kind).

pub mod auth;
pub mod config;
pub mod dto;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod openapi;
pub mod password;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

pub use config::Config;
pub use errors::AppError;
pub use state::AppState;
