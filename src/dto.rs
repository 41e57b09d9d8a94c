pub mod auth;
pub mod relation;
