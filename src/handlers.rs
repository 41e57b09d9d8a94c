pub mod auth;
pub mod relations;
