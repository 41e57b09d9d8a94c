pub mod relations;
pub mod session;
