// src/api/mod.rs
pub mod auth;
pub mod handlers;
pub mod multipart;
pub mod routes;
pub mod state;

pub use routes::configure_routes;
pub use state::AppState;
