use crate::state::AppState;
use axum::Router;

pub mod claims;
pub mod dto;
pub(crate) mod extractors;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod services;

pub use extractors::{require_auth, AuthUser};

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::auth_routes())
}

#[cfg(test)]
mod handler_tests;
