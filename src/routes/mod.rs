//! Route modules for the Scroll Portal server

pub mod health;
pub mod portal;

use axum::Router;

use crate::state::AppState;

/// Assemble every route onto one router. Layers (tracing, CORS) are added
/// by the binary so tests can drive the bare router.
pub fn router() -> Router<AppState> {
    Router::new().merge(portal::router()).merge(health::router())
}
