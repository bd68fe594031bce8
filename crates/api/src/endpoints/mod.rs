//! API endpoints.

mod assets;
pub mod mastodon;

use axum::Router;

use crate::state::AppState;

/// Create the API router.
///
/// Mastodon endpoints live under `/api/v1`; the placeholder image under
/// `/static`.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/api/v1", mastodon::router())
        .merge(assets::router())
}
