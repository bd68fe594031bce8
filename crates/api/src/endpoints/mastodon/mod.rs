//! Mastodon-compatible API endpoints.
//!
//! Provides compatibility with Mastodon clients by implementing
//! the account and relationship subset of the Mastodon API v1.

mod accounts;
mod follow_requests;

use axum::Router;

use crate::state::AppState;

/// Create the Mastodon API v1 router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/accounts", accounts::router())
        .merge(follow_requests::router())
}
