//! Mastodon follow requests API.

use axum::{Json, Router, extract::State, routing::get};
use mastokey_common::AppResult;
use mastokey_core::mastodon::Account;

use crate::extractors::{BearerToken, Origin, QueryParams, TargetServer};
use crate::state::AppState;

/// GET /api/v1/follow_requests - Accounts waiting for the caller's approval.
async fn list(
    BearerToken(token): BearerToken,
    TargetServer(server): TargetServer,
    Origin(origin): Origin,
    State(state): State<AppState>,
    QueryParams(params): QueryParams,
) -> AppResult<Json<Vec<Account>>> {
    let pagination = params.pagination()?;
    let accounts = state
        .relationship_service
        .follow_requests(&server, &origin, &token, &pagination)
        .await?;
    Ok(Json(accounts))
}

/// Create the follow requests router.
pub fn router() -> Router<AppState> {
    Router::new().route("/follow_requests", get(list))
}
