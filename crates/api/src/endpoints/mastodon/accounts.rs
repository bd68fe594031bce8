//! Mastodon accounts API.
//!
//! Account lookup, profile updates, status listings and the follow graph.

use axum::{
    Json, Router,
    extract::{FromRequest, Multipart, Path, Request, State},
    http::{HeaderMap, header::CONTENT_TYPE},
    routing::{get, patch, post},
};
use bytes::Bytes;
use mastokey_common::{AppError, AppResult};
use mastokey_core::fields::decode_profile_fields;
use mastokey_core::mastodon::{Account, CredentialAccount, Relationship, Status};
use mastokey_core::services::UpdateCredentialsInput;
use mastokey_misskey::UploadFile;
use tracing::debug;

use crate::extractors::{BearerToken, MaybeBearerToken, Origin, QueryParams, TargetServer};
use crate::params::Params;
use crate::state::AppState;

/// GET /api/v1/accounts/verify_credentials - Get the caller's account.
async fn verify_credentials(
    BearerToken(token): BearerToken,
    TargetServer(server): TargetServer,
    State(state): State<AppState>,
) -> AppResult<Json<CredentialAccount>> {
    let account = state
        .account_service
        .verify_credentials(&server, &token)
        .await?;
    Ok(Json(account))
}

/// PATCH /api/v1/accounts/update_credentials - Update the caller's profile.
///
/// Accepts `multipart/form-data`, `application/x-www-form-urlencoded` or
/// `application/json`. Query parameters are read too; body values override
/// them. A non-empty body of any other type is rejected.
async fn update_credentials(
    BearerToken(token): BearerToken,
    TargetServer(server): TargetServer,
    State(state): State<AppState>,
    QueryParams(mut params): QueryParams,
    request: Request,
) -> AppResult<Json<CredentialAccount>> {
    let mut input = UpdateCredentialsInput::default();

    let body_type = media_type(request.headers());

    if body_type.as_deref() == Some("multipart/form-data") {
        let mut multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(format!("Invalid multipart data: {e}")))?
        {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(str::to_string);

            match (name.as_str(), file_name) {
                ("avatar" | "header", Some(file_name)) => {
                    let content_type = field.content_type().map(str::to_string);
                    let data = field.bytes().await.map_err(|e| {
                        AppError::BadRequest(format!("Failed to read file: {e}"))
                    })?;
                    let file = UploadFile {
                        file_name,
                        content_type,
                        data,
                    };
                    if name == "avatar" {
                        input.avatar = Some(file);
                    } else {
                        input.header = Some(file);
                    }
                }
                _ => {
                    let value = field.text().await.map_err(|e| {
                        AppError::BadRequest(format!("Invalid multipart data: {e}"))
                    })?;
                    params.push(name, value);
                }
            }
        }
    } else {
        let body = Bytes::from_request(request, &state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        match body_type.as_deref() {
            Some("application/x-www-form-urlencoded") => {
                params.extend(Params::from_urlencoded(&body));
            }
            Some("application/json") => params.extend(Params::from_json(&body)?),
            _ if body.is_empty() => {}
            other => {
                return Err(AppError::BadRequest(format!(
                    "Unsupported Content-Type: {}",
                    other.unwrap_or("none")
                )));
            }
        }
    }

    input.display_name = params.string("display_name");
    input.note = params.string("note");
    input.locked = params.bool("locked")?;
    input.bot = params.bool("bot")?;
    input.discoverable = params.bool("discoverable")?;
    input.source_privacy = params.string("source[privacy]");
    input.source_sensitive = params.bool("source[sensitive]")?;
    input.source_language = params.string("source[language]");
    input.fields = decode_profile_fields(params.pairs());

    debug!(
        server = %server,
        fields = input.fields.len(),
        avatar = input.avatar.is_some(),
        header = input.header.is_some(),
        "Updating credentials"
    );

    let account = state
        .account_service
        .update_credentials(&server, &token, input)
        .await?;
    Ok(Json(account))
}

/// GET /api/v1/accounts/lookup?acct= - Find an account by handle.
async fn lookup(
    TargetServer(server): TargetServer,
    Origin(origin): Origin,
    State(state): State<AppState>,
    QueryParams(params): QueryParams,
) -> AppResult<Json<Account>> {
    let acct = params.get("acct").unwrap_or_default();
    let account = state.account_service.lookup(&server, &origin, acct).await?;
    Ok(Json(account))
}

/// GET /api/v1/accounts/:id - Get an account by id.
async fn get_account(
    MaybeBearerToken(token): MaybeBearerToken,
    TargetServer(server): TargetServer,
    Origin(origin): Origin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Account>> {
    let account = state
        .account_service
        .get(&server, &origin, token.as_deref(), &id)
        .await?;
    Ok(Json(account))
}

/// GET /api/v1/accounts/:id/statuses - List an account's statuses.
async fn statuses(
    MaybeBearerToken(token): MaybeBearerToken,
    TargetServer(server): TargetServer,
    State(state): State<AppState>,
    Path(id): Path<String>,
    QueryParams(params): QueryParams,
) -> AppResult<Json<Vec<Status>>> {
    let query = params.statuses_query()?;
    let statuses = state
        .account_service
        .statuses(&server, token.as_deref(), &id, &query)
        .await?;
    Ok(Json(statuses))
}

/// GET /api/v1/accounts/:id/followers - List an account's followers.
async fn followers(
    MaybeBearerToken(token): MaybeBearerToken,
    TargetServer(server): TargetServer,
    Origin(origin): Origin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    QueryParams(params): QueryParams,
) -> AppResult<Json<Vec<Account>>> {
    let pagination = params.pagination()?;
    let accounts = state
        .relationship_service
        .followers(&server, &origin, token.as_deref(), &id, &pagination)
        .await?;
    Ok(Json(accounts))
}

/// GET /api/v1/accounts/:id/following - List accounts an account follows.
async fn following(
    MaybeBearerToken(token): MaybeBearerToken,
    TargetServer(server): TargetServer,
    Origin(origin): Origin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    QueryParams(params): QueryParams,
) -> AppResult<Json<Vec<Account>>> {
    let pagination = params.pagination()?;
    let accounts = state
        .relationship_service
        .following(&server, &origin, token.as_deref(), &id, &pagination)
        .await?;
    Ok(Json(accounts))
}

/// GET /api/v1/accounts/relationships?id[]= - Relationships with accounts.
async fn relationships(
    BearerToken(token): BearerToken,
    TargetServer(server): TargetServer,
    State(state): State<AppState>,
    QueryParams(params): QueryParams,
) -> AppResult<Json<Vec<Relationship>>> {
    let ids = params.all(&["id[]", "id"]);
    let relationships = state
        .relationship_service
        .relationships(&server, &token, &ids)
        .await?;
    Ok(Json(relationships))
}

/// POST /api/v1/accounts/:id/follow - Follow an account.
async fn follow(
    BearerToken(token): BearerToken,
    TargetServer(server): TargetServer,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Relationship>> {
    let relationship = state
        .relationship_service
        .follow(&server, &token, &id)
        .await?;
    Ok(Json(relationship))
}

/// POST /api/v1/accounts/:id/unfollow - Unfollow an account.
async fn unfollow(
    BearerToken(token): BearerToken,
    TargetServer(server): TargetServer,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Relationship>> {
    let relationship = state
        .relationship_service
        .unfollow(&server, &token, &id)
        .await?;
    Ok(Json(relationship))
}

/// The lowercased media type of the request body, without parameters.
fn media_type(headers: &HeaderMap) -> Option<String> {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| !v.is_empty())
}

/// Create the accounts router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/verify_credentials", get(verify_credentials))
        .route("/update_credentials", patch(update_credentials))
        .route("/lookup", get(lookup))
        .route("/relationships", get(relationships))
        .route("/{id}", get(get_account))
        .route("/{id}/statuses", get(statuses))
        .route("/{id}/followers", get(followers))
        .route("/{id}/following", get(following))
        .route("/{id}/follow", post(follow))
        .route("/{id}/unfollow", post(unfollow))
}
