//! Request extractors.

use axum::{
    extract::FromRequestParts,
    http::{
        HeaderMap,
        header::{AUTHORIZATION, HOST},
        request::Parts,
    },
};
use mastokey_common::{AppError, AppResult};
use mastokey_core::RequestOrigin;

use crate::params::Params;
use crate::state::AppState;

/// Header naming the Misskey server a request is proxied to.
pub const PROXY_SERVER_HEADER: &str = "x-proxy-server";

const FORWARDED_PROTO_HEADER: &str = "x-forwarded-proto";

/// Pulls the bearer token out of the `Authorization` header.
///
/// The token is the second space-separated segment of the header, so a
/// token containing spaces is cut at the first one.
pub fn bearer_token(headers: &HeaderMap) -> AppResult<String> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or(AppError::MissingCredential)?;
    let value = header
        .to_str()
        .map_err(|_| AppError::MalformedCredential)?;

    if !value.contains("Bearer ") {
        return Err(AppError::MalformedCredential);
    }

    match value.split(' ').nth(1) {
        Some(token) if !token.is_empty() => Ok(token.to_string()),
        _ => Err(AppError::MalformedCredential),
    }
}

/// Required bearer credential extractor.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        bearer_token(&parts.headers).map(Self)
    }
}

/// Optional bearer credential extractor.
///
/// A missing or malformed header yields `None`.
#[derive(Debug, Clone)]
pub struct MaybeBearerToken(pub Option<String>);

impl<S> FromRequestParts<S> for MaybeBearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(bearer_token(&parts.headers).ok()))
    }
}

/// Checks a server named by the `X-Proxy-Server` header.
///
/// Clients may only name a bare host or an `https://` URL. Plain `http://`
/// targets are reserved for the configured fallback server.
pub fn header_server(value: &str) -> AppResult<String> {
    match value.split_once("://") {
        None => Ok(value.to_string()),
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("https") => {
            Ok(format!("https://{rest}"))
        }
        Some(_) => Err(AppError::BadRequest(
            "X-Proxy-Server must be a host name or an https URL".to_string(),
        )),
    }
}

/// The Misskey server this request is proxied to.
///
/// Taken from `X-Proxy-Server`, else the configured fallback server.
#[derive(Debug, Clone)]
pub struct TargetServer(pub String);

impl FromRequestParts<AppState> for TargetServer {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(PROXY_SERVER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        if let Some(value) = header {
            return header_server(value).map(Self);
        }

        state
            .fallback_server
            .clone()
            .map(Self)
            .ok_or_else(|| AppError::BadRequest("X-Proxy-Server header is required".to_string()))
    }
}

/// Scheme and host the client used to reach this gateway.
#[derive(Debug, Clone)]
pub struct Origin(pub RequestOrigin);

impl<S> FromRequestParts<S> for Origin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let scheme = parts
            .headers
            .get(FORWARDED_PROTO_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or("http");

        let host = parts
            .headers
            .get(HOST)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .or_else(|| parts.uri.authority().map(ToString::to_string))
            .unwrap_or_else(|| "localhost".to_string());

        Ok(Self(RequestOrigin::new(scheme, host)))
    }
}

/// Query string parameters, in order of appearance.
#[derive(Debug, Clone, Default)]
pub struct QueryParams(pub Params);

impl<S> FromRequestParts<S> for QueryParams
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(Params::from_urlencoded(
            parts.uri.query().unwrap_or_default().as_bytes(),
        )))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, Request};

    fn headers(authorization: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(authorization).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(&headers("Bearer abc123")).unwrap(), "abc123");
    }

    #[test]
    fn test_bearer_token_missing() {
        assert!(matches!(
            bearer_token(&HeaderMap::new()),
            Err(AppError::MissingCredential)
        ));
    }

    #[test]
    fn test_bearer_token_not_bearer() {
        assert!(matches!(
            bearer_token(&headers("Basic dXNlcjpwYXNz")),
            Err(AppError::MalformedCredential)
        ));
        assert!(matches!(
            bearer_token(&headers("Bearer")),
            Err(AppError::MalformedCredential)
        ));
    }

    #[test]
    fn test_bearer_token_empty() {
        assert!(matches!(
            bearer_token(&headers("Bearer  abc")),
            Err(AppError::MalformedCredential)
        ));
    }

    #[test]
    fn test_bearer_token_with_space_is_cut() {
        assert_eq!(bearer_token(&headers("Bearer abc def")).unwrap(), "abc");
    }

    #[test]
    fn test_header_server_accepts_host_and_https() {
        assert_eq!(header_server("misskey.example").unwrap(), "misskey.example");
        assert_eq!(
            header_server("HTTPS://misskey.example").unwrap(),
            "https://misskey.example"
        );
    }

    #[test]
    fn test_header_server_rejects_other_schemes() {
        for value in ["http://169.254.169.254", "HTTP://localhost:8080", "ftp://host"] {
            assert!(
                matches!(header_server(value), Err(AppError::BadRequest(_))),
                "{value}"
            );
        }
    }

    #[tokio::test]
    async fn test_origin_from_headers() {
        let (mut parts, ()) = Request::builder()
            .uri("/api/v1/accounts/1")
            .header("Host", "gateway.example")
            .header("X-Forwarded-Proto", "https, http")
            .body(())
            .unwrap()
            .into_parts();

        let Origin(origin) = Origin::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(origin, RequestOrigin::new("https", "gateway.example"));
    }

    #[tokio::test]
    async fn test_origin_defaults_to_http() {
        let (mut parts, ()) = Request::builder()
            .uri("/api/v1/accounts/1")
            .header("Host", "localhost:3000")
            .body(())
            .unwrap()
            .into_parts();

        let Origin(origin) = Origin::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(origin.missing_image_url(), "http://localhost:3000/static/missing.png");
    }
}
