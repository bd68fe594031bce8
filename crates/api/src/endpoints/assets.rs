//! Static assets served by the gateway itself.

use axum::{
    Router,
    http::header::{CACHE_CONTROL, CONTENT_TYPE},
    response::IntoResponse,
    routing::get,
};
use mastokey_core::origin::MISSING_IMAGE_PATH;

use crate::state::AppState;

/// Placeholder for accounts without an avatar or header image.
const MISSING_PNG: &[u8] = include_bytes!("../../assets/missing.png");

/// GET /static/missing.png
async fn missing_image() -> impl IntoResponse {
    (
        [
            (CONTENT_TYPE, "image/png"),
            (CACHE_CONTROL, "public, max-age=86400"),
        ],
        MISSING_PNG,
    )
}

/// Create the static assets router.
pub fn router() -> Router<AppState> {
    Router::new().route(MISSING_IMAGE_PATH, get(missing_image))
}
