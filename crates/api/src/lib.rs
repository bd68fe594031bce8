//! HTTP API layer for mastokey.
//!
//! This crate provides the Mastodon-compatible REST surface:
//!
//! - **Endpoints**: accounts, relationships and follow requests under `/api/v1`
//! - **Extractors**: bearer credential, target server, request origin
//! - **Params**: query and form binding with field-named errors
//!
//! Built on Axum 0.8.

pub mod endpoints;
pub mod extractors;
pub mod params;
pub mod state;

pub use endpoints::router;
pub use state::AppState;
