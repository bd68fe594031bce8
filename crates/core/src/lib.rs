//! Core translation logic for mastokey.
//!
//! Converts Misskey entities into Mastodon shapes and implements the
//! account and relationship operations on top of [`mastokey_misskey::MisskeyApi`].

#![allow(missing_docs)]

pub mod convert;
pub mod fields;
pub mod mastodon;
pub mod origin;
pub mod pagination;
pub mod services;

pub use origin::RequestOrigin;
pub use pagination::PaginationRequest;
pub use services::*;
