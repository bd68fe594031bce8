//! Shared application state.

#![allow(missing_docs)]

use std::sync::Arc;

use mastokey_core::{AccountService, RelationshipService};
use mastokey_misskey::MisskeyApi;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub account_service: AccountService,
    pub relationship_service: RelationshipService,
    /// Server used when a request carries no `X-Proxy-Server` header.
    pub fallback_server: Option<String>,
}

impl AppState {
    /// Builds the services on top of one Misskey backend.
    #[must_use]
    pub fn new(misskey: Arc<dyn MisskeyApi>, fallback_server: Option<String>) -> Self {
        Self {
            account_service: AccountService::new(misskey.clone()),
            relationship_service: RelationshipService::new(misskey),
            fallback_server: fallback_server.filter(|s| !s.is_empty()),
        }
    }
}
