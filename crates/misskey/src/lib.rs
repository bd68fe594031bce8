//! Misskey client for mastokey.
//!
//! The gateway talks to Misskey servers through the [`MisskeyApi`] trait.
//! [`MisskeyClient`] is the reqwest-backed implementation; tests swap in
//! in-memory fakes.
//!
//! Every method takes the target server explicitly. Failures come back as a
//! tagged [`MisskeyError`] so callers can branch on the kind of failure.

#![allow(missing_docs)]

pub mod acct;
pub mod client;
pub mod error;
pub mod models;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use async_trait::async_trait;

pub use acct::Acct;
pub use client::{ClientOptions, MisskeyClient};
pub use error::MisskeyError;
pub use models::{
    DriveFile, FollowRequest, Following, Note, Page, ProfileUpdate, Relation, UploadFile, User,
    UserField, UserNotesQuery,
};

/// Operations the gateway needs from a Misskey server.
#[async_trait]
pub trait MisskeyApi: Send + Sync {
    /// `i`: the account that owns `token`.
    async fn verify_credentials(&self, server: &str, token: &str) -> Result<User, MisskeyError>;

    /// `i/update`: change the profile of the account that owns `token`.
    async fn update_profile(
        &self,
        server: &str,
        token: &str,
        update: &ProfileUpdate,
    ) -> Result<User, MisskeyError>;

    /// `drive/files/create`: upload a file to the caller's drive.
    async fn upload_file(
        &self,
        server: &str,
        token: &str,
        file: UploadFile,
    ) -> Result<DriveFile, MisskeyError>;

    /// `users/show` by handle.
    ///
    /// Fails with [`MisskeyError::InvalidHandle`] when the handle is not a
    /// `user` or `user@host` handle, and with [`MisskeyError::NotFound`] when
    /// nobody has it.
    async fn lookup_user(&self, server: &str, acct: &str) -> Result<User, MisskeyError>;

    /// `users/show` by id.
    async fn show_user(
        &self,
        server: &str,
        token: Option<&str>,
        user_id: &str,
    ) -> Result<User, MisskeyError>;

    /// `users/notes`.
    async fn user_notes(
        &self,
        server: &str,
        token: Option<&str>,
        query: &UserNotesQuery,
    ) -> Result<Vec<Note>, MisskeyError>;

    /// `users/followers`.
    async fn user_followers(
        &self,
        server: &str,
        token: Option<&str>,
        user_id: &str,
        page: &Page,
    ) -> Result<Vec<Following>, MisskeyError>;

    /// `users/following`.
    async fn user_following(
        &self,
        server: &str,
        token: Option<&str>,
        user_id: &str,
        page: &Page,
    ) -> Result<Vec<Following>, MisskeyError>;

    /// `following/requests/list`: pending requests to follow the caller.
    async fn follow_requests(
        &self,
        server: &str,
        token: &str,
        page: &Page,
    ) -> Result<Vec<FollowRequest>, MisskeyError>;

    /// `users/relation` for several users at once.
    ///
    /// The order of the result is whatever the server chooses.
    async fn relations(
        &self,
        server: &str,
        token: &str,
        user_ids: &[String],
    ) -> Result<Vec<Relation>, MisskeyError>;

    /// `following/create`.
    async fn follow(&self, server: &str, token: &str, user_id: &str) -> Result<(), MisskeyError>;

    /// `following/delete`.
    async fn unfollow(&self, server: &str, token: &str, user_id: &str) -> Result<(), MisskeyError>;
}
