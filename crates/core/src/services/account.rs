//! Account service.
//!
//! Translates Mastodon account operations into Misskey calls.

use std::sync::Arc;

use mastokey_common::{AppError, AppResult};
use mastokey_misskey::{
    MisskeyApi, ProfileUpdate, UploadFile, UserField, UserNotesQuery,
};
use tracing::debug;
use validator::Validate;

use crate::convert::{NoteToStatus, UserToAccount, apply_image_fallback};
use crate::fields::ProfileField;
use crate::mastodon::{Account, CredentialAccount, Status};
use crate::origin::RequestOrigin;
use crate::pagination::{PaginationRequest, STATUSES_DEFAULT_LIMIT};

/// Input for updating the caller's profile.
///
/// Every `None` leaves the corresponding attribute untouched.
#[derive(Debug, Clone, Default, Validate)]
pub struct UpdateCredentialsInput {
    #[validate(length(max = 50))]
    pub display_name: Option<String>,
    #[validate(length(max = 1500))]
    pub note: Option<String>,
    pub locked: Option<bool>,
    pub bot: Option<bool>,
    pub discoverable: Option<bool>,
    pub source_privacy: Option<String>,
    pub source_sensitive: Option<bool>,
    pub source_language: Option<String>,
    /// Replaces the whole field list when non-empty.
    pub fields: Vec<ProfileField>,
    pub avatar: Option<UploadFile>,
    pub header: Option<UploadFile>,
}

/// Filters for an account's status listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusesQuery {
    pub pagination: PaginationRequest,
    pub pinned_only: bool,
    pub only_media: bool,
    pub only_public: bool,
    pub exclude_replies: bool,
    pub exclude_reblogs: bool,
}

/// Account service for business logic.
#[derive(Clone)]
pub struct AccountService {
    misskey: Arc<dyn MisskeyApi>,
}

impl AccountService {
    /// Create a new account service.
    #[must_use]
    pub fn new(misskey: Arc<dyn MisskeyApi>) -> Self {
        Self { misskey }
    }

    /// Get the account that owns `token`.
    ///
    /// Images are returned as Misskey has them, without placeholders.
    pub async fn verify_credentials(
        &self,
        server: &str,
        token: &str,
    ) -> AppResult<CredentialAccount> {
        let user = self.misskey.verify_credentials(server, token).await?;
        Ok(user.to_credential_account(server, None))
    }

    /// Update the profile of the account that owns `token`.
    pub async fn update_credentials(
        &self,
        server: &str,
        token: &str,
        input: UpdateCredentialsInput,
    ) -> AppResult<CredentialAccount> {
        input.validate()?;

        let avatar_id = match input.avatar {
            Some(file) => Some(self.misskey.upload_file(server, token, file).await?.id),
            None => None,
        };
        let banner_id = match input.header {
            Some(file) => Some(self.misskey.upload_file(server, token, file).await?.id),
            None => None,
        };

        let fields = if input.fields.is_empty() {
            None
        } else {
            Some(
                input
                    .fields
                    .into_iter()
                    .map(|f| UserField {
                        name: f.name,
                        value: f.value,
                    })
                    .collect(),
            )
        };

        let update = ProfileUpdate {
            name: input.display_name,
            description: input.note,
            lang: input.source_language,
            is_locked: input.locked,
            is_bot: input.bot,
            is_explorable: input.discoverable,
            always_mark_nsfw: input.source_sensitive,
            fields,
            avatar_id,
            banner_id,
        };

        debug!(server = %server, ?update, "Updating profile");

        let user = self.misskey.update_profile(server, token, &update).await?;
        Ok(user.to_credential_account(server, input.source_privacy.as_deref()))
    }

    /// Look up an account by `user` or `user@host` handle.
    pub async fn lookup(
        &self,
        server: &str,
        origin: &RequestOrigin,
        acct: &str,
    ) -> AppResult<Account> {
        if acct.is_empty() {
            return Err(AppError::BadRequest("acct is required".to_string()));
        }

        let user = self.misskey.lookup_user(server, acct).await?;
        let mut account = user.to_account(server);
        apply_image_fallback(&mut account, origin);
        Ok(account)
    }

    /// Get an account by its Misskey id.
    pub async fn get(
        &self,
        server: &str,
        origin: &RequestOrigin,
        token: Option<&str>,
        id: &str,
    ) -> AppResult<Account> {
        let user = self.misskey.show_user(server, token, id).await?;
        let mut account = user.to_account(server);
        apply_image_fallback(&mut account, origin);
        Ok(account)
    }

    /// List an account's statuses.
    pub async fn statuses(
        &self,
        server: &str,
        token: Option<&str>,
        id: &str,
        query: &StatusesQuery,
    ) -> AppResult<Vec<Status>> {
        let page = query.pagination.to_page(STATUSES_DEFAULT_LIMIT, None);

        let notes = if query.pinned_only {
            // Misskey ids sort by creation time.
            let user = self.misskey.show_user(server, token, id).await?;
            user.pinned_notes
                .into_iter()
                .filter(|note| page.until_id.as_ref().is_none_or(|max| note.id < *max))
                .filter(|note| page.since_id.as_ref().is_none_or(|min| note.id > *min))
                .take(page.limit as usize)
                .collect()
        } else {
            let notes_query = UserNotesQuery {
                user_id: id.to_string(),
                page,
                with_files: query.only_media,
                with_replies: !query.exclude_replies,
                with_renotes: !query.exclude_reblogs,
            };
            self.misskey.user_notes(server, token, &notes_query).await?
        };

        Ok(notes
            .iter()
            .filter(|note| !query.only_public || note.visibility == "public")
            .map(|note| note.to_status(server))
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use mastokey_misskey::test_utils::FakeMisskey;
    use mastokey_misskey::{MisskeyError, Note, User};

    const SERVER: &str = "misskey.example";

    fn alice() -> User {
        User {
            id: "9abc".to_string(),
            name: Some("Alice".to_string()),
            username: "alice".to_string(),
            avatar_url: Some("https://misskey.example/avatar.png".to_string()),
            banner_url: None,
            ..Default::default()
        }
    }

    fn origin() -> RequestOrigin {
        RequestOrigin::new("https", "gw.example")
    }

    fn service(fake: &Arc<FakeMisskey>) -> AccountService {
        AccountService::new(fake.clone())
    }

    fn note(id: &str, visibility: &str) -> Note {
        Note {
            id: id.to_string(),
            created_at: "2023-01-01T00:00:00.000Z".to_string(),
            user: alice(),
            text: Some(id.to_string()),
            visibility: visibility.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_lookup_empty_acct_makes_no_remote_call() {
        let fake = Arc::new(FakeMisskey::with_user("tok", alice()));

        let err = service(&fake).lookup(SERVER, &origin(), "").await.unwrap_err();

        assert!(matches!(err, AppError::BadRequest(ref m) if m == "acct is required"));
        assert!(fake.endpoints().is_empty());
    }

    #[tokio::test]
    async fn test_lookup_applies_header_fallback() {
        let fake = Arc::new(FakeMisskey::with_user("tok", alice()));

        let account = service(&fake).lookup(SERVER, &origin(), "alice").await.unwrap();

        assert_eq!(account.id, "9abc");
        assert_eq!(account.header, "https://gw.example/static/missing.png");
        assert_eq!(account.header_static, "https://gw.example/static/missing.png");
        assert_eq!(account.avatar, "https://misskey.example/avatar.png");
        assert_eq!(fake.calls.lock().unwrap()[0].server, SERVER);
    }

    #[tokio::test]
    async fn test_lookup_not_found() {
        let fake = Arc::new(FakeMisskey::with_user("tok", alice()));

        let err = service(&fake).lookup(SERVER, &origin(), "bob").await.unwrap_err();

        assert!(matches!(err, AppError::NotFound(ref m) if m == "Record not found"));
    }

    #[tokio::test]
    async fn test_lookup_invalid_handle() {
        let fake = Arc::new(FakeMisskey::with_user("tok", alice()));

        let err = service(&fake)
            .lookup(SERVER, &origin(), "a@b@c")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidHandle(_)));
    }

    #[tokio::test]
    async fn test_get_applies_fallback() {
        let fake = Arc::new(FakeMisskey::with_user("tok", alice()));

        let account = service(&fake)
            .get(SERVER, &origin(), None, "9abc")
            .await
            .unwrap();

        assert_eq!(account.header, "https://gw.example/static/missing.png");
        assert_eq!(account.header, account.header_static);
    }

    #[tokio::test]
    async fn test_verify_credentials_keeps_images() {
        let fake = Arc::new(FakeMisskey::with_user("tok", alice()));

        let credential = service(&fake).verify_credentials(SERVER, "tok").await.unwrap();

        assert_eq!(credential.account.id, "9abc");
        assert_eq!(credential.account.header, "");
        assert_eq!(credential.source.privacy, "public");
    }

    #[tokio::test]
    async fn test_remote_errors_pass_through() {
        let fake = Arc::new(FakeMisskey::with_user("tok", alice()));

        let err = service(&fake)
            .verify_credentials(SERVER, "wrong")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Remote { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_update_credentials_sends_only_present_fields() {
        let fake = Arc::new(FakeMisskey::with_user("tok", alice()));
        let input = UpdateCredentialsInput {
            display_name: Some(String::new()),
            locked: Some(true),
            source_privacy: Some("private".to_string()),
            ..Default::default()
        };

        let credential = service(&fake)
            .update_credentials(SERVER, "tok", input)
            .await
            .unwrap();

        let update = fake.last_update.lock().unwrap().clone().unwrap();
        assert_eq!(
            update,
            ProfileUpdate {
                name: Some(String::new()),
                is_locked: Some(true),
                ..Default::default()
            }
        );
        assert!(credential.account.locked);
        assert_eq!(credential.account.display_name, "");
        assert_eq!(credential.source.privacy, "private");
    }

    #[tokio::test]
    async fn test_update_credentials_replaces_fields_and_uploads_images() {
        let fake = Arc::new(FakeMisskey::with_user("tok", alice()));
        let input = UpdateCredentialsInput {
            fields: vec![ProfileField {
                name: "Site".to_string(),
                value: "http://x".to_string(),
            }],
            avatar: Some(UploadFile {
                file_name: "a.png".to_string(),
                content_type: Some("image/png".to_string()),
                data: Bytes::from_static(b"a"),
            }),
            header: Some(UploadFile {
                file_name: "h.png".to_string(),
                content_type: Some("image/png".to_string()),
                data: Bytes::from_static(b"h"),
            }),
            ..Default::default()
        };

        let credential = service(&fake)
            .update_credentials(SERVER, "tok", input)
            .await
            .unwrap();

        let update = fake.last_update.lock().unwrap().clone().unwrap();
        assert_eq!(update.avatar_id.as_deref(), Some("file1"));
        assert_eq!(update.banner_id.as_deref(), Some("file2"));
        assert_eq!(
            update.fields,
            Some(vec![UserField {
                name: "Site".to_string(),
                value: "http://x".to_string(),
            }])
        );
        assert_eq!(credential.account.fields[0].value, "http://x");
        assert_eq!(
            fake.endpoints(),
            vec!["drive/files/create", "drive/files/create", "i/update"]
        );
    }

    #[tokio::test]
    async fn test_update_credentials_validates_before_remote_call() {
        let fake = Arc::new(FakeMisskey::with_user("tok", alice()));
        let input = UpdateCredentialsInput {
            display_name: Some("x".repeat(51)),
            ..Default::default()
        };

        let err = service(&fake)
            .update_credentials(SERVER, "tok", input)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert!(fake.endpoints().is_empty());
    }

    #[tokio::test]
    async fn test_statuses_pass_flags_and_default_limit() {
        let mut fake = FakeMisskey::with_user("tok", alice());
        fake.notes = vec![note("n1", "public"), note("n2", "home")];
        let fake = Arc::new(fake);
        let query = StatusesQuery {
            pagination: PaginationRequest {
                max_id: Some("n9".to_string()),
                ..Default::default()
            },
            only_media: true,
            exclude_reblogs: true,
            ..Default::default()
        };

        let statuses = service(&fake)
            .statuses(SERVER, None, "9abc", &query)
            .await
            .unwrap();

        assert_eq!(statuses.len(), 2);
        let sent = fake.last_notes_query.lock().unwrap().clone().unwrap();
        assert_eq!(sent.page.limit, 30);
        assert_eq!(sent.page.until_id.as_deref(), Some("n9"));
        assert!(sent.with_files);
        assert!(sent.with_replies);
        assert!(!sent.with_renotes);
    }

    #[tokio::test]
    async fn test_statuses_only_public() {
        let mut fake = FakeMisskey::with_user("tok", alice());
        fake.notes = vec![note("n1", "public"), note("n2", "followers")];
        let fake = Arc::new(fake);
        let query = StatusesQuery {
            only_public: true,
            ..Default::default()
        };

        let statuses = service(&fake)
            .statuses(SERVER, None, "9abc", &query)
            .await
            .unwrap();

        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].id, "n1");
    }

    #[tokio::test]
    async fn test_statuses_pinned_only() {
        let mut user = alice();
        user.pinned_notes = vec![note("p1", "public")];
        let fake = Arc::new(FakeMisskey::with_user("tok", user));
        let query = StatusesQuery {
            pinned_only: true,
            ..Default::default()
        };

        let statuses = service(&fake)
            .statuses(SERVER, None, "9abc", &query)
            .await
            .unwrap();

        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].id, "p1");
        assert_eq!(fake.endpoints(), vec!["users/show"]);
    }

    #[tokio::test]
    async fn test_statuses_pinned_only_honors_cursor() {
        let mut user = alice();
        user.pinned_notes = vec![
            note("9n3", "public"),
            note("9n1", "public"),
            note("9n2", "public"),
        ];
        let fake = Arc::new(FakeMisskey::with_user("tok", user));
        let service = service(&fake);

        let older = StatusesQuery {
            pinned_only: true,
            pagination: PaginationRequest {
                max_id: Some("9n2".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let statuses = service.statuses(SERVER, None, "9abc", &older).await.unwrap();
        let ids: Vec<_> = statuses.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["9n1"]);

        let newer = StatusesQuery {
            pinned_only: true,
            pagination: PaginationRequest {
                min_id: Some("9n1".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let statuses = service.statuses(SERVER, None, "9abc", &newer).await.unwrap();
        let ids: Vec<_> = statuses.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["9n3", "9n2"]);
    }

    #[tokio::test]
    async fn test_statuses_empty_is_empty_vec() {
        let fake = Arc::new(FakeMisskey::with_user("tok", alice()));

        let statuses = service(&fake)
            .statuses(SERVER, None, "9abc", &StatusesQuery::default())
            .await
            .unwrap();

        assert!(statuses.is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_is_upstream_error() {
        let mut fake = FakeMisskey::with_user("tok", alice());
        fake.fail_with = Some(|| MisskeyError::Decode("boom".to_string()));
        let fake = Arc::new(fake);

        let err = service(&fake)
            .get(SERVER, &origin(), None, "9abc")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Upstream(_)));
    }
}
