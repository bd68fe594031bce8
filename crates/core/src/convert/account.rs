//! User -> Account conversion.

use mastokey_misskey::{User, UserField};
use serde_json::Value;

use super::{mastodon_timestamp, server_base, text_to_html};
use crate::mastodon::{Account, AccountSource, CredentialAccount, CustomEmoji, Field};
use crate::origin::RequestOrigin;

/// Extension trait for converting a Misskey user to a Mastodon account.
pub trait UserToAccount {
    /// Convert to an `Account`. `server` is the Misskey server the user was
    /// fetched from.
    fn to_account(&self, server: &str) -> Account;

    /// Convert to a `CredentialAccount`.
    ///
    /// Misskey keeps no default post visibility, so `privacy` is whatever the
    /// caller knows (falls back to `public`).
    fn to_credential_account(&self, server: &str, privacy: Option<&str>) -> CredentialAccount;
}

impl UserToAccount for User {
    fn to_account(&self, server: &str) -> Account {
        let acct = match &self.host {
            Some(host) => format!("{}@{host}", self.username),
            None => self.username.clone(),
        };
        let url = self
            .url
            .clone()
            .or_else(|| self.uri.clone())
            .unwrap_or_else(|| format!("{}/@{acct}", server_base(server)));
        let avatar = self.avatar_url.clone().unwrap_or_default();
        let header = self.banner_url.clone().unwrap_or_default();

        Account {
            id: self.id.clone(),
            username: self.username.clone(),
            acct,
            url,
            display_name: self.name.clone().unwrap_or_default(),
            note: self.description.as_deref().map(text_to_html).unwrap_or_default(),
            avatar_static: avatar.clone(),
            avatar,
            header_static: header.clone(),
            header,
            locked: self.is_locked,
            bot: self.is_bot,
            group: false,
            discoverable: self.is_explorable,
            created_at: self
                .created_at
                .as_deref()
                .map_or_else(|| "1970-01-01T00:00:00.000Z".to_string(), mastodon_timestamp),
            last_status_at: None,
            statuses_count: self.notes_count,
            followers_count: self.followers_count,
            following_count: self.following_count,
            emojis: emojis(&self.emojis),
            fields: fields(&self.fields),
        }
    }

    fn to_credential_account(&self, server: &str, privacy: Option<&str>) -> CredentialAccount {
        let account = self.to_account(server);
        let source = AccountSource {
            privacy: privacy.unwrap_or("public").to_string(),
            sensitive: self.always_mark_nsfw.unwrap_or(false),
            language: self.lang.clone().unwrap_or_default(),
            note: self.description.clone().unwrap_or_default(),
            fields: account.fields.clone(),
        };

        CredentialAccount { account, source }
    }
}

/// Replaces empty avatar/header images with the gateway's placeholder.
///
/// An image and its static variant are replaced together when either is
/// empty, so both always carry the same URL afterwards.
pub fn apply_image_fallback(account: &mut Account, origin: &RequestOrigin) {
    if account.header.is_empty() || account.header_static.is_empty() {
        account.header = origin.missing_image_url();
        account.header_static = account.header.clone();
    }
    if account.avatar.is_empty() || account.avatar_static.is_empty() {
        account.avatar = origin.missing_image_url();
        account.avatar_static = account.avatar.clone();
    }
}

fn fields(fields: &[UserField]) -> Vec<Field> {
    fields
        .iter()
        .map(|f| Field {
            name: f.name.clone(),
            value: f.value.clone(),
            verified_at: None,
        })
        .collect()
}

fn emoji(shortcode: &str, url: &str) -> CustomEmoji {
    CustomEmoji {
        shortcode: shortcode.to_string(),
        url: url.to_string(),
        static_url: url.to_string(),
        visible_in_picker: true,
    }
}

/// Misskey sends emojis either as `{name: url}` or as `[{name, url}]`.
pub(super) fn emojis(value: &Value) -> Vec<CustomEmoji> {
    match value {
        Value::Object(map) => map
            .iter()
            .filter_map(|(name, url)| url.as_str().map(|url| emoji(name, url)))
            .collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| {
                let name = item.get("name")?.as_str()?;
                let url = item.get("url")?.as_str()?;
                Some(emoji(name, url))
            })
            .collect(),
        _ => Vec::new(),
    }
}
