//! Misskey wire models.
//!
//! Only the fields the gateway reads are modelled; everything else the
//! remote server sends is ignored.

use std::collections::HashMap;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A Misskey user (`UserLite` or `UserDetailed`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub username: String,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub banner_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub is_cat: bool,
    #[serde(default)]
    pub is_locked: bool,
    #[serde(default)]
    pub is_explorable: bool,
    #[serde(default)]
    pub fields: Vec<UserField>,
    #[serde(default)]
    pub followers_count: i64,
    #[serde(default)]
    pub following_count: i64,
    #[serde(default)]
    pub notes_count: i64,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
    /// Either a `{name: url}` map (v13+) or a list of `{name, url}` objects.
    #[serde(default)]
    pub emojis: Value,
    #[serde(default)]
    pub pinned_notes: Vec<Note>,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub always_mark_nsfw: Option<bool>,
}

/// A profile field as Misskey stores it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserField {
    pub name: String,
    pub value: String,
}

/// A Misskey note.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub created_at: String,
    pub user: User,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub cw: Option<String>,
    #[serde(default)]
    pub visibility: String,
    #[serde(default)]
    pub reply_id: Option<String>,
    #[serde(default)]
    pub reply: Option<Box<Note>>,
    #[serde(default)]
    pub renote: Option<Box<Note>>,
    #[serde(default)]
    pub replies_count: i64,
    #[serde(default)]
    pub renote_count: i64,
    #[serde(default)]
    pub reactions: HashMap<String, i64>,
    #[serde(default)]
    pub files: Vec<DriveFile>,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// A drive file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub mime_type: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub blurhash: Option<String>,
    #[serde(default)]
    pub is_sensitive: bool,
}

/// An entry of `users/followers` or `users/following`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Following {
    pub id: String,
    #[serde(default)]
    pub followee_id: Option<String>,
    #[serde(default)]
    pub follower_id: Option<String>,
    #[serde(default)]
    pub followee: Option<User>,
    #[serde(default)]
    pub follower: Option<User>,
}

/// An entry of `following/requests/list`.
#[derive(Debug, Clone, Deserialize)]
pub struct FollowRequest {
    pub id: String,
    pub follower: User,
    pub followee: User,
}

/// An entry of `users/relation`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relation {
    pub id: String,
    #[serde(default)]
    pub is_following: bool,
    #[serde(default)]
    pub is_followed: bool,
    #[serde(default)]
    pub has_pending_follow_request_from_you: bool,
    #[serde(default)]
    pub has_pending_follow_request_to_you: bool,
    #[serde(default)]
    pub is_blocking: bool,
    #[serde(default)]
    pub is_blocked: bool,
    #[serde(default)]
    pub is_muted: bool,
    #[serde(default)]
    pub is_renote_muted: bool,
}

/// Cursor page for Misskey list endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub until_id: Option<String>,
}

/// Parameters of `users/notes`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserNotesQuery {
    pub user_id: String,
    #[serde(flatten)]
    pub page: Page,
    pub with_files: bool,
    pub with_replies: bool,
    pub with_renotes: bool,
}

/// Parameters of `i/update`.
///
/// `None` means "leave unchanged" and is never serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_locked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_bot: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_explorable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub always_mark_nsfw: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<UserField>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner_id: Option<String>,
}

/// A file to upload to the drive.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}
