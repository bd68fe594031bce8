//! Note -> Status conversion.

use mastokey_misskey::{DriveFile, Note};

use super::account::UserToAccount;
use super::{mastodon_timestamp, server_base, text_to_html};
use crate::mastodon::{MediaAttachment, Status};

/// Extension trait for converting a Misskey note to a Mastodon status.
pub trait NoteToStatus {
    fn to_status(&self, server: &str) -> Status;
}

impl NoteToStatus for Note {
    fn to_status(&self, server: &str) -> Status {
        let uri = self
            .uri
            .clone()
            .unwrap_or_else(|| format!("{}/notes/{}", server_base(server), self.id));
        let url = self.url.clone().or_else(|| Some(uri.clone()));

        // A renote without text of its own is a plain reblog.
        let reblog = match (&self.renote, &self.text) {
            (Some(renote), None) if self.files.is_empty() => {
                Some(Box::new(renote.to_status(server)))
            }
            _ => None,
        };

        Status {
            id: self.id.clone(),
            uri,
            url,
            created_at: mastodon_timestamp(&self.created_at),
            account: self.user.to_account(server),
            content: self.text.as_deref().map(text_to_html).unwrap_or_default(),
            visibility: visibility(&self.visibility).to_string(),
            sensitive: self.cw.is_some() || self.files.iter().any(|f| f.is_sensitive),
            spoiler_text: self.cw.clone().unwrap_or_default(),
            media_attachments: self.files.iter().map(attachment).collect(),
            mentions: Vec::new(),
            tags: Vec::new(),
            emojis: Vec::new(),
            reblog,
            in_reply_to_id: self.reply_id.clone(),
            in_reply_to_account_id: self.reply.as_ref().map(|r| r.user.id.clone()),
            replies_count: self.replies_count,
            reblogs_count: self.renote_count,
            favourites_count: self.reactions.values().sum(),
            language: None,
        }
    }
}

/// Maps Misskey note visibility to Mastodon visibility.
fn visibility(misskey: &str) -> &'static str {
    match misskey {
        "home" => "unlisted",
        "followers" => "private",
        "specified" => "direct",
        _ => "public",
    }
}

fn attachment(file: &DriveFile) -> MediaAttachment {
    let media_type = match file.mime_type.split('/').next() {
        Some("image") if file.mime_type == "image/gif" => "gifv",
        Some("image") => "image",
        Some("video") => "video",
        Some("audio") => "audio",
        _ => "unknown",
    };

    MediaAttachment {
        id: file.id.clone(),
        media_type: media_type.to_string(),
        url: file.url.clone().unwrap_or_default(),
        preview_url: file.thumbnail_url.clone().or_else(|| file.url.clone()),
        remote_url: None,
        description: file.comment.clone(),
        blurhash: file.blurhash.clone(),
    }
}
