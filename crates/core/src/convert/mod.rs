//! Misskey -> Mastodon conversion.

mod account;
mod relationship;
mod status;

pub use account::{UserToAccount, apply_image_fallback};
pub use relationship::RelationToRelationship;
pub use status::NoteToStatus;

use chrono::{DateTime, SecondsFormat, Utc};

/// Base URL of a Misskey server; bare hosts are assumed to speak https.
pub(crate) fn server_base(server: &str) -> String {
    let server = server.trim_end_matches('/');
    if server.starts_with("http://") || server.starts_with("https://") {
        server.to_string()
    } else {
        format!("https://{server}")
    }
}

/// Renders a Misskey timestamp the way Mastodon does (millisecond precision,
/// `Z` suffix). Unparseable input is passed through.
pub(crate) fn mastodon_timestamp(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw).map_or_else(
        |_| raw.to_string(),
        |dt| {
            dt.with_timezone(&Utc)
                .to_rfc3339_opts(SecondsFormat::Millis, true)
        },
    )
}

/// Turns plain text into a Mastodon HTML fragment.
pub(crate) fn text_to_html(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut html = String::with_capacity(text.len() + 7);
    html.push_str("<p>");
    for c in text.chars() {
        match c {
            '&' => html.push_str("&amp;"),
            '<' => html.push_str("&lt;"),
            '>' => html.push_str("&gt;"),
            '"' => html.push_str("&quot;"),
            '\'' => html.push_str("&#39;"),
            '\n' => html.push_str("<br>"),
            '\r' => {}
            c => html.push(c),
        }
    }
    html.push_str("</p>");
    html
}
