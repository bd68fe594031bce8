//! Account handle parsing.

use crate::error::MisskeyError;

/// A parsed `user` or `user@host` handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acct {
    pub username: String,
    pub host: Option<String>,
}

impl Acct {
    /// Parses a handle. A single leading `@` is accepted.
    pub fn parse(acct: &str) -> Result<Self, MisskeyError> {
        let trimmed = acct.strip_prefix('@').unwrap_or(acct);
        let mut parts = trimmed.split('@');

        let username = parts.next().unwrap_or_default();
        let host = parts.next();
        if username.is_empty() || parts.next().is_some() || host.is_some_and(str::is_empty) {
            return Err(MisskeyError::InvalidHandle(
                "acct format is invalid".to_string(),
            ));
        }

        Ok(Self {
            username: username.to_string(),
            host: host.map(str::to_string),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_local() {
        let acct = Acct::parse("alice").unwrap();
        assert_eq!(acct.username, "alice");
        assert_eq!(acct.host, None);
    }

    #[test]
    fn test_parse_remote_with_leading_at() {
        let acct = Acct::parse("@alice@misskey.example").unwrap();
        assert_eq!(acct.username, "alice");
        assert_eq!(acct.host.as_deref(), Some("misskey.example"));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["@", "@@host", "alice@", "a@b@c", ""] {
            assert!(
                matches!(Acct::parse(bad), Err(MisskeyError::InvalidHandle(_))),
                "{bad} should be rejected"
            );
        }
    }
}
