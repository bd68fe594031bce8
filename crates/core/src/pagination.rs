//! Cursor pagination parameters.

use mastokey_misskey::Page;

/// Default page size for account status listings.
pub const STATUSES_DEFAULT_LIMIT: u32 = 30;

/// Default page size for follower, following and follow-request listings.
pub const ACCOUNTS_DEFAULT_LIMIT: u32 = 40;

/// Largest page size for follower and following listings.
pub const FOLLOWS_MAX_LIMIT: u32 = 80;

/// Pagination parameters as a Mastodon client sends them.
///
/// `limit` is kept as given; the default and clamp depend on the call site
/// and are applied by [`Self::effective_limit`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaginationRequest {
    pub limit: i64,
    pub max_id: Option<String>,
    pub min_id: Option<String>,
    pub since_id: Option<String>,
}

impl PaginationRequest {
    /// Resolves the page size.
    ///
    /// A non-positive limit means "unset" and yields `default`; anything above
    /// `max` (when given) is clamped to `max`.
    #[must_use]
    pub fn effective_limit(&self, default: u32, max: Option<u32>) -> u32 {
        let limit = if self.limit <= 0 {
            default
        } else {
            u32::try_from(self.limit).unwrap_or(u32::MAX)
        };

        match max {
            Some(max) if limit > max => max,
            _ => limit,
        }
    }

    /// Converts to a Misskey page.
    ///
    /// `max_id` becomes `untilId`; `since_id` (or else `min_id`) becomes
    /// `sinceId`.
    #[must_use]
    pub fn to_page(&self, default: u32, max: Option<u32>) -> Page {
        Page {
            limit: self.effective_limit(default, max),
            since_id: self.since_id.clone().or_else(|| self.min_id.clone()),
            until_id: self.max_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_limit(limit: i64) -> PaginationRequest {
        PaginationRequest {
            limit,
            ..Default::default()
        }
    }

    #[test]
    fn test_non_positive_limit_uses_default() {
        for limit in [0, -1, i64::MIN] {
            assert_eq!(
                with_limit(limit).effective_limit(ACCOUNTS_DEFAULT_LIMIT, Some(FOLLOWS_MAX_LIMIT)),
                40
            );
        }
    }

    #[test]
    fn test_limit_above_max_is_clamped() {
        for limit in [81, 500, i64::MAX] {
            assert_eq!(
                with_limit(limit).effective_limit(ACCOUNTS_DEFAULT_LIMIT, Some(FOLLOWS_MAX_LIMIT)),
                80
            );
        }
    }

    #[test]
    fn test_limit_in_range_is_kept() {
        assert_eq!(
            with_limit(12).effective_limit(ACCOUNTS_DEFAULT_LIMIT, Some(FOLLOWS_MAX_LIMIT)),
            12
        );
        assert_eq!(
            with_limit(80).effective_limit(ACCOUNTS_DEFAULT_LIMIT, Some(FOLLOWS_MAX_LIMIT)),
            80
        );
    }

    #[test]
    fn test_no_clamp_without_max() {
        assert_eq!(with_limit(200).effective_limit(STATUSES_DEFAULT_LIMIT, None), 200);
        assert_eq!(with_limit(0).effective_limit(STATUSES_DEFAULT_LIMIT, None), 30);
    }

    #[test]
    fn test_to_page_maps_cursors() {
        let request = PaginationRequest {
            limit: 0,
            max_id: Some("max".to_string()),
            min_id: Some("min".to_string()),
            since_id: None,
        };
        let page = request.to_page(ACCOUNTS_DEFAULT_LIMIT, None);
        assert_eq!(page.limit, 40);
        assert_eq!(page.until_id.as_deref(), Some("max"));
        assert_eq!(page.since_id.as_deref(), Some("min"));
    }

    #[test]
    fn test_to_page_prefers_since_id() {
        let request = PaginationRequest {
            limit: 10,
            max_id: None,
            min_id: Some("min".to_string()),
            since_id: Some("since".to_string()),
        };
        assert_eq!(
            request.to_page(ACCOUNTS_DEFAULT_LIMIT, None).since_id.as_deref(),
            Some("since")
        );
    }
}
