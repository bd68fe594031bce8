//! Query and form parameter binding.
//!
//! Mastodon clients send the same parameters either in the query string or
//! in a form body. [`Params`] keeps every pair in arrival order so repeated
//! keys (`id[]`) and later overrides both work, and turns malformed values
//! into [`AppError::Binding`] naming the offending field.
//!
//! JSON bodies are flattened into the same bracketed keys a form would use,
//! so `{"source":{"privacy":"private"}}` binds as `source[privacy]`.

use mastokey_common::{AppError, AppResult};
use mastokey_core::PaginationRequest;
use mastokey_core::services::StatusesQuery;
use serde_json::Value;

/// Ordered key/value parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(String, String)>);

impl Params {
    /// Parses an `application/x-www-form-urlencoded` payload.
    #[must_use]
    pub fn from_urlencoded(input: &[u8]) -> Self {
        Self(url::form_urlencoded::parse(input).into_owned().collect())
    }

    /// Parses an `application/json` payload.
    ///
    /// The payload must be an object. Nested objects and arrays become
    /// bracketed keys, and `null` members are skipped. An empty payload
    /// yields no pairs.
    pub fn from_json(input: &[u8]) -> AppResult<Self> {
        if input.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }

        let value: Value = serde_json::from_slice(input)
            .map_err(|e| AppError::BadRequest(format!("Invalid JSON body: {e}")))?;
        let Value::Object(members) = value else {
            return Err(AppError::BadRequest(
                "JSON body must be an object".to_string(),
            ));
        };

        let mut params = Self::default();
        for (key, value) in members {
            params.push_json(key, value);
        }
        Ok(params)
    }

    fn push_json(&mut self, key: String, value: Value) {
        match value {
            Value::Null => {}
            Value::Bool(b) => self.push(key, b.to_string()),
            Value::Number(n) => self.push(key, n.to_string()),
            Value::String(s) => self.push(key, s),
            Value::Array(items) => {
                for (index, item) in items.into_iter().enumerate() {
                    self.push_json(format!("{key}[{index}]"), item);
                }
            }
            Value::Object(members) => {
                for (name, item) in members {
                    self.push_json(format!("{key}[{name}]"), item);
                }
            }
        }
    }

    /// Appends a single pair.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.push((key.into(), value.into()));
    }

    /// Appends every pair of `other`, after the pairs already held.
    pub fn extend(&mut self, other: Self) {
        self.0.extend(other.0);
    }

    /// All pairs in arrival order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The last value given for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Every value given under any of `keys`, in arrival order.
    #[must_use]
    pub fn all(&self, keys: &[&str]) -> Vec<String> {
        self.0
            .iter()
            .filter(|(k, _)| keys.contains(&k.as_str()))
            .map(|(_, v)| v.clone())
            .collect()
    }

    /// The last value for `key`, if any.
    #[must_use]
    pub fn string(&self, key: &str) -> Option<String> {
        self.get(key).map(str::to_string)
    }

    /// The last non-empty value for `key` as a signed integer.
    pub fn int(&self, key: &str) -> AppResult<Option<i64>> {
        match self.get(key).filter(|v| !v.is_empty()) {
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|_| binding(key, format!("invalid integer value {raw:?}"))),
            None => Ok(None),
        }
    }

    /// The last non-empty value for `key` as a boolean.
    pub fn bool(&self, key: &str) -> AppResult<Option<bool>> {
        match self.get(key).filter(|v| !v.is_empty()) {
            Some(raw) => parse_bool(raw)
                .map(Some)
                .ok_or_else(|| binding(key, format!("invalid boolean value {raw:?}"))),
            None => Ok(None),
        }
    }

    /// Binds `limit`, `max_id`, `min_id` and `since_id`.
    pub fn pagination(&self) -> AppResult<PaginationRequest> {
        Ok(PaginationRequest {
            limit: self.int("limit")?.unwrap_or_default(),
            max_id: self.non_empty("max_id"),
            min_id: self.non_empty("min_id"),
            since_id: self.non_empty("since_id"),
        })
    }

    /// Binds the filters of an account status listing.
    pub fn statuses_query(&self) -> AppResult<StatusesQuery> {
        Ok(StatusesQuery {
            pagination: self.pagination()?,
            pinned_only: self
                .bool("pinned_only")?
                .or(self.bool("pinned")?)
                .unwrap_or_default(),
            only_media: self.bool("only_media")?.unwrap_or_default(),
            only_public: self.bool("only_public")?.unwrap_or_default(),
            exclude_replies: self.bool("exclude_replies")?.unwrap_or_default(),
            exclude_reblogs: self.bool("exclude_reblogs")?.unwrap_or_default(),
        })
    }

    fn non_empty(&self, key: &str) -> Option<String> {
        self.get(key).filter(|v| !v.is_empty()).map(str::to_string)
    }
}

/// Parses the boolean spellings clients send.
#[must_use]
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

fn binding(field: &str, message: String) -> AppError {
    AppError::Binding {
        field: field.to_string(),
        message,
    }
}
