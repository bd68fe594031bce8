//! Profile field decoding.
//!
//! Mastodon clients send profile fields as flat form keys:
//!
//! ```text
//! fields_attributes[0][name]=Site
//! fields_attributes[0][value]=https://example.com
//! ```
//!
//! Indices may be sparse or arrive out of order.

use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Serialize};

// Valid static pattern, cannot fail
#[allow(clippy::unwrap_used)]
static FIELD_KEY_RE: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
    Regex::new(r"^fields_attributes\[(\d+)\]\[(name|value)\]$").unwrap()
});

/// A single profile field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileField {
    pub name: String,
    pub value: String,
}

#[derive(Default)]
struct Slot<'a> {
    name: Option<&'a str>,
    value: Option<&'a str>,
}

/// Decodes profile fields from form key/value pairs.
///
/// Pairs are taken in order and the last value for a key wins, so callers
/// pass query parameters, then form parameters, then multipart values.
/// An index yields a field only when both its `name` and `value` keys are
/// present; the value may be empty. Fields come out in ascending index order.
pub fn decode_profile_fields<'a, I>(pairs: I) -> Vec<ProfileField>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut slots: BTreeMap<u64, Slot<'a>> = BTreeMap::new();

    for (key, value) in pairs {
        let Some(captures) = FIELD_KEY_RE.captures(key) else {
            continue;
        };
        let Ok(index) = captures[1].parse::<u64>() else {
            continue;
        };

        let slot = slots.entry(index).or_default();
        if &captures[2] == "name" {
            slot.name = Some(value);
        } else {
            slot.value = Some(value);
        }
    }

    slots
        .into_values()
        .filter_map(|slot| match (slot.name, slot.value) {
            (Some(name), Some(value)) => Some(ProfileField {
                name: name.to_string(),
                value: value.to_string(),
            }),
            _ => None,
        })
        .collect()
}
