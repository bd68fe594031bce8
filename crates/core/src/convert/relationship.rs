//! Relation -> Relationship conversion.

use mastokey_misskey::Relation;

use crate::mastodon::Relationship;

/// Extension trait for converting a Misskey relation to a Mastodon relationship.
pub trait RelationToRelationship {
    fn to_relationship(&self) -> Relationship;
}

impl RelationToRelationship for Relation {
    fn to_relationship(&self) -> Relationship {
        Relationship {
            id: self.id.clone(),
            following: self.is_following,
            showing_reblogs: self.is_following && !self.is_renote_muted,
            notifying: false,
            followed_by: self.is_followed,
            blocking: self.is_blocking,
            blocked_by: self.is_blocked,
            muting: self.is_muted,
            muting_notifications: self.is_muted,
            requested: self.has_pending_follow_request_from_you,
            requested_by: self.has_pending_follow_request_to_you,
            domain_blocking: false,
            endorsed: false,
            note: String::new(),
        }
    }
}
