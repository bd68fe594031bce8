//! Relationship service.
//!
//! Follow graph listings and follow/unfollow for Mastodon clients.

use std::collections::HashMap;
use std::sync::Arc;

use mastokey_common::{AppError, AppResult};
use mastokey_misskey::{Following, MisskeyApi, User};
use tracing::debug;

use crate::convert::{RelationToRelationship, UserToAccount, apply_image_fallback};
use crate::mastodon::{Account, Relationship};
use crate::origin::RequestOrigin;
use crate::pagination::{ACCOUNTS_DEFAULT_LIMIT, FOLLOWS_MAX_LIMIT, PaginationRequest};

/// Relationship service for business logic.
#[derive(Clone)]
pub struct RelationshipService {
    misskey: Arc<dyn MisskeyApi>,
}

impl RelationshipService {
    /// Create a new relationship service.
    #[must_use]
    pub fn new(misskey: Arc<dyn MisskeyApi>) -> Self {
        Self { misskey }
    }

    /// List accounts following `id`.
    pub async fn followers(
        &self,
        server: &str,
        origin: &RequestOrigin,
        token: Option<&str>,
        id: &str,
        pagination: &PaginationRequest,
    ) -> AppResult<Vec<Account>> {
        let page = pagination.to_page(ACCOUNTS_DEFAULT_LIMIT, Some(FOLLOWS_MAX_LIMIT));
        let entries = self.misskey.user_followers(server, token, id, &page).await?;
        Ok(accounts(
            entries.into_iter().filter_map(|f: Following| f.follower),
            server,
            origin,
        ))
    }

    /// List accounts `id` follows.
    pub async fn following(
        &self,
        server: &str,
        origin: &RequestOrigin,
        token: Option<&str>,
        id: &str,
        pagination: &PaginationRequest,
    ) -> AppResult<Vec<Account>> {
        let page = pagination.to_page(ACCOUNTS_DEFAULT_LIMIT, Some(FOLLOWS_MAX_LIMIT));
        let entries = self.misskey.user_following(server, token, id, &page).await?;
        Ok(accounts(
            entries.into_iter().filter_map(|f: Following| f.followee),
            server,
            origin,
        ))
    }

    /// List accounts waiting for the caller to accept their follow request.
    pub async fn follow_requests(
        &self,
        server: &str,
        origin: &RequestOrigin,
        token: &str,
        pagination: &PaginationRequest,
    ) -> AppResult<Vec<Account>> {
        let page = pagination.to_page(ACCOUNTS_DEFAULT_LIMIT, None);
        let requests = self.misskey.follow_requests(server, token, &page).await?;
        Ok(accounts(
            requests.into_iter().map(|r| r.follower),
            server,
            origin,
        ))
    }

    /// Relationships between the caller and each of `ids`.
    ///
    /// The result has one entry per input id, in input order, duplicates
    /// included. Ids the server says nothing about get an all-false
    /// relationship.
    pub async fn relationships(
        &self,
        server: &str,
        token: &str,
        ids: &[String],
    ) -> AppResult<Vec<Relationship>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let relations = self.misskey.relations(server, token, ids).await?;
        let by_id: HashMap<&str, Relationship> = relations
            .iter()
            .map(|r| (r.id.as_str(), r.to_relationship()))
            .collect();

        Ok(ids
            .iter()
            .map(|id| {
                by_id
                    .get(id.as_str())
                    .cloned()
                    .unwrap_or_else(|| Relationship::none(id))
            })
            .collect())
    }

    /// Follow `id`, then report the resulting relationship.
    pub async fn follow(&self, server: &str, token: &str, id: &str) -> AppResult<Relationship> {
        self.misskey.follow(server, token, id).await?;
        debug!(server = %server, target = %id, "Followed account");
        self.relationship(server, token, id).await
    }

    /// Unfollow `id`, then report the resulting relationship.
    pub async fn unfollow(&self, server: &str, token: &str, id: &str) -> AppResult<Relationship> {
        self.misskey.unfollow(server, token, id).await?;
        debug!(server = %server, target = %id, "Unfollowed account");
        self.relationship(server, token, id).await
    }

    async fn relationship(&self, server: &str, token: &str, id: &str) -> AppResult<Relationship> {
        self.relationships(server, token, &[id.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Internal(format!("no relationship for {id}")))
    }
}

fn accounts(
    users: impl Iterator<Item = User>,
    server: &str,
    origin: &RequestOrigin,
) -> Vec<Account> {
    users
        .map(|user| {
            let mut account = user.to_account(server);
            apply_image_fallback(&mut account, origin);
            account
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use mastokey_misskey::test_utils::FakeMisskey;
    use mastokey_misskey::{FollowRequest, Relation};

    const SERVER: &str = "misskey.example";

    fn user(id: &str, username: &str) -> User {
        User {
            id: id.to_string(),
            username: username.to_string(),
            avatar_url: Some(format!("https://misskey.example/{id}.png")),
            ..Default::default()
        }
    }

    fn following_entry(id: &str, follower: Option<User>, followee: Option<User>) -> Following {
        Following {
            id: id.to_string(),
            followee_id: followee.as_ref().map(|u| u.id.clone()),
            follower_id: follower.as_ref().map(|u| u.id.clone()),
            followee,
            follower,
        }
    }

    fn origin() -> RequestOrigin {
        RequestOrigin::new("http", "localhost:3000")
    }

    fn limit(limit: i64) -> PaginationRequest {
        PaginationRequest {
            limit,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_followers_clamps_limit() {
        let mut fake = FakeMisskey::with_user("tok", user("me", "me"));
        fake.followers = vec![following_entry("f1", Some(user("b", "bob")), None)];
        let fake = Arc::new(fake);
        let service = RelationshipService::new(fake.clone());

        let accounts = service
            .followers(SERVER, &origin(), None, "me", &limit(500))
            .await
            .unwrap();

        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].username, "bob");
        assert_eq!(accounts[0].header, "http://localhost:3000/static/missing.png");
        assert_eq!(fake.last_page.lock().unwrap().as_ref().unwrap().limit, 80);
    }

    #[tokio::test]
    async fn test_following_defaults_limit() {
        let mut fake = FakeMisskey::with_user("tok", user("me", "me"));
        fake.following = vec![following_entry("f1", None, Some(user("c", "carol")))];
        let fake = Arc::new(fake);
        let service = RelationshipService::new(fake.clone());

        let accounts = service
            .following(SERVER, &origin(), Some("tok"), "me", &limit(-3))
            .await
            .unwrap();

        assert_eq!(accounts[0].username, "carol");
        assert_eq!(fake.last_page.lock().unwrap().as_ref().unwrap().limit, 40);
    }

    #[tokio::test]
    async fn test_empty_listing_is_empty_vec() {
        let fake = Arc::new(FakeMisskey::with_user("tok", user("me", "me")));
        let service = RelationshipService::new(fake.clone());

        let accounts = service
            .followers(SERVER, &origin(), None, "me", &limit(0))
            .await
            .unwrap();

        assert!(accounts.is_empty());
    }

    #[tokio::test]
    async fn test_follow_requests_no_clamp() {
        let mut fake = FakeMisskey::with_user("tok", user("me", "me"));
        fake.follow_requests = vec![FollowRequest {
            id: "r1".to_string(),
            follower: user("d", "dave"),
            followee: user("me", "me"),
        }];
        let fake = Arc::new(fake);
        let service = RelationshipService::new(fake.clone());

        let accounts = service
            .follow_requests(SERVER, &origin(), "tok", &limit(120))
            .await
            .unwrap();

        assert_eq!(accounts[0].username, "dave");
        assert_eq!(fake.last_page.lock().unwrap().as_ref().unwrap().limit, 120);
    }

    #[tokio::test]
    async fn test_relationships_keep_input_order() {
        let mut fake = FakeMisskey::with_user("tok", user("me", "me"));
        fake.reverse_relations = true;
        let fake = Arc::new(fake);
        fake.add_relation(Relation {
            id: "A".to_string(),
            is_following: true,
            ..Default::default()
        });
        fake.add_relation(Relation {
            id: "B".to_string(),
            is_followed: true,
            ..Default::default()
        });
        let service = RelationshipService::new(fake.clone());

        let ids = vec!["A".to_string(), "B".to_string(), "A".to_string()];
        let relationships = service.relationships(SERVER, "tok", &ids).await.unwrap();

        let order: Vec<&str> = relationships.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(order, vec!["A", "B", "A"]);
        assert!(relationships[0].following);
        assert!(relationships[1].followed_by);
        assert_eq!(*fake.last_relation_ids.lock().unwrap(), ids);
    }

    #[tokio::test]
    async fn test_relationships_missing_id_is_all_false() {
        let fake = Arc::new(FakeMisskey::with_user("tok", user("me", "me")));
        let service = RelationshipService::new(fake.clone());

        let relationships = service
            .relationships(SERVER, "tok", &["ghost".to_string()])
            .await
            .unwrap();

        assert_eq!(relationships, vec![Relationship::none("ghost")]);
    }

    #[tokio::test]
    async fn test_relationships_empty_ids_skip_remote() {
        let fake = Arc::new(FakeMisskey::with_user("tok", user("me", "me")));
        let service = RelationshipService::new(fake.clone());

        let relationships = service.relationships(SERVER, "tok", &[]).await.unwrap();

        assert!(relationships.is_empty());
        assert!(fake.endpoints().is_empty());
    }

    #[tokio::test]
    async fn test_follow_then_refetch() {
        let fake = Arc::new(FakeMisskey::with_user("tok", user("me", "me")));
        fake.add_user(user("x", "xavier"));
        let service = RelationshipService::new(fake.clone());

        let relationship = service.follow(SERVER, "tok", "x").await.unwrap();

        assert_eq!(relationship.id, "x");
        assert!(relationship.following);
        assert_eq!(fake.endpoints(), vec!["following/create", "users/relation"]);
    }

    #[tokio::test]
    async fn test_unfollow_then_refetch() {
        let fake = Arc::new(FakeMisskey::with_user("tok", user("me", "me")));
        fake.add_user(user("x", "xavier"));
        fake.add_relation(Relation {
            id: "x".to_string(),
            is_following: true,
            ..Default::default()
        });
        let service = RelationshipService::new(fake.clone());

        let relationship = service.unfollow(SERVER, "tok", "x").await.unwrap();

        assert!(!relationship.following);
        assert_eq!(fake.endpoints(), vec!["following/delete", "users/relation"]);
    }

    #[tokio::test]
    async fn test_failed_follow_skips_refetch() {
        let fake = Arc::new(FakeMisskey::with_user("tok", user("me", "me")));
        let service = RelationshipService::new(fake.clone());

        let err = service.follow(SERVER, "tok", "nobody").await.unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(fake.endpoints(), vec!["following/create"]);
    }
}
