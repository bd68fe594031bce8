//! In-memory Misskey server for tests.
//!
//! [`FakeMisskey`] answers the [`MisskeyApi`] calls from seeded data and
//! records what it was asked, so tests can check both the translated
//! output and the outbound parameters.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::acct::Acct;
use crate::error::MisskeyError;
use crate::models::{
    DriveFile, FollowRequest, Following, Note, Page, ProfileUpdate, Relation, UploadFile, User,
    UserNotesQuery,
};
use crate::MisskeyApi;

/// A recorded call: endpoint name plus the server it targeted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub server: String,
    pub endpoint: &'static str,
}

/// Seeded, recording fake of a Misskey server.
#[derive(Default)]
pub struct FakeMisskey {
    /// Token accepted for authenticated calls, and the user it belongs to.
    pub token: Option<(String, String)>,
    pub users: Mutex<Vec<User>>,
    pub notes: Vec<Note>,
    pub followers: Vec<Following>,
    pub following: Vec<Following>,
    pub follow_requests: Vec<FollowRequest>,
    pub relations: Mutex<HashMap<String, Relation>>,
    /// Return relations in reverse request order.
    pub reverse_relations: bool,
    /// Fail every call with this error kind.
    pub fail_with: Option<fn() -> MisskeyError>,

    pub calls: Mutex<Vec<Call>>,
    pub last_page: Mutex<Option<Page>>,
    pub last_notes_query: Mutex<Option<UserNotesQuery>>,
    pub last_update: Mutex<Option<ProfileUpdate>>,
    pub last_relation_ids: Mutex<Vec<String>>,
    pub uploads: Mutex<Vec<String>>,
}

impl FakeMisskey {
    /// A fake that accepts `token` as the credential of `user`.
    #[must_use]
    pub fn with_user(token: &str, user: User) -> Self {
        Self {
            token: Some((token.to_string(), user.id.clone())),
            users: Mutex::new(vec![user]),
            ..Default::default()
        }
    }

    /// Adds another user.
    pub fn add_user(&self, user: User) {
        self.users.lock().unwrap().push(user);
    }

    /// Seeds a relation.
    pub fn add_relation(&self, relation: Relation) {
        self.relations
            .lock()
            .unwrap()
            .insert(relation.id.clone(), relation);
    }

    /// Endpoints called so far, in order.
    #[must_use]
    pub fn endpoints(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().iter().map(|c| c.endpoint).collect()
    }

    fn record(&self, server: &str, endpoint: &'static str) -> Result<(), MisskeyError> {
        self.calls.lock().unwrap().push(Call {
            server: server.to_string(),
            endpoint,
        });
        match self.fail_with {
            Some(fail) => Err(fail()),
            None => Ok(()),
        }
    }

    fn authenticate(&self, token: &str) -> Result<String, MisskeyError> {
        match &self.token {
            Some((expected, user_id)) if expected == token => Ok(user_id.clone()),
            _ => Err(MisskeyError::Api {
                status: 401,
                code: Some("AUTHENTICATION_FAILED".to_string()),
                message: "Authentication failed. Please ensure your token is correct."
                    .to_string(),
            }),
        }
    }

    fn user_by_id(&self, id: &str) -> Result<User, MisskeyError> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or(MisskeyError::NotFound)
    }
}

#[async_trait]
impl MisskeyApi for FakeMisskey {
    async fn verify_credentials(&self, server: &str, token: &str) -> Result<User, MisskeyError> {
        self.record(server, "i")?;
        let id = self.authenticate(token)?;
        self.user_by_id(&id)
    }

    async fn update_profile(
        &self,
        server: &str,
        token: &str,
        update: &ProfileUpdate,
    ) -> Result<User, MisskeyError> {
        self.record(server, "i/update")?;
        let id = self.authenticate(token)?;
        *self.last_update.lock().unwrap() = Some(update.clone());

        let mut users = self.users.lock().unwrap();
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(MisskeyError::NotFound)?;
        if let Some(name) = &update.name {
            user.name = Some(name.clone());
        }
        if let Some(description) = &update.description {
            user.description = Some(description.clone());
        }
        if let Some(locked) = update.is_locked {
            user.is_locked = locked;
        }
        if let Some(bot) = update.is_bot {
            user.is_bot = bot;
        }
        if let Some(explorable) = update.is_explorable {
            user.is_explorable = explorable;
        }
        if let Some(fields) = &update.fields {
            user.fields = fields.clone();
        }
        if let Some(avatar_id) = &update.avatar_id {
            user.avatar_url = Some(format!("https://fake.example/files/{avatar_id}"));
        }
        if let Some(banner_id) = &update.banner_id {
            user.banner_url = Some(format!("https://fake.example/files/{banner_id}"));
        }
        Ok(user.clone())
    }

    async fn upload_file(
        &self,
        server: &str,
        token: &str,
        file: UploadFile,
    ) -> Result<DriveFile, MisskeyError> {
        self.record(server, "drive/files/create")?;
        self.authenticate(token)?;
        let mut uploads = self.uploads.lock().unwrap();
        uploads.push(file.file_name.clone());
        Ok(DriveFile {
            id: format!("file{}", uploads.len()),
            name: file.file_name,
            mime_type: file.content_type.unwrap_or_default(),
            ..Default::default()
        })
    }

    async fn lookup_user(&self, server: &str, acct: &str) -> Result<User, MisskeyError> {
        self.record(server, "users/show")?;
        let acct = Acct::parse(acct)?;
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.username == acct.username && u.host == acct.host)
            .cloned()
            .ok_or(MisskeyError::NotFound)
    }

    async fn show_user(
        &self,
        server: &str,
        _token: Option<&str>,
        user_id: &str,
    ) -> Result<User, MisskeyError> {
        self.record(server, "users/show")?;
        self.user_by_id(user_id)
    }

    async fn user_notes(
        &self,
        server: &str,
        _token: Option<&str>,
        query: &UserNotesQuery,
    ) -> Result<Vec<Note>, MisskeyError> {
        self.record(server, "users/notes")?;
        *self.last_notes_query.lock().unwrap() = Some(query.clone());
        Ok(self
            .notes
            .iter()
            .filter(|n| n.user.id == query.user_id)
            .cloned()
            .collect())
    }

    async fn user_followers(
        &self,
        server: &str,
        _token: Option<&str>,
        _user_id: &str,
        page: &Page,
    ) -> Result<Vec<Following>, MisskeyError> {
        self.record(server, "users/followers")?;
        *self.last_page.lock().unwrap() = Some(page.clone());
        Ok(self.followers.clone())
    }

    async fn user_following(
        &self,
        server: &str,
        _token: Option<&str>,
        _user_id: &str,
        page: &Page,
    ) -> Result<Vec<Following>, MisskeyError> {
        self.record(server, "users/following")?;
        *self.last_page.lock().unwrap() = Some(page.clone());
        Ok(self.following.clone())
    }

    async fn follow_requests(
        &self,
        server: &str,
        token: &str,
        page: &Page,
    ) -> Result<Vec<FollowRequest>, MisskeyError> {
        self.record(server, "following/requests/list")?;
        self.authenticate(token)?;
        *self.last_page.lock().unwrap() = Some(page.clone());
        Ok(self.follow_requests.clone())
    }

    async fn relations(
        &self,
        server: &str,
        token: &str,
        user_ids: &[String],
    ) -> Result<Vec<Relation>, MisskeyError> {
        self.record(server, "users/relation")?;
        self.authenticate(token)?;
        *self.last_relation_ids.lock().unwrap() = user_ids.to_vec();

        let relations = self.relations.lock().unwrap();
        let mut result: Vec<Relation> = user_ids
            .iter()
            .filter_map(|id| relations.get(id).cloned())
            .collect();
        if self.reverse_relations {
            result.reverse();
        }
        Ok(result)
    }

    async fn follow(&self, server: &str, token: &str, user_id: &str) -> Result<(), MisskeyError> {
        self.record(server, "following/create")?;
        self.authenticate(token)?;
        self.user_by_id(user_id)?;
        self.relations
            .lock()
            .unwrap()
            .entry(user_id.to_string())
            .or_insert_with(|| Relation {
                id: user_id.to_string(),
                ..Default::default()
            })
            .is_following = true;
        Ok(())
    }

    async fn unfollow(&self, server: &str, token: &str, user_id: &str) -> Result<(), MisskeyError> {
        self.record(server, "following/delete")?;
        self.authenticate(token)?;
        self.user_by_id(user_id)?;
        if let Some(relation) = self.relations.lock().unwrap().get_mut(user_id) {
            relation.is_following = false;
        }
        Ok(())
    }
}
