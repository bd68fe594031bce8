//! Misskey REST client.
//!
//! Every Misskey endpoint is a `POST https://<server>/api/<endpoint>` with a
//! JSON body; the access token travels in the body as `i`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, multipart};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value, json};
use tracing::{debug, warn};
use url::Url;

use crate::MisskeyApi;
use crate::acct::Acct;
use crate::error::{INVALID_PARAM, MisskeyError};
use crate::models::{
    DriveFile, FollowRequest, Following, Note, Page, ProfileUpdate, Relation, UploadFile, User,
    UserNotesQuery,
};

/// Client settings.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: format!("mastokey/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// HTTP client for Misskey servers.
#[derive(Clone)]
pub struct MisskeyClient {
    client: Client,
}

impl MisskeyClient {
    /// Create a new Misskey client.
    pub fn new(options: &ClientOptions) -> Result<Self, MisskeyError> {
        let client = Client::builder()
            .timeout(options.timeout)
            .connect_timeout(options.connect_timeout)
            .user_agent(options.user_agent.as_str())
            .build()?;

        Ok(Self { client })
    }

    /// Builds the endpoint URL.
    ///
    /// A bare host gets `https://`; an explicit scheme is kept as given.
    pub fn endpoint_url(server: &str, endpoint: &str) -> Result<Url, MisskeyError> {
        let base = if server.starts_with("http://") || server.starts_with("https://") {
            server.trim_end_matches('/').to_string()
        } else {
            format!("https://{}", server.trim_end_matches('/'))
        };

        Url::parse(&format!("{base}/api/{endpoint}"))
            .map_err(|e| MisskeyError::InvalidUrl(format!("{server}: {e}")))
    }

    /// Serializes `params` into a JSON object and adds the token.
    fn body<P: Serialize>(params: &P, token: Option<&str>) -> Result<Value, MisskeyError> {
        let mut object = match serde_json::to_value(params)
            .map_err(|e| MisskeyError::Decode(e.to_string()))?
        {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(MisskeyError::Decode(format!(
                    "request body must be an object, got {other}"
                )));
            }
        };
        if let Some(token) = token {
            object.insert("i".to_string(), Value::String(token.to_string()));
        }
        Ok(Value::Object(object))
    }

    async fn call<P, T>(
        &self,
        server: &str,
        endpoint: &str,
        token: Option<&str>,
        params: &P,
    ) -> Result<T, MisskeyError>
    where
        P: Serialize + Sync,
        T: DeserializeOwned,
    {
        let response = self.send(server, endpoint, token, params).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            warn!(server = %server, endpoint = %endpoint, error = %e, "Undecodable response");
            MisskeyError::Decode(e.to_string())
        })
    }

    /// Calls an endpoint whose response body is not needed.
    async fn call_unit<P>(
        &self,
        server: &str,
        endpoint: &str,
        token: Option<&str>,
        params: &P,
    ) -> Result<(), MisskeyError>
    where
        P: Serialize + Sync,
    {
        self.send(server, endpoint, token, params).await?;
        Ok(())
    }

    async fn send<P>(
        &self,
        server: &str,
        endpoint: &str,
        token: Option<&str>,
        params: &P,
    ) -> Result<reqwest::Response, MisskeyError>
    where
        P: Serialize + Sync,
    {
        let url = Self::endpoint_url(server, endpoint)?;
        let body = Self::body(params, token)?;

        debug!(server = %server, endpoint = %endpoint, "Calling Misskey endpoint");

        let response = self.client.post(url).json(&body).send().await.map_err(|e| {
            warn!(server = %server, endpoint = %endpoint, error = %e, "Misskey request failed");
            MisskeyError::Transport(e)
        })?;

        Self::check(server, endpoint, response).await
    }

    async fn check(
        server: &str,
        endpoint: &str,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, MisskeyError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        warn!(
            server = %server,
            endpoint = %endpoint,
            status = %status,
            body = %body,
            "Misskey returned an error"
        );
        Err(MisskeyError::from_response(status.as_u16(), &body))
    }
}

#[async_trait]
impl MisskeyApi for MisskeyClient {
    async fn verify_credentials(&self, server: &str, token: &str) -> Result<User, MisskeyError> {
        self.call(server, "i", Some(token), &json!({})).await
    }

    async fn update_profile(
        &self,
        server: &str,
        token: &str,
        update: &ProfileUpdate,
    ) -> Result<User, MisskeyError> {
        self.call(server, "i/update", Some(token), update).await
    }

    async fn upload_file(
        &self,
        server: &str,
        token: &str,
        file: UploadFile,
    ) -> Result<DriveFile, MisskeyError> {
        let url = Self::endpoint_url(server, "drive/files/create")?;

        let mut part = multipart::Part::bytes(file.data.to_vec()).file_name(file.file_name);
        if let Some(content_type) = file.content_type {
            part = part.mime_str(&content_type)?;
        }
        let form = multipart::Form::new()
            .text("i", token.to_string())
            .part("file", part);

        debug!(server = %server, "Uploading drive file");

        let response = self.client.post(url).multipart(form).send().await?;
        let response = Self::check(server, "drive/files/create", response).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| MisskeyError::Decode(e.to_string()))
    }

    async fn lookup_user(&self, server: &str, acct: &str) -> Result<User, MisskeyError> {
        let acct = Acct::parse(acct)?;
        let params = json!({
            "username": acct.username,
            "host": acct.host,
        });

        match self.call(server, "users/show", None, &params).await {
            Err(err) if err.code() == Some(INVALID_PARAM) => {
                Err(MisskeyError::InvalidHandle(err.to_string()))
            }
            other => other,
        }
    }

    async fn show_user(
        &self,
        server: &str,
        token: Option<&str>,
        user_id: &str,
    ) -> Result<User, MisskeyError> {
        self.call(server, "users/show", token, &json!({ "userId": user_id }))
            .await
    }

    async fn user_notes(
        &self,
        server: &str,
        token: Option<&str>,
        query: &UserNotesQuery,
    ) -> Result<Vec<Note>, MisskeyError> {
        self.call(server, "users/notes", token, query).await
    }

    async fn user_followers(
        &self,
        server: &str,
        token: Option<&str>,
        user_id: &str,
        page: &Page,
    ) -> Result<Vec<Following>, MisskeyError> {
        let params = UserPage { user_id, page };
        self.call(server, "users/followers", token, &params).await
    }

    async fn user_following(
        &self,
        server: &str,
        token: Option<&str>,
        user_id: &str,
        page: &Page,
    ) -> Result<Vec<Following>, MisskeyError> {
        let params = UserPage { user_id, page };
        self.call(server, "users/following", token, &params).await
    }

    async fn follow_requests(
        &self,
        server: &str,
        token: &str,
        page: &Page,
    ) -> Result<Vec<FollowRequest>, MisskeyError> {
        self.call(server, "following/requests/list", Some(token), page)
            .await
    }

    async fn relations(
        &self,
        server: &str,
        token: &str,
        user_ids: &[String],
    ) -> Result<Vec<Relation>, MisskeyError> {
        self.call(server, "users/relation", Some(token), &json!({ "userId": user_ids }))
            .await
    }

    async fn follow(&self, server: &str, token: &str, user_id: &str) -> Result<(), MisskeyError> {
        self.call_unit(server, "following/create", Some(token), &json!({ "userId": user_id }))
            .await
    }

    async fn unfollow(&self, server: &str, token: &str, user_id: &str) -> Result<(), MisskeyError> {
        self.call_unit(server, "following/delete", Some(token), &json!({ "userId": user_id }))
            .await
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UserPage<'a> {
    user_id: &'a str,
    #[serde(flatten)]
    page: &'a Page,
}
