// Wardrobe - Supabase Backend
// GoTrue auth, PostgREST items table and Storage bucket over plain HTTP.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, WardrobeError};
use crate::items::{Item, ItemId, ItemRepository, NewItem};
use crate::session::{AuthBackend, Session, SessionStore, UserIdentity};
use crate::storage::{ObjectStore, StoredObject};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct SupabaseBackend {
    http: Client,
    url: String,
    anon_key: String,
    bucket: String,
    table: String,
    session: SessionStore,
}

/// Row shape of the items table
#[derive(Debug, Deserialize)]
struct ItemRow {
    item_id: ItemId,
    user_id: String,
    item_name: String,
    #[serde(default)]
    item_description: Option<String>,
    item_image_url: String,
    created_at: DateTime<Utc>,
}

impl From<ItemRow> for Item {
    fn from(row: ItemRow) -> Self {
        Item {
            id: row.item_id,
            owner_id: row.user_id,
            name: row.item_name,
            description: row.item_description.unwrap_or_default(),
            image_url: row.item_image_url,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
struct InsertRow<'a> {
    user_id: &'a str,
    item_name: &'a str,
    item_description: &'a str,
    item_image_url: &'a str,
}

#[derive(Debug, Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct UserPayload {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

impl From<UserPayload> for UserIdentity {
    fn from(user: UserPayload) -> Self {
        UserIdentity { id: user.id, email: user.email }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    user: UserPayload,
}

/// Pull a readable message out of an auth error body
fn auth_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            ["error_description", "msg", "message", "error"]
                .iter()
                .find_map(|k| v.get(*k).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| body.to_string())
}

impl SupabaseBackend {
    pub fn new(url: &str, anon_key: &str, bucket: &str, table: &str, session: SessionStore) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("wardrobe/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            url: url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            bucket: bucket.to_string(),
            table: table.to_string(),
            session,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.url, path)
    }

    /// apikey header + bearer (session token when signed in, else the anon key)
    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        let bearer = self
            .session
            .access_token()
            .unwrap_or_else(|| self.anon_key.clone());
        builder
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
    }

    async fn auth_call(&self, builder: RequestBuilder) -> Result<Response> {
        let res = builder
            .header("apikey", &self.anon_key)
            .send()
            .await
            .map_err(|e| WardrobeError::Auth(e.to_string()))?;

        if res.status().is_success() {
            return Ok(res);
        }
        let status = res.status().as_u16();
        let body = res.text().await.unwrap_or_default();
        log::warn!("Auth request failed with {}", status);
        Err(WardrobeError::Auth(auth_error_message(&body)))
    }
}

/// "HTTP <status>: <body>" for a non-2xx response
async fn failure_body(res: Response) -> String {
    let status = res.status().as_u16();
    let body = res.text().await.unwrap_or_default();
    format!("HTTP {}: {}", status, body)
}

#[async_trait]
impl AuthBackend for SupabaseBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let res = self
            .auth_call(
                self.http
                    .post(self.endpoint("/auth/v1/token"))
                    .query(&[("grant_type", "password")])
                    .json(&Credentials { email, password }),
            )
            .await?;

        let token: TokenResponse = res
            .json()
            .await
            .map_err(|e| WardrobeError::Auth(format!("Unexpected token response: {}", e)))?;

        Ok(Session {
            user: token.user.into(),
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at: token
                .expires_in
                .map(|secs| Utc::now() + chrono::Duration::seconds(secs)),
        })
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<UserIdentity> {
        let res = self
            .auth_call(
                self.http
                    .post(self.endpoint("/auth/v1/signup"))
                    .json(&Credentials { email, password }),
            )
            .await?;

        // Either a bare user or { user, session } depending on confirmation settings
        let body: Value = res
            .json()
            .await
            .map_err(|e| WardrobeError::Auth(format!("Unexpected signup response: {}", e)))?;
        let user_value = body.get("user").cloned().unwrap_or(body);
        let user: UserPayload = serde_json::from_value(user_value)
            .map_err(|e| WardrobeError::Auth(format!("Unexpected signup response: {}", e)))?;
        Ok(user.into())
    }

    async fn sign_out(&self, session: &Session) -> Result<()> {
        self.auth_call(
            self.http
                .post(self.endpoint("/auth/v1/logout"))
                .bearer_auth(&session.access_token),
        )
        .await?;
        Ok(())
    }

    async fn reset_password(&self, email: &str) -> Result<()> {
        self.auth_call(
            self.http
                .post(self.endpoint("/auth/v1/recover"))
                .json(&serde_json::json!({ "email": email })),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ItemRepository for SupabaseBackend {
    async fn insert(&self, items: Vec<NewItem>) -> Result<Vec<Item>> {
        let rows: Vec<InsertRow<'_>> = items
            .iter()
            .map(|i| InsertRow {
                user_id: &i.owner_id,
                item_name: &i.name,
                item_description: &i.description,
                item_image_url: &i.image_url,
            })
            .collect();

        let res = self
            .authed(self.http.post(self.endpoint(&format!("/rest/v1/{}", self.table))))
            .header("Prefer", "return=representation")
            .json(&rows)
            .send()
            .await
            .map_err(|e| WardrobeError::RecordInsert(e.to_string()))?;

        if !res.status().is_success() {
            return Err(WardrobeError::RecordInsert(failure_body(res).await));
        }

        let stored: Vec<ItemRow> = res
            .json()
            .await
            .map_err(|e| WardrobeError::RecordInsert(e.to_string()))?;
        Ok(stored.into_iter().map(Item::from).collect())
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Item>> {
        let res = self
            .authed(self.http.get(self.endpoint(&format!("/rest/v1/{}", self.table))))
            .query(&[
                ("select", "*".to_string()),
                ("user_id", format!("eq.{}", owner_id)),
                ("order", "created_at.desc".to_string()),
            ])
            .send()
            .await
            .map_err(|e| WardrobeError::Fetch(e.to_string()))?;

        if !res.status().is_success() {
            return Err(WardrobeError::Fetch(failure_body(res).await));
        }

        let rows: Vec<ItemRow> = res
            .json()
            .await
            .map_err(|e| WardrobeError::Fetch(e.to_string()))?;
        Ok(rows.into_iter().map(Item::from).collect())
    }

    async fn delete(&self, id: ItemId) -> Result<()> {
        let res = self
            .authed(self.http.delete(self.endpoint(&format!("/rest/v1/{}", self.table))))
            .query(&[("item_id", format!("eq.{}", id))])
            .send()
            .await
            .map_err(|e| WardrobeError::RecordDelete(e.to_string()))?;

        if !res.status().is_success() {
            return Err(WardrobeError::RecordDelete(failure_body(res).await));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for SupabaseBackend {
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<StoredObject> {
        let size_bytes = bytes.len() as u64;
        let res = self
            .authed(self.http.post(self.endpoint(&format!(
                "/storage/v1/object/{}/{}",
                self.bucket, path
            ))))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| WardrobeError::StorageWrite(e.to_string()))?;

        if !res.status().is_success() {
            return Err(WardrobeError::StorageWrite(failure_body(res).await));
        }

        Ok(StoredObject {
            path: path.to_string(),
            size_bytes,
            content_type: content_type.to_string(),
        })
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.url, self.bucket, path)
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        let res = self
            .authed(self.http.head(self.public_url(path)))
            .send()
            .await
            .map_err(|e| WardrobeError::Fetch(e.to_string()))?;
        Ok(res.status().is_success())
    }
}
