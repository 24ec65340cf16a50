//! ---
//! studio_section: "05-external-interfaces"
//! studio_subsection: "module"
//! studio_type: "source"
//! studio_scope: "code"
//! studio_description: "Hosted backend collaborators consumed by the console."
//! studio_version: "v0.1.0"
//! studio_owner: "tbd"
//! ---
use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::{json, Map, Value};
use studio_common::{BackendConfig, ContentConfig, ContentTarget};
use studio_security::{ProfileFilter, Subject};
use tracing::{debug, warn};
use url::Url;

use crate::error::BackendError;
use crate::model::{
    AuthUser, ContentItem, ContentKind, ContentPatch, FunctionReply, ProfileRecord, ProfileRow,
    ProfileUpdate, Session,
};
use crate::service::{ContentStore, IdentityService, PrivilegedFunctions, ProfileStore};

const PROFILE_COLUMNS: &str = "id,role,full_name,ai_access";
const LIST_COLUMNS: &str = "id,full_name,email,role";

/// HTTP client for the hosted platform: `auth/v1`, `rest/v1`, `functions/v1`
/// and `storage/v1` under one base URL.
pub struct HostedBackend {
    http: Client,
    base: Url,
    anon_key: String,
    profiles_table: String,
    content: ContentConfig,
    access_token: RwLock<Option<String>>,
}

impl HostedBackend {
    /// Build a client from configuration. No request is made.
    pub fn new(backend: &BackendConfig, content: ContentConfig) -> Result<Self, BackendError> {
        let base = backend
            .base_url()
            .map_err(|err| BackendError::Config(format!("{err:#}")))?;
        let http = Client::builder()
            .timeout(backend.request_timeout)
            .user_agent(concat!("studio/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base,
            anon_key: backend.anon_key.clone(),
            profiles_table: backend.profiles_table.clone(),
            content,
            access_token: RwLock::new(None),
        })
    }

    /// Attach a previously issued access token.
    pub fn with_access_token(self, token: impl Into<String>) -> Self {
        *self.access_token.write() = Some(token.into());
        self
    }

    /// Current access token, if signed in.
    pub fn access_token(&self) -> Option<String> {
        self.access_token.read().clone()
    }

    /// Exchange email and password for a session and keep its token.
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, BackendError> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");
        let response = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let session: Session = decode(check(response).await?).await?;
        *self.access_token.write() = Some(session.access_token.clone());
        debug!(user = %session.user.id, "signed in");
        Ok(session)
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        Ok(self.base.join(path)?)
    }

    fn table(&self, table: &str) -> Result<Url, BackendError> {
        self.endpoint(&format!("rest/v1/{table}"))
    }

    fn content_target(&self, kind: ContentKind) -> &ContentTarget {
        match kind {
            ContentKind::Gallery => &self.content.gallery,
            ContentKind::Blog => &self.content.blog,
            ContentKind::Members => &self.content.members,
        }
    }

    fn authorised(&self, request: RequestBuilder) -> RequestBuilder {
        let token = self
            .access_token
            .read()
            .clone()
            .unwrap_or_else(|| self.anon_key.clone());
        request.header("apikey", &self.anon_key).bearer_auth(token)
    }

    fn require_token(&self) -> Result<(), BackendError> {
        if self.access_token.read().is_some() {
            Ok(())
        } else {
            Err(BackendError::Unauthorized("Auth session missing!".to_owned()))
        }
    }

    async fn fetch_user(&self) -> Result<AuthUser, BackendError> {
        self.require_token()?;
        let response = self
            .authorised(self.http.get(self.endpoint("auth/v1/user")?))
            .send()
            .await?;
        decode(check(response).await?).await
    }

    /// Remove one object from `bucket`. A missing object counts as removed.
    async fn remove_media(&self, bucket: &str, path: &str) -> Result<(), BackendError> {
        let response = self
            .authorised(self.http.delete(self.endpoint(&format!("storage/v1/object/{bucket}"))?))
            .json(&json!({ "prefixes": [path] }))
            .send()
            .await?;
        match check(response).await {
            Ok(_) => {
                debug!(bucket, path, "media removed");
                Ok(())
            }
            Err(err) if is_not_found(&err) => {
                debug!(bucket, path, "media already gone");
                Ok(())
            }
            Err(err) => Err(BackendError::Storage(err.to_string())),
        }
    }
}

#[async_trait]
impl IdentityService for HostedBackend {
    async fn get_session(&self) -> Result<Option<Session>, BackendError> {
        let Some(token) = self.access_token() else {
            return Ok(None);
        };
        match self.fetch_user().await {
            Ok(user) => Ok(Some(Session {
                access_token: token,
                user,
            })),
            Err(BackendError::Unauthorized(reason)) => {
                debug!(%reason, "stored token rejected");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    async fn get_current_user(&self) -> Result<AuthUser, BackendError> {
        self.fetch_user().await
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        if self.access_token.read().is_some() {
            let response = self
                .authorised(self.http.post(self.endpoint("auth/v1/logout")?))
                .send()
                .await?;
            if let Err(err) = check(response).await {
                // An already-revoked token still counts as signed out.
                if !matches!(err, BackendError::Unauthorized(_)) {
                    return Err(err);
                }
            }
        }
        *self.access_token.write() = None;
        Ok(())
    }

    async fn update_password(&self, password: &str) -> Result<(), BackendError> {
        self.require_token()?;
        let response = self
            .authorised(self.http.put(self.endpoint("auth/v1/user")?))
            .json(&json!({ "password": password }))
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for HostedBackend {
    async fn fetch_profile(&self, user_id: &str) -> Result<Option<ProfileRecord>, BackendError> {
        let response = self
            .authorised(self.http.get(self.table(&self.profiles_table)?))
            .query(&[
                ("select", PROFILE_COLUMNS.to_owned()),
                ("id", format!("eq.{user_id}")),
            ])
            .send()
            .await?;
        let rows: Vec<ProfileRow> = decode(check(response).await?).await?;
        if rows.len() > 1 {
            return Err(BackendError::Decode(format!(
                "expected one profile for {user_id}, got {}",
                rows.len()
            )));
        }
        Ok(rows.into_iter().next().map(ProfileRow::into_record))
    }

    async fn update_profile(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> Result<(), BackendError> {
        if update.is_empty() {
            return Ok(());
        }
        let response = self
            .authorised(self.http.patch(self.table(&self.profiles_table)?))
            .query(&[("id", format!("eq.{user_id}"))])
            .header("Prefer", "return=minimal")
            .json(update)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn list_profiles(&self, filter: &ProfileFilter) -> Result<Vec<Subject>, BackendError> {
        let mut query = vec![
            ("select", LIST_COLUMNS.to_owned()),
            ("order", "full_name.asc.nullslast".to_owned()),
        ];
        if !filter.excluded_roles.is_empty() {
            let excluded = filter
                .excluded_roles
                .iter()
                .map(|role| role.as_str())
                .collect::<Vec<_>>()
                .join(",");
            query.push(("or", format!("(role.is.null,role.not.in.({excluded}))")));
        }
        let response = self
            .authorised(self.http.get(self.table(&self.profiles_table)?))
            .query(&query)
            .send()
            .await?;
        let rows: Vec<ProfileRow> = decode(check(response).await?).await?;
        Ok(rows
            .into_iter()
            .map(ProfileRow::into_subject)
            .filter(|subject| filter.admits(subject.role))
            .collect())
    }
}

#[async_trait]
impl PrivilegedFunctions for HostedBackend {
    async fn invoke(&self, name: &str, payload: Value) -> Result<FunctionReply, BackendError> {
        let response = self
            .authorised(self.http.post(self.endpoint(&format!("functions/v1/{name}"))?))
            .json(&payload)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        let parsed: Option<Map<String, Value>> = serde_json::from_str(&body).ok();
        if !status.is_success() {
            let message = parsed
                .as_ref()
                .and_then(|map| text_field(map, &["error", "message"]))
                .unwrap_or_else(|| format!("Server error: {}", status.as_u16()));
            return Err(BackendError::Function {
                name: name.to_owned(),
                message,
            });
        }
        if let Some(error) = parsed.as_ref().and_then(|map| text_field(map, &["error"])) {
            return Err(BackendError::Function {
                name: name.to_owned(),
                message: error,
            });
        }
        Ok(FunctionReply {
            message: parsed.and_then(|map| text_field(&map, &["message"])),
        })
    }
}

#[async_trait]
impl ContentStore for HostedBackend {
    async fn list_items(&self, kind: ContentKind) -> Result<Vec<ContentItem>, BackendError> {
        let target = self.content_target(kind);
        let response = self
            .authorised(self.http.get(self.table(&target.table)?))
            .query(&[("select", "*"), ("order", kind.order_clause())])
            .send()
            .await?;
        let rows: Vec<Map<String, Value>> = decode(check(response).await?).await?;
        Ok(rows.iter().filter_map(ContentItem::from_row).collect())
    }

    async fn fetch_item(
        &self,
        kind: ContentKind,
        id: &str,
    ) -> Result<Option<Map<String, Value>>, BackendError> {
        let target = self.content_target(kind);
        let response = self
            .authorised(self.http.get(self.table(&target.table)?))
            .query(&[("select", "*".to_owned()), ("id", format!("eq.{id}"))])
            .send()
            .await?;
        let mut rows: Vec<Map<String, Value>> = decode(check(response).await?).await?;
        if rows.len() > 1 {
            return Err(BackendError::Decode(format!(
                "expected one {} row for {id}, got {}",
                target.table,
                rows.len()
            )));
        }
        Ok(rows.pop())
    }

    async fn update_item(
        &self,
        kind: ContentKind,
        id: &str,
        patch: &ContentPatch,
    ) -> Result<(), BackendError> {
        let target = self.content_target(kind);
        let response = self
            .authorised(self.http.patch(self.table(&target.table)?))
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=minimal")
            .json(patch)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn delete_item(&self, kind: ContentKind, item: &ContentItem) -> Result<(), BackendError> {
        let target = self.content_target(kind);
        if let Some(path) = item.media_path(&target.bucket) {
            match self.remove_media(&target.bucket, &path).await {
                Ok(()) => {}
                Err(err) if kind.strict_media_cleanup() => return Err(err),
                Err(err) => {
                    warn!(bucket = %target.bucket, path = %path, error = %err, "could not remove media")
                }
            }
        }
        let response = self
            .authorised(self.http.delete(self.table(&target.table)?))
            .query(&[("id", format!("eq.{}", item.id))])
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }
}

async fn check(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Map<String, Value>>(&body)
        .ok()
        .and_then(|map| {
            text_field(
                &map,
                &["message", "msg", "error_description", "error"],
            )
        })
        .unwrap_or_else(|| format!("Server error: {}", status.as_u16()));
    Err(match status {
        StatusCode::UNAUTHORIZED => BackendError::Unauthorized(message),
        _ => BackendError::Http {
            status: status.as_u16(),
            message,
        },
    })
}

async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|err| BackendError::Decode(err.to_string()))
}

fn text_field(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| map.get(*key))
        .find_map(|value| value.as_str().map(str::to_owned))
}

fn is_not_found(err: &BackendError) -> bool {
    match err {
        BackendError::NotFound => true,
        BackendError::Http { status, message } => {
            *status == 404 || message.to_ascii_lowercase().contains("not found")
        }
        _ => false,
    }
}
