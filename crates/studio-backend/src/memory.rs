//! ---
//! studio_section: "05-external-interfaces"
//! studio_subsection: "module"
//! studio_type: "source"
//! studio_scope: "code"
//! studio_description: "Hosted backend collaborators consumed by the console."
//! studio_version: "v0.1.0"
//! studio_owner: "tbd"
//! ---
use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use studio_common::FunctionsConfig;
use studio_security::{ProfileFilter, Role, Subject};

use crate::error::BackendError;
use crate::model::{
    AuthUser, ContentItem, ContentKind, ContentPatch, FunctionReply, ProfileRecord, ProfileUpdate,
    Session,
};
use crate::service::{ContentStore, IdentityService, PrivilegedFunctions, ProfileStore};

#[derive(Debug, Clone, Default)]
struct StoredProfile {
    full_name: Option<String>,
    email: Option<String>,
    role: Option<String>,
    ai_access: Option<bool>,
}

#[derive(Debug, Default)]
struct Failures {
    fetch_profile: Option<String>,
    update_profile: Option<String>,
    list_profiles: Option<String>,
    list_items: Option<String>,
    update_item: Option<String>,
    media_removal: Option<String>,
    functions: HashMap<String, String>,
}

#[derive(Debug, Default)]
struct MemoryState {
    session: Option<Session>,
    profiles: BTreeMap<String, StoredProfile>,
    content: HashMap<ContentKind, Vec<Map<String, Value>>>,
    invocations: Vec<(String, Value)>,
    replies: HashMap<String, String>,
    passwords: HashMap<String, String>,
    failures: Failures,
    calls: Vec<String>,
}

/// In-process backend that implements every collaborator trait over shared
/// state, records each call and supports failure injection. Roles are stored
/// as raw strings so malformed values can be exercised.
pub struct InMemoryBackend {
    functions: FunctionsConfig,
    state: RwLock<MemoryState>,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    /// Empty backend with no session.
    pub fn new() -> Self {
        Self::with_functions(FunctionsConfig::default())
    }

    /// Empty backend that recognises the given function names.
    pub fn with_functions(functions: FunctionsConfig) -> Self {
        Self {
            functions,
            state: RwLock::new(MemoryState::default()),
        }
    }

    /// Start a session for `user_id`.
    pub fn sign_in(&self, user_id: &str, email: Option<&str>) {
        self.state.write().session = Some(Session {
            access_token: format!("token-{user_id}"),
            user: AuthUser {
                id: user_id.to_owned(),
                email: email.map(str::to_owned),
            },
        });
    }

    /// Insert or replace a profile row. `role` is stored verbatim.
    pub fn insert_profile(
        &self,
        user_id: &str,
        full_name: Option<&str>,
        email: Option<&str>,
        role: Option<&str>,
    ) {
        self.state.write().profiles.insert(
            user_id.to_owned(),
            StoredProfile {
                full_name: full_name.map(str::to_owned),
                email: email.map(str::to_owned),
                role: role.map(str::to_owned),
                ai_access: None,
            },
        );
    }

    /// Change a persisted role out of band, as another operator would.
    pub fn set_role(&self, user_id: &str, role: Option<&str>) {
        if let Some(profile) = self.state.write().profiles.get_mut(user_id) {
            profile.role = role.map(str::to_owned);
        }
    }

    /// Raw persisted role column.
    pub fn stored_role(&self, user_id: &str) -> Option<String> {
        self.state
            .read()
            .profiles
            .get(user_id)
            .and_then(|profile| profile.role.clone())
    }

    /// Persisted full name.
    pub fn stored_name(&self, user_id: &str) -> Option<String> {
        self.state
            .read()
            .profiles
            .get(user_id)
            .and_then(|profile| profile.full_name.clone())
    }

    /// Whether a profile row exists.
    pub fn has_profile(&self, user_id: &str) -> bool {
        self.state.read().profiles.contains_key(user_id)
    }

    /// Add a content row, stored under the kind's column names.
    pub fn insert_content(&self, kind: ContentKind, item: ContentItem) {
        self.insert_row(kind, row_for(kind, &item));
    }

    /// Add a raw content row, such as a blog post with a body.
    pub fn insert_row(&self, kind: ContentKind, row: Map<String, Value>) {
        self.state
            .write()
            .content
            .entry(kind)
            .or_default()
            .push(row);
    }

    /// Rows currently stored for `kind`.
    pub fn content(&self, kind: ContentKind) -> Vec<ContentItem> {
        self.state
            .read()
            .content
            .get(&kind)
            .map(|rows| rows.iter().filter_map(ContentItem::from_row).collect())
            .unwrap_or_default()
    }

    /// Raw row `id` of `kind`.
    pub fn row(&self, kind: ContentKind, id: &str) -> Option<Map<String, Value>> {
        self.state
            .read()
            .content
            .get(&kind)?
            .iter()
            .find(|row| row_id(row).as_deref() == Some(id))
            .cloned()
    }

    /// Make profile fetches fail with `message`.
    pub fn fail_profile_fetch(&self, message: &str) {
        self.state.write().failures.fetch_profile = Some(message.to_owned());
    }

    /// Make profile updates fail with `message`.
    pub fn fail_profile_update(&self, message: &str) {
        self.state.write().failures.update_profile = Some(message.to_owned());
    }

    /// Make profile listing fail with `message`.
    pub fn fail_profile_listing(&self, message: &str) {
        self.state.write().failures.list_profiles = Some(message.to_owned());
    }

    /// Make content listing fail with `message`.
    pub fn fail_content_listing(&self, message: &str) {
        self.state.write().failures.list_items = Some(message.to_owned());
    }

    /// Make content updates fail with `message`.
    pub fn fail_content_update(&self, message: &str) {
        self.state.write().failures.update_item = Some(message.to_owned());
    }

    /// Make media object removal fail with `message`.
    pub fn fail_media_removal(&self, message: &str) {
        self.state.write().failures.media_removal = Some(message.to_owned());
    }

    /// Make function `name` reply with an error field.
    pub fn fail_function(&self, name: &str, message: &str) {
        self.state
            .write()
            .failures
            .functions
            .insert(name.to_owned(), message.to_owned());
    }

    /// Message returned by a successful call to `name`.
    pub fn reply_with(&self, name: &str, message: &str) {
        self.state
            .write()
            .replies
            .insert(name.to_owned(), message.to_owned());
    }

    /// Payloads sent to function `name`, oldest first.
    pub fn invocations(&self, name: &str) -> Vec<Value> {
        self.state
            .read()
            .invocations
            .iter()
            .filter(|(called, _)| called == name)
            .map(|(_, payload)| payload.clone())
            .collect()
    }

    /// Last password set by `user_id`.
    pub fn password(&self, user_id: &str) -> Option<String> {
        self.state.read().passwords.get(user_id).cloned()
    }

    /// Number of calls made to operation `op` (trait method name).
    pub fn call_count(&self, op: &str) -> usize {
        self.state
            .read()
            .calls
            .iter()
            .filter(|call| call.as_str() == op)
            .count()
    }

    /// Every call in order.
    pub fn calls(&self) -> Vec<String> {
        self.state.read().calls.clone()
    }

    /// Forget the call log.
    pub fn reset_calls(&self) {
        self.state.write().calls.clear();
    }

    fn record(&self, op: &str) {
        self.state.write().calls.push(op.to_owned());
    }
}

#[async_trait]
impl IdentityService for InMemoryBackend {
    async fn get_session(&self) -> Result<Option<Session>, BackendError> {
        self.record("get_session");
        Ok(self.state.read().session.clone())
    }

    async fn get_current_user(&self) -> Result<AuthUser, BackendError> {
        self.record("get_current_user");
        self.state
            .read()
            .session
            .as_ref()
            .map(|session| session.user.clone())
            .ok_or_else(|| BackendError::Unauthorized("Auth session missing!".to_owned()))
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        self.record("sign_out");
        self.state.write().session = None;
        Ok(())
    }

    async fn update_password(&self, password: &str) -> Result<(), BackendError> {
        self.record("update_password");
        let mut state = self.state.write();
        let user_id = state
            .session
            .as_ref()
            .map(|session| session.user.id.clone())
            .ok_or_else(|| BackendError::Unauthorized("Auth session missing!".to_owned()))?;
        state.passwords.insert(user_id, password.to_owned());
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for InMemoryBackend {
    async fn fetch_profile(&self, user_id: &str) -> Result<Option<ProfileRecord>, BackendError> {
        self.record("fetch_profile");
        let state = self.state.read();
        if let Some(message) = &state.failures.fetch_profile {
            return Err(BackendError::Http {
                status: 500,
                message: message.clone(),
            });
        }
        Ok(state.profiles.get(user_id).map(|profile| ProfileRecord {
            role: Role::from_column(profile.role.as_deref()),
            full_name: profile.full_name.clone(),
            ai_access: profile.ai_access,
        }))
    }

    async fn update_profile(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> Result<(), BackendError> {
        self.record("update_profile");
        let mut state = self.state.write();
        if let Some(message) = &state.failures.update_profile {
            return Err(BackendError::Http {
                status: 500,
                message: message.clone(),
            });
        }
        // PATCH with no matching row succeeds without effect.
        if let Some(profile) = state.profiles.get_mut(user_id) {
            if let Some(name) = &update.full_name {
                profile.full_name = Some(name.clone());
            }
            if let Some(role) = update.role {
                profile.role = Some(role.as_str().to_owned());
            }
        }
        Ok(())
    }

    async fn list_profiles(&self, filter: &ProfileFilter) -> Result<Vec<Subject>, BackendError> {
        self.record("list_profiles");
        let state = self.state.read();
        if let Some(message) = &state.failures.list_profiles {
            return Err(BackendError::Http {
                status: 500,
                message: message.clone(),
            });
        }
        let mut rows: Vec<Subject> = state
            .profiles
            .iter()
            .map(|(id, profile)| Subject {
                id: id.clone(),
                name: profile.full_name.clone(),
                email: profile.email.clone(),
                role: Role::from_column(profile.role.as_deref()),
            })
            .filter(|subject| filter.admits(subject.role))
            .collect();
        rows.sort_by(|a, b| (a.name.is_none(), &a.name).cmp(&(b.name.is_none(), &b.name)));
        Ok(rows)
    }
}

#[async_trait]
impl PrivilegedFunctions for InMemoryBackend {
    async fn invoke(&self, name: &str, payload: Value) -> Result<FunctionReply, BackendError> {
        self.record(&format!("invoke:{name}"));
        let mut state = self.state.write();
        state.invocations.push((name.to_owned(), payload.clone()));
        if let Some(message) = state.failures.functions.get(name) {
            return Err(BackendError::Function {
                name: name.to_owned(),
                message: message.clone(),
            });
        }
        if name == self.functions.delete_user {
            let removed = payload
                .get("user_id")
                .and_then(Value::as_str)
                .and_then(|id| state.profiles.remove(id));
            if removed.is_none() {
                return Err(BackendError::Function {
                    name: name.to_owned(),
                    message: "User not found".to_owned(),
                });
            }
        }
        Ok(FunctionReply {
            message: state.replies.get(name).cloned(),
        })
    }
}

#[async_trait]
impl ContentStore for InMemoryBackend {
    async fn list_items(&self, kind: ContentKind) -> Result<Vec<ContentItem>, BackendError> {
        self.record("list_items");
        if let Some(message) = &self.state.read().failures.list_items {
            return Err(BackendError::Http {
                status: 500,
                message: message.clone(),
            });
        }
        Ok(self.content(kind))
    }

    async fn fetch_item(
        &self,
        kind: ContentKind,
        id: &str,
    ) -> Result<Option<Map<String, Value>>, BackendError> {
        self.record("fetch_item");
        Ok(self.row(kind, id))
    }

    async fn update_item(
        &self,
        kind: ContentKind,
        id: &str,
        patch: &ContentPatch,
    ) -> Result<(), BackendError> {
        self.record("update_item");
        let mut state = self.state.write();
        if let Some(message) = &state.failures.update_item {
            return Err(BackendError::Http {
                status: 500,
                message: message.clone(),
            });
        }
        let row = state
            .content
            .entry(kind)
            .or_default()
            .iter_mut()
            .find(|row| row_id(row).as_deref() == Some(id))
            .ok_or(BackendError::NotFound)?;
        if let Value::Object(columns) = serde_json::to_value(patch)
            .map_err(|err| BackendError::Decode(err.to_string()))?
        {
            row.extend(columns);
        }
        Ok(())
    }

    async fn delete_item(&self, kind: ContentKind, item: &ContentItem) -> Result<(), BackendError> {
        self.record("delete_item");
        let mut state = self.state.write();
        if item.media_url.is_some() {
            if let Some(message) = &state.failures.media_removal {
                if kind.strict_media_cleanup() {
                    return Err(BackendError::Storage(message.clone()));
                }
            }
        }
        let rows = state.content.entry(kind).or_default();
        let before = rows.len();
        rows.retain(|row| row_id(row).as_deref() != Some(item.id.as_str()));
        if rows.len() == before {
            return Err(BackendError::NotFound);
        }
        Ok(())
    }
}

fn row_id(row: &Map<String, Value>) -> Option<String> {
    ContentItem::from_row(row).map(|item| item.id)
}

fn row_for(kind: ContentKind, item: &ContentItem) -> Map<String, Value> {
    let (title, detail) = match kind {
        ContentKind::Gallery => ("title", "category"),
        ContentKind::Blog => ("title", "author"),
        ContentKind::Members => ("name", "position"),
    };
    let mut row = Map::new();
    row.insert("id".into(), Value::String(item.id.clone()));
    let columns = [
        (title, &item.title),
        (detail, &item.detail),
        ("imageUrl", &item.media_url),
        ("created_at", &item.created_at),
    ];
    for (column, value) in columns {
        if let Some(value) = value {
            row.insert(column.into(), Value::String(value.clone()));
        }
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn seeded() -> InMemoryBackend {
        let backend = InMemoryBackend::new();
        backend.insert_profile("u-1", Some("Olive"), Some("o@example.com"), Some("owner"));
        backend.insert_profile("u-2", None, None, Some("editor"));
        backend.insert_profile("u-3", Some("Ada"), Some("a@example.com"), Some("admin"));
        backend.insert_profile("u-4", Some("Bea"), None, Some("not-a-role"));
        backend
    }

    #[tokio::test]
    async fn listing_sorts_unnamed_last_and_filters() {
        let backend = seeded();
        let rows = backend
            .list_profiles(&ProfileFilter::for_actor(Role::Admin))
            .await
            .unwrap();
        let ids: Vec<_> = rows.iter().map(|row| row.id.as_str()).collect();
        assert_eq!(ids, vec!["u-3", "u-4", "u-2"]);
        assert_eq!(rows[1].role, None);
        assert_eq!(backend.call_count("list_profiles"), 1);
    }

    #[tokio::test]
    async fn out_of_band_role_change_is_visible() {
        let backend = seeded();
        backend.set_role("u-2", Some("super_admin"));
        let record = backend.fetch_profile("u-2").await.unwrap().unwrap();
        assert_eq!(record.role, Some(Role::SuperAdmin));
        assert!(backend.fetch_profile("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_function_removes_profile() {
        let backend = seeded();
        backend.reply_with("delete-user", "gone");
        let reply = backend
            .invoke("delete-user", json!({"user_id": "u-3", "user_email": "a@example.com"}))
            .await
            .unwrap();
        assert_eq!(reply.message.as_deref(), Some("gone"));
        assert!(!backend.has_profile("u-3"));
        let err = backend
            .invoke("delete-user", json!({"user_id": "u-3"}))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "User not found");
        assert_eq!(backend.invocations("delete-user").len(), 2);
    }

    fn post(id: &str) -> Map<String, Value> {
        json!({"id": id, "title": "Launch", "author": "Ana", "content": "draft", "created_at": "2024-05-01"})
            .as_object()
            .cloned()
            .unwrap()
    }

    #[tokio::test]
    async fn post_edits_touch_only_set_columns() {
        let backend = InMemoryBackend::new();
        backend.insert_row(ContentKind::Blog, post("p-1"));
        let row = backend.fetch_item(ContentKind::Blog, "p-1").await.unwrap().unwrap();
        assert_eq!(row["content"], "draft");
        assert!(backend.fetch_item(ContentKind::Blog, "p-2").await.unwrap().is_none());

        let patch = ContentPatch {
            content: Some("final".into()),
            ..ContentPatch::default()
        };
        backend.update_item(ContentKind::Blog, "p-1", &patch).await.unwrap();
        let row = backend.row(ContentKind::Blog, "p-1").unwrap();
        assert_eq!(row["content"], "final");
        assert_eq!(row["author"], "Ana");
        assert!(matches!(
            backend.update_item(ContentKind::Blog, "p-2", &patch).await,
            Err(BackendError::NotFound)
        ));
        assert_eq!(backend.call_count("update_item"), 2);
    }

    #[tokio::test]
    async fn storage_failure_keeps_gallery_rows_only() {
        let backend = InMemoryBackend::new();
        let item = ContentItem {
            id: "1".into(),
            title: Some("Dawn".into()),
            detail: None,
            media_url: Some("https://x/storage/v1/object/public/bucket/a.jpg".into()),
            created_at: None,
        };
        backend.insert_content(ContentKind::Gallery, item.clone());
        backend.insert_content(ContentKind::Blog, item.clone());
        backend.fail_media_removal("bucket offline");

        let err = backend.delete_item(ContentKind::Gallery, &item).await.unwrap_err();
        assert_eq!(err.to_string(), "Storage error: bucket offline");
        assert_eq!(backend.content(ContentKind::Gallery).len(), 1);

        backend.delete_item(ContentKind::Blog, &item).await.unwrap();
        assert!(backend.content(ContentKind::Blog).is_empty());
    }

    #[tokio::test]
    async fn injected_failures_surface() {
        let backend = seeded();
        backend.fail_profile_fetch("connection reset");
        let err = backend.fetch_profile("u-1").await.unwrap_err();
        assert_eq!(err.to_string(), "connection reset");
        assert!(backend.get_current_user().await.is_err());
    }
}
