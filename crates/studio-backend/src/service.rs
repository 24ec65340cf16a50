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
use serde_json::{Map, Value};
use studio_security::{ProfileFilter, Subject};

use crate::error::BackendError;
use crate::model::{
    AuthUser, ContentItem, ContentKind, ContentPatch, FunctionReply, ProfileRecord, ProfileUpdate,
    Session,
};

/// Hosted authentication and session service.
#[async_trait]
pub trait IdentityService: Send + Sync + 'static {
    /// Current session, `None` when signed out or expired.
    async fn get_session(&self) -> Result<Option<Session>, BackendError>;

    /// Account behind the current session.
    async fn get_current_user(&self) -> Result<AuthUser, BackendError>;

    /// End the current session.
    async fn sign_out(&self) -> Result<(), BackendError>;

    /// Change the caller's own password.
    async fn update_password(&self, password: &str) -> Result<(), BackendError>;
}

/// Row-level-secured profile table.
#[async_trait]
pub trait ProfileStore: Send + Sync + 'static {
    /// Exactly one profile by id. `Ok(None)` when no row matches.
    async fn fetch_profile(&self, user_id: &str) -> Result<Option<ProfileRecord>, BackendError>;

    /// Write the set columns of `update`.
    async fn update_profile(&self, user_id: &str, update: &ProfileUpdate)
        -> Result<(), BackendError>;

    /// Profiles ordered by full name ascending, unnamed rows last, without rows
    /// the filter excludes.
    async fn list_profiles(&self, filter: &ProfileFilter) -> Result<Vec<Subject>, BackendError>;
}

/// Privileged edge functions. These are the authoritative enforcement point
/// for invitations and deletions.
#[async_trait]
pub trait PrivilegedFunctions: Send + Sync + 'static {
    /// Invoke `name` with a JSON body.
    async fn invoke(&self, name: &str, payload: Value) -> Result<FunctionReply, BackendError>;
}

/// Gallery, blog and team member tables with their media buckets.
#[async_trait]
pub trait ContentStore: Send + Sync + 'static {
    /// Rows of one content table in display order.
    async fn list_items(&self, kind: ContentKind) -> Result<Vec<ContentItem>, BackendError>;

    /// Full row `id` of `kind`, or `None` when absent.
    async fn fetch_item(
        &self,
        kind: ContentKind,
        id: &str,
    ) -> Result<Option<Map<String, Value>>, BackendError>;
    /// Write the set columns of `patch` to row `id`.
    async fn update_item(
        &self,
        kind: ContentKind,
        id: &str,
        patch: &ContentPatch,
    ) -> Result<(), BackendError>;
    /// Remove the row and its media object. A missing object is tolerated;
    /// other storage failures abort the delete only for kinds with
    /// [`ContentKind::strict_media_cleanup`].
    async fn delete_item(&self, kind: ContentKind, item: &ContentItem) -> Result<(), BackendError>;
}
