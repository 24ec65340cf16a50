//! ---
//! studio_section: "02-console-core"
//! studio_subsection: "module"
//! studio_type: "source"
//! studio_scope: "code"
//! studio_description: "Console workflows over the access-control model."
//! studio_version: "v0.1.0"
//! studio_owner: "tbd"
//! ---
//! The caller's own account page. Self-edits are allowed here; the
//! management rows are where self-action is refused.

use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use studio_backend::{BackendError, ProfileUpdate, Session};
use studio_security::{ConsoleAction, Role};
use tracing::{info, warn};

use crate::error::ConsoleError;
use crate::latch::ControlId;
use crate::services::ConsoleServices;
use crate::status::StatusMessage;

/// Minimum password length accepted by the form.
pub const MIN_PASSWORD_LEN: usize = 6;

/// What the account page shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountProfile {
    /// Caller's account id.
    pub user_id: String,
    /// Login email.
    pub email: Option<String>,
    /// Full name, empty when unset.
    pub full_name: String,
    /// Persisted role.
    pub role: Option<Role>,
    /// Role as shown, e.g. `Super admin`. Missing roles read as `Member`.
    pub role_label: String,
    /// AI tools enabled.
    pub ai_access: bool,
}

/// Own-account workflows.
pub struct Account {
    services: Arc<ConsoleServices>,
}

impl Account {
    /// Account page over `services`.
    pub fn new(services: Arc<ConsoleServices>) -> Self {
        Self { services }
    }

    async fn session(&self) -> Result<Session, ConsoleError> {
        match self.services.identity.get_session().await {
            Ok(Some(session)) => Ok(session),
            Ok(None) => Err(ConsoleError::SessionMissing),
            Err(err) => {
                warn!(error = %err, "session check failed");
                Err(ConsoleError::SessionMissing)
            }
        }
    }

    /// Load the caller's profile.
    pub async fn load(&self) -> Result<AccountProfile, ConsoleError> {
        let session = self.session().await?;
        let record = self
            .services
            .profiles
            .fetch_profile(&session.user.id)
            .await
            .map_err(|err| ConsoleError::LoadFailed(err.to_string()))?
            .ok_or_else(|| ConsoleError::LoadFailed(BackendError::NotFound.to_string()))?;
        Ok(AccountProfile {
            role_label: record.role.unwrap_or(Role::Member).display_name(),
            user_id: session.user.id,
            email: session.user.email,
            full_name: record.full_name.unwrap_or_default(),
            role: record.role,
            ai_access: record.ai_access.unwrap_or(false),
        })
    }

    /// Update the caller's own name. Surrounding whitespace is dropped.
    pub async fn rename(&self, full_name: &str) -> Result<StatusMessage, ConsoleError> {
        let session = self.session().await?;
        let _latch = self.services.latches.acquire(ControlId::AccountName)?;
        let name = full_name.trim();
        self.services
            .profiles
            .update_profile(
                &session.user.id,
                &ProfileUpdate {
                    full_name: Some(name.to_owned()),
                    role: None,
                },
            )
            .await
            .map_err(|err| ConsoleError::WriteFailed(err.to_string()))?;
        self.services.hooks.audit(
            &session.user.id,
            ConsoleAction::Rename,
            &session.user.id,
            json!({ "to": name, "own_account": true }),
        );
        info!(user = %session.user.id, "own name updated");
        Ok(StatusMessage::success("Your name has been updated successfully!"))
    }

    /// Change the caller's password after local validation.
    pub async fn change_password(
        &self,
        password: &str,
        confirmation: &str,
    ) -> Result<StatusMessage, ConsoleError> {
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ConsoleError::InvalidInput(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters long."
            )));
        }
        if password != confirmation {
            return Err(ConsoleError::InvalidInput("Passwords do not match.".to_owned()));
        }
        let _latch = self.services.latches.acquire(ControlId::AccountPassword)?;
        self.services
            .identity
            .update_password(password)
            .await
            .map_err(|err| match err {
                BackendError::Unauthorized(_) => ConsoleError::SessionMissing,
                other => ConsoleError::WriteFailed(other.to_string()),
            })?;
        info!("password updated");
        Ok(StatusMessage::success("Password updated successfully!"))
    }

    /// End the session and return the login destination.
    pub async fn sign_out(&self) -> Result<String, ConsoleError> {
        let _latch = self.services.latches.acquire(ControlId::SignOut)?;
        self.services
            .identity
            .sign_out()
            .await
            .map_err(|err| ConsoleError::WriteFailed(format!("Logout failed: {err}")))?;
        Ok(self.services.settings.redirects.login.clone())
    }
}
