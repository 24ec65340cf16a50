//! ---
//! studio_section: "02-console-core"
//! studio_subsection: "module"
//! studio_type: "source"
//! studio_scope: "code"
//! studio_description: "Console workflows over the access-control model."
//! studio_version: "v0.1.0"
//! studio_owner: "tbd"
//! ---
//! Managed user rows: listing with capabilities, guarded saves and deletes.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use studio_backend::{BackendError, ProfileUpdate};
use studio_logging::{console_info, log_console_event, ConsoleEventOutcome};
use studio_security::{
    assignable_roles, capabilities, check_delete, check_rename, check_role_change,
    role_change_rule, Capabilities, ConsoleAction, DenialRule, ProfileFilter, Role, Subject,
};

use crate::console::ActorContext;
use crate::error::ConsoleError;
use crate::latch::ControlId;
use crate::services::ConsoleServices;
use crate::status::StatusMessage;

/// One listed user together with what the caller may do to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRow {
    /// Listed account.
    pub subject: Subject,
    /// Whether this row is the caller.
    pub is_self: bool,
    /// Enabled controls. `can_delete` already requires the role-change gate.
    pub capabilities: Capabilities,
    /// Roles offered in the row's picker. Empty when the picker is disabled.
    pub role_options: Vec<Role>,
}

impl UserRow {
    fn build(context: &ActorContext, subject: Subject, current_user: &str) -> Self {
        let is_self = subject.id == current_user || context.actor.is_self(&subject.id);
        let (capabilities, role_options) = match subject.role {
            Some(role) => {
                let caps = capabilities(context.role(), role, is_self);
                let options = if caps.can_change_role {
                    assignable_roles(context.role())
                        .into_iter()
                        .filter(|requested| {
                            role_change_rule(context.role(), role, *requested).is_none()
                        })
                        .collect()
                } else {
                    Vec::new()
                };
                (
                    Capabilities {
                        can_delete: caps.can_delete && caps.can_change_role,
                        ..caps
                    },
                    options,
                )
            }
            None => (Capabilities::NONE, Vec::new()),
        };
        Self {
            subject,
            is_self,
            capabilities,
            role_options,
        }
    }
}

/// A row's Save submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRequest {
    /// Row being saved.
    pub subject_id: String,
    /// Role the picker was rendered with.
    pub assumed_role: Role,
    /// Role selected in the picker.
    pub role: Role,
    /// Contents of the name field.
    pub full_name: String,
}

/// Confirmed save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    /// Status line.
    pub status: StatusMessage,
    /// Role now persisted.
    pub role: Role,
    /// Name now persisted, if one was written.
    pub full_name: Option<String>,
}

/// Refused or failed save. `revert_to` is the persisted role the picker must
/// show again, when it is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRejection {
    /// Why the save did not happen.
    pub error: ConsoleError,
    /// Persisted role to restore in the picker.
    pub revert_to: Option<Role>,
}

impl SaveRejection {
    fn new(error: ConsoleError, revert_to: Option<Role>) -> Self {
        Self { error, revert_to }
    }

    /// Status line for the row.
    pub fn status(&self) -> StatusMessage {
        self.error.status()
    }
}

impl fmt::Display for SaveRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.error.fmt(f)
    }
}

impl std::error::Error for SaveRejection {}

/// A row's Delete submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRequest {
    /// Account to delete.
    pub subject_id: String,
    /// Email shown on the row.
    pub email: Option<String>,
    /// Role shown on the row.
    pub role: Option<Role>,
    /// Operator confirmed the irreversible action.
    pub confirmed: bool,
}

/// User management for one caller.
pub struct UserManager {
    services: Arc<ConsoleServices>,
    context: ActorContext,
}

impl UserManager {
    /// Manager acting as `context`.
    pub fn new(services: Arc<ConsoleServices>, context: ActorContext) -> Self {
        Self { services, context }
    }

    /// Current user, then every profile the caller's filter admits, ordered
    /// by full name with unnamed rows last.
    pub async fn load_rows(&self) -> Result<Vec<UserRow>, ConsoleError> {
        let user = self
            .services
            .identity
            .get_current_user()
            .await
            .map_err(|err| match err {
                BackendError::Unauthorized(_) => ConsoleError::SessionMissing,
                other => ConsoleError::LoadFailed(other.to_string()),
            })?;
        let filter = ProfileFilter::for_actor(self.context.role());
        let subjects = self
            .services
            .profiles
            .list_profiles(&filter)
            .await
            .map_err(|err| ConsoleError::LoadFailed(err.to_string()))?;
        let rows: Vec<UserRow> = subjects
            .into_iter()
            .map(|subject| UserRow::build(&self.context, subject, &user.id))
            .collect();
        console_info!(
            context = self.context.log_context().with_section("profiles"),
            "loaded {} user rows",
            rows.len()
        );
        Ok(rows)
    }

    /// Save name and role together. The persisted role is fetched first and
    /// every guard runs against it; nothing is written unless all pass.
    pub async fn save(&self, request: SaveRequest) -> Result<SaveOutcome, SaveRejection> {
        let ctx = self
            .context
            .log_context()
            .with_section("profiles")
            .with_subject(&request.subject_id);
        let _latch = self
            .services
            .latches
            .acquire(ControlId::SaveRow(request.subject_id.clone()))
            .map_err(|err| SaveRejection::new(err, None))?;

        let record = self
            .services
            .profiles
            .fetch_profile(&request.subject_id)
            .await
            .map_err(|err| SaveRejection::new(ConsoleError::WriteFailed(err.to_string()), None))?
            .ok_or_else(|| {
                SaveRejection::new(ConsoleError::WriteFailed("profile not found".into()), None)
            })?;
        let Some(persisted) = record.role else {
            let err = ConsoleError::PermissionDenied(DenialRule::UnknownRole);
            self.services.hooks.refused(&ctx, "profile.save", &err);
            return Err(SaveRejection::new(err, None));
        };

        let name = request.full_name.trim();
        let name_changed = !name.is_empty() && record.full_name.as_deref() != Some(name);
        let guarded = check_role_change(
            &self.context.actor,
            &request.subject_id,
            request.assumed_role,
            persisted,
            request.role,
        )
        .and_then(|()| {
            if name_changed {
                check_rename(&self.context.actor, &request.subject_id, persisted)
            } else {
                Ok(())
            }
        });
        if let Err(err) = guarded {
            let err = ConsoleError::from(err);
            self.services.hooks.refused(&ctx, "profile.save", &err);
            return Err(SaveRejection::new(err, Some(persisted)));
        }

        let update = ProfileUpdate {
            full_name: (!name.is_empty()).then(|| name.to_owned()),
            role: Some(request.role),
        };
        if let Err(err) = self
            .services
            .profiles
            .update_profile(&request.subject_id, &update)
            .await
        {
            let err = ConsoleError::WriteFailed(err.to_string());
            log_console_event(Some(&ctx), "profile.save", &err.to_string(), ConsoleEventOutcome::Fault);
            return Err(SaveRejection::new(err, Some(persisted)));
        }

        let actor = &self.context.actor.id;
        if request.role != persisted {
            self.services.hooks.audit(
                actor,
                ConsoleAction::RoleChange,
                &request.subject_id,
                json!({ "from": persisted, "to": request.role }),
            );
        }
        if name_changed {
            self.services.hooks.audit(
                actor,
                ConsoleAction::Rename,
                &request.subject_id,
                json!({ "from": record.full_name, "to": name }),
            );
        }
        log_console_event(Some(&ctx), "profile.save", "profile updated", ConsoleEventOutcome::Success);
        Ok(SaveOutcome {
            status: StatusMessage::success(format!(
                "Successfully updated profile for {}.",
                if name.is_empty() { "user" } else { name }
            )),
            role: request.role,
            full_name: update.full_name,
        })
    }

    /// Delete an account through the privileged function. Only the gate runs
    /// here; the function is the authoritative check.
    pub async fn delete(&self, request: DeleteRequest) -> Result<StatusMessage, ConsoleError> {
        let ctx = self
            .context
            .log_context()
            .with_section("profiles")
            .with_subject(&request.subject_id);
        if !request.confirmed {
            return Err(ConsoleError::InvalidInput(
                "Deletion must be confirmed.".to_owned(),
            ));
        }
        if let Err(err) = check_delete(&self.context.actor, &request.subject_id, request.role) {
            let err = ConsoleError::from(err);
            self.services.hooks.refused(&ctx, "user.delete", &err);
            return Err(err);
        }
        let _latch = self
            .services
            .latches
            .acquire(ControlId::DeleteRow(request.subject_id.clone()))?;

        let email = request.email.as_deref().unwrap_or("No Email");
        let reply = self
            .services
            .functions
            .invoke(
                &self.services.settings.functions.delete_user,
                json!({ "user_id": request.subject_id, "user_email": email }),
            )
            .await
            .map_err(|err| {
                let err = ConsoleError::DeleteFailed(err.to_string());
                log_console_event(Some(&ctx), "user.delete", &err.to_string(), ConsoleEventOutcome::Fault);
                err
            })?;

        self.services.hooks.audit(
            &self.context.actor.id,
            ConsoleAction::UserDelete,
            &request.subject_id,
            json!({ "email": request.email, "role": request.role }),
        );
        log_console_event(Some(&ctx), "user.delete", "user deleted", ConsoleEventOutcome::Success);
        Ok(StatusMessage::success(
            reply
                .message
                .unwrap_or_else(|| format!("Successfully deleted {email}.")),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use studio_backend::InMemoryBackend;
    use studio_security::{Actor, AuditLog};

    use crate::services::ConsoleSettings;

    fn setup(actor_role: Role) -> (Arc<InMemoryBackend>, UserManager) {
        let backend = Arc::new(InMemoryBackend::new());
        backend.sign_in("me", Some("me@example.com"));
        backend.insert_profile("me", Some("Me"), Some("me@example.com"), Some(actor_role.as_str()));
        backend.insert_profile("ed", Some("Eddie"), Some("ed@example.com"), Some("editor"));
        backend.insert_profile("ad", Some("Ada"), Some("ada@example.com"), Some("admin"));
        backend.insert_profile("sa", Some("Sam"), Some("sam@example.com"), Some("super_admin"));
        backend.insert_profile("ow", None, Some("own@example.com"), Some("owner"));
        let services = Arc::new(ConsoleServices::new(backend.clone(), ConsoleSettings::default()));
        let manager = UserManager::new(services, ActorContext::new(Actor::new("me", actor_role)));
        (backend, manager)
    }

    fn row<'a>(rows: &'a [UserRow], id: &str) -> &'a UserRow {
        rows.iter().find(|row| row.subject.id == id).unwrap()
    }

    #[tokio::test]
    async fn rows_follow_the_capability_table() {
        let (_, manager) = setup(Role::SuperAdmin);
        let rows = manager.load_rows().await.unwrap();
        assert!(rows.iter().all(|row| row.subject.id != "ow"));

        let me = row(&rows, "me");
        assert!(me.is_self);
        assert_eq!(me.capabilities, Capabilities::NONE);

        let peer = row(&rows, "sa");
        assert!(peer.capabilities.can_modify_name);
        assert!(!peer.capabilities.can_change_role);
        assert!(!peer.capabilities.can_delete);
        assert!(peer.role_options.is_empty());

        let admin = row(&rows, "ad");
        assert_eq!(admin.capabilities, Capabilities::ALL);
        assert_eq!(
            admin.role_options,
            vec![Role::Member, Role::Editor, Role::Admin, Role::SuperAdmin]
        );
    }

    #[tokio::test]
    async fn stale_role_is_rejected_and_reverted() {
        let (backend, manager) = setup(Role::Owner);
        backend.set_role("ed", Some("admin"));
        let rejection = manager
            .save(SaveRequest {
                subject_id: "ed".into(),
                assumed_role: Role::Editor,
                role: Role::Member,
                full_name: "Eddie".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            rejection.error,
            ConsoleError::StaleRoleConflict {
                assumed: Role::Editor,
                persisted: Role::Admin,
                rule: None
            }
        ));
        assert_eq!(rejection.revert_to, Some(Role::Admin));
        assert_eq!(backend.call_count("update_profile"), 0);
    }

    #[tokio::test]
    async fn save_writes_name_and_role_and_audits() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(InMemoryBackend::new());
        backend.insert_profile("ed", Some("Eddie"), None, Some("editor"));
        let services = ConsoleServices::new(backend.clone(), ConsoleSettings::default())
            .with_audit(AuditLog::open(dir.path().join("audit.log")).unwrap());
        let manager = UserManager::new(
            Arc::new(services),
            ActorContext::new(Actor::new("boss", Role::Admin)),
        );
        let outcome = manager
            .save(SaveRequest {
                subject_id: "ed".into(),
                assumed_role: Role::Editor,
                role: Role::Member,
                full_name: "  Edward ".into(),
            })
            .await
            .unwrap();
        assert_eq!(outcome.status.text, "Successfully updated profile for Edward.");
        assert_eq!(backend.stored_role("ed").as_deref(), Some("member"));
        assert_eq!(backend.stored_name("ed").as_deref(), Some("Edward"));

        let log = AuditLog::open(dir.path().join("audit.log")).unwrap();
        let actions: Vec<_> = log.entries().unwrap().into_iter().map(|e| e.action).collect();
        assert_eq!(actions, vec![ConsoleAction::RoleChange, ConsoleAction::Rename]);
        assert!(log.verify().unwrap());
    }

    #[tokio::test]
    async fn write_failure_leaves_state_unchanged() {
        let (backend, manager) = setup(Role::Owner);
        backend.fail_profile_update("row-level security violation");
        let rejection = manager
            .save(SaveRequest {
                subject_id: "ad".into(),
                assumed_role: Role::Admin,
                role: Role::Editor,
                full_name: "Ada".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(
            rejection.error,
            ConsoleError::WriteFailed("row-level security violation".into())
        );
        assert_eq!(rejection.status().text, "Error: row-level security violation");
        assert_eq!(backend.stored_role("ad").as_deref(), Some("admin"));
    }

    #[tokio::test]
    async fn delete_requires_confirmation_and_gate() {
        let (backend, manager) = setup(Role::SuperAdmin);
        let unconfirmed = manager
            .delete(DeleteRequest {
                subject_id: "ad".into(),
                email: Some("ada@example.com".into()),
                role: Some(Role::Admin),
                confirmed: false,
            })
            .await
            .unwrap_err();
        assert!(matches!(unconfirmed, ConsoleError::InvalidInput(_)));

        let peer = manager
            .delete(DeleteRequest {
                subject_id: "sa".into(),
                email: Some("sam@example.com".into()),
                role: Some(Role::SuperAdmin),
                confirmed: true,
            })
            .await
            .unwrap_err();
        assert!(matches!(peer, ConsoleError::PermissionDenied(_)));
        assert_eq!(backend.call_count("invoke:delete-user"), 0);

        let status = manager
            .delete(DeleteRequest {
                subject_id: "ad".into(),
                email: Some("ada@example.com".into()),
                role: Some(Role::Admin),
                confirmed: true,
            })
            .await
            .unwrap();
        assert_eq!(status.text, "Successfully deleted ada@example.com.");
        assert_eq!(
            backend.invocations("delete-user"),
            vec![json!({"user_id": "ad", "user_email": "ada@example.com"})]
        );
        assert!(!backend.has_profile("ad"));
    }

    #[tokio::test]
    async fn delete_failure_surfaces_function_message() {
        let (backend, manager) = setup(Role::Owner);
        backend.fail_function("delete-user", "Only owners may delete owners");
        let err = manager
            .delete(DeleteRequest {
                subject_id: "ed".into(),
                email: None,
                role: Some(Role::Editor),
                confirmed: true,
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Error: Only owners may delete owners");
        assert!(backend.has_profile("ed"));
    }
}
