//! ---
//! studio_section: "02-console-core"
//! studio_subsection: "module"
//! studio_type: "source"
//! studio_scope: "code"
//! studio_description: "Console workflows over the access-control model."
//! studio_version: "v0.1.0"
//! studio_owner: "tbd"
//! ---
use std::sync::Arc;

use serde_json::json;
use studio_logging::{log_console_event, ConsoleEventOutcome};
use studio_security::{assignable_roles, check_invite_role, ConsoleAction, Role};

use crate::console::ActorContext;
use crate::error::ConsoleError;
use crate::latch::ControlId;
use crate::services::ConsoleServices;
use crate::status::StatusMessage;

const MISSING_FIELDS: &str = "Please enter an email address and select a role.";

/// Invitation form for one caller.
pub struct Inviter {
    services: Arc<ConsoleServices>,
    context: ActorContext,
}

impl Inviter {
    /// Inviter acting as `context`.
    pub fn new(services: Arc<ConsoleServices>, context: ActorContext) -> Self {
        Self { services, context }
    }

    /// Roles the picker offers. Owner appears only for owners.
    pub fn assignable(&self) -> Vec<Role> {
        assignable_roles(self.context.role())
    }

    /// Send an invitation through the privileged function.
    pub async fn invite(&self, email: &str, role: Option<Role>) -> Result<StatusMessage, ConsoleError> {
        let email = email.trim();
        let role = match role {
            Some(role) if !email.is_empty() => role,
            _ => return Err(ConsoleError::InvalidInput(MISSING_FIELDS.to_owned())),
        };
        let ctx = self
            .context
            .log_context()
            .with_section("invite")
            .with_subject(email);
        if let Err(err) = check_invite_role(self.context.role(), role) {
            let err = ConsoleError::from(err);
            self.services.hooks.refused(&ctx, "user.invite", &err);
            return Err(err);
        }
        let _latch = self.services.latches.acquire(ControlId::Invite)?;

        let reply = self
            .services
            .functions
            .invoke(
                &self.services.settings.functions.invite_user,
                json!({ "email": email, "role": role }),
            )
            .await
            .map_err(|err| {
                let err = ConsoleError::InviteFailed(err.to_string());
                log_console_event(Some(&ctx), "user.invite", &err.to_string(), ConsoleEventOutcome::Fault);
                err
            })?;

        self.services.hooks.audit(
            &self.context.actor.id,
            ConsoleAction::Invite,
            email,
            json!({ "role": role }),
        );
        log_console_event(Some(&ctx), "user.invite", "invitation sent", ConsoleEventOutcome::Success);
        Ok(StatusMessage::success(
            reply
                .message
                .unwrap_or_else(|| "Invitation sent successfully!".to_owned()),
        ))
    }
}
