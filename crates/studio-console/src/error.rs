//! ---
//! studio_section: "02-console-core"
//! studio_subsection: "module"
//! studio_type: "source"
//! studio_scope: "code"
//! studio_description: "Console workflows over the access-control model."
//! studio_version: "v0.1.0"
//! studio_owner: "tbd"
//! ---
use studio_security::{DenialRule, GuardError, Role};
use thiserror::Error;

use crate::latch::ControlId;
use crate::status::StatusMessage;

/// Message rendered when the caller's profile carries no usable role.
pub const ROLE_ABSENT_MESSAGE: &str =
    "Your user profile does not have a role assigned. Please contact support.";

/// Every way a console operation can fail. Each variant renders as the text
/// shown to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsoleError {
    /// No authenticated session. Terminal: redirect to login.
    #[error("Authentication required.")]
    SessionMissing,
    /// Role lookup failed for a reason other than a missing profile.
    #[error("Error fetching permissions: {0}")]
    RoleFetchFailed(String),
    /// Profile exists without a recognisable role, or does not exist. Terminal.
    #[error("{}", ROLE_ABSENT_MESSAGE)]
    RoleAbsent,
    /// A permission rule refused the action before any write.
    #[error("{0}")]
    PermissionDenied(DenialRule),
    /// The persisted role differs from the one the control was rendered with.
    #[error("{}", stale_text(.assumed, .persisted, .rule))]
    StaleRoleConflict {
        /// Role shown when the control was rendered.
        assumed: Role,
        /// Role persisted at submission time.
        persisted: Role,
        /// Rule that also fires against the persisted role, if any.
        rule: Option<DenialRule>,
    },
    /// Profile write rejected by the backend.
    #[error("Error: {0}")]
    WriteFailed(String),
    /// Privileged delete rejected by the backend.
    #[error("Error: {0}")]
    DeleteFailed(String),
    /// Invitation rejected by the backend.
    #[error("Error: {0}")]
    InviteFailed(String),
    /// Form validation failed.
    #[error("{0}")]
    InvalidInput(String),
    /// The control already has a request in flight.
    #[error("already {0}")]
    ControlBusy(ControlId),
    /// A section's data could not be loaded.
    #[error("Failed to load content: {0}")]
    LoadFailed(String),
}

fn stale_text(assumed: &Role, persisted: &Role, rule: &Option<DenialRule>) -> String {
    GuardError::StaleRole {
        assumed: *assumed,
        persisted: *persisted,
        rule: *rule,
    }
    .to_string()
}

impl ConsoleError {
    /// Whether the session cannot continue.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConsoleError::SessionMissing | ConsoleError::RoleAbsent)
    }

    /// Rule behind a local refusal.
    pub fn rule(&self) -> Option<DenialRule> {
        match self {
            ConsoleError::PermissionDenied(rule) => Some(*rule),
            ConsoleError::StaleRoleConflict { rule, .. } => *rule,
            _ => None,
        }
    }

    /// Status line for the control.
    pub fn status(&self) -> StatusMessage {
        StatusMessage::error(self.to_string())
    }
}

impl From<GuardError> for ConsoleError {
    fn from(err: GuardError) -> Self {
        match err {
            GuardError::Denied(rule) => ConsoleError::PermissionDenied(rule),
            GuardError::StaleRole {
                assumed,
                persisted,
                rule,
            } => ConsoleError::StaleRoleConflict {
                assumed,
                persisted,
                rule,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_errors_keep_their_reason() {
        let err = ConsoleError::from(GuardError::Denied(DenialRule::AdminScopeExceeded));
        assert_eq!(
            err.to_string(),
            "admins can only assign the member or editor role"
        );
        assert_eq!(err.rule(), Some(DenialRule::AdminScopeExceeded));

        let stale = ConsoleError::from(GuardError::StaleRole {
            assumed: Role::Editor,
            persisted: Role::SuperAdmin,
            rule: Some(DenialRule::PeerSuperAdminImmutable),
        });
        let text = stale.to_string();
        assert!(text.contains("Super admin"));
        assert!(text.contains("another super admin"));
        assert!(stale.status().is_error());
    }

    #[test]
    fn terminal_errors() {
        assert!(ConsoleError::RoleAbsent.is_terminal());
        assert!(ConsoleError::SessionMissing.is_terminal());
        assert!(!ConsoleError::WriteFailed("x".into()).is_terminal());
        assert_eq!(ConsoleError::RoleAbsent.to_string(), ROLE_ABSENT_MESSAGE);
    }
}
