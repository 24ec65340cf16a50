//! ---
//! studio_section: "06-security-access-control"
//! studio_subsection: "module"
//! studio_type: "source"
//! studio_scope: "code"
//! studio_description: "Access-control lattice, capability rules and audit trail."
//! studio_version: "v0.1.0"
//! studio_owner: "tbd"
//! ---
//! Mutation guards evaluated at submission time.
//!
//! Render-time capabilities decide which controls are enabled; the guards
//! here run again when a change is submitted, against the subject's freshly
//! fetched role.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capability::{assignable_roles, capabilities};
use crate::principal::Actor;
use crate::role::Role;
use crate::section::Section;

/// The rule that rejected an action. Each variant renders as the reason shown
/// next to the control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
#[serde(tag = "rule", content = "detail", rename_all = "snake_case")]
pub enum DenialRule {
    /// Actor targeted their own account.
    #[error("you cannot change or delete your own account here")]
    SelfAction,
    /// Non-owner tried to grant ownership.
    #[error("only an owner can grant the owner role")]
    OwnerGrantReserved,
    /// Super admin tried to alter another super admin's role.
    #[error("a super admin cannot change another super admin's role")]
    PeerSuperAdminImmutable,
    /// Admin tried to assign a role above editor.
    #[error("admins can only assign the member or editor role")]
    AdminScopeExceeded,
    /// Subject's role is outside what the actor may manage.
    #[error("your role does not allow managing this user")]
    SubjectOutranksActor,
    /// Actor's role cannot manage users at all.
    #[error("your role does not allow managing users")]
    InsufficientPrivilege,
    /// Role is not in the actor's assignable set.
    #[error("you cannot assign the {0} role")]
    RoleNotAssignable(Role),
    /// Section is hidden for the actor.
    #[error("the {0} section is not available for your role")]
    SectionHidden(Section),
    /// Subject has no recognisable role.
    #[error("this user has no recognised role")]
    UnknownRole,
}

/// Why a guarded mutation was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardError {
    /// A rule fired against the current persisted state.
    #[error("{0}")]
    Denied(DenialRule),
    /// The control was rendered for a role that is no longer persisted.
    #[error("{}", stale_message(.assumed, .persisted, .rule))]
    StaleRole {
        /// Role the control assumed when rendered.
        assumed: Role,
        /// Role currently persisted.
        persisted: Role,
        /// Rule that would also have fired against the persisted role.
        rule: Option<DenialRule>,
    },
}

impl GuardError {
    /// Rule responsible for the refusal, if one fired.
    pub fn rule(&self) -> Option<DenialRule> {
        match self {
            GuardError::Denied(rule) => Some(*rule),
            GuardError::StaleRole { rule, .. } => *rule,
        }
    }
}

fn stale_message(assumed: &Role, persisted: &Role, rule: &Option<DenialRule>) -> String {
    let base = format!(
        "this user's role changed to {} since the list was loaded (shown as {})",
        persisted.display_name(),
        assumed.display_name()
    );
    match rule {
        Some(rule) => format!("{base}; {rule}"),
        None => base,
    }
}

/// Rule that rejects moving a subject from `persisted` to `requested`, if any.
///
/// Explicit escalation rules are checked first so the message names the
/// precise restriction; the capability table is the final gate for actual
/// changes.
pub fn role_change_rule(actor: Role, persisted: Role, requested: Role) -> Option<DenialRule> {
    let changing = requested != persisted;
    match actor {
        Role::Owner => return None,
        Role::SuperAdmin => {
            if requested == Role::Owner {
                return Some(DenialRule::OwnerGrantReserved);
            }
            if persisted == Role::SuperAdmin && changing {
                return Some(DenialRule::PeerSuperAdminImmutable);
            }
        }
        Role::Admin => {
            if requested >= Role::Admin {
                return Some(DenialRule::AdminScopeExceeded);
            }
        }
        Role::Editor | Role::Member => return Some(DenialRule::InsufficientPrivilege),
    }
    if changing && !capabilities(actor, persisted, false).can_change_role {
        return Some(DenialRule::SubjectOutranksActor);
    }
    None
}

/// Guard a role submission.
///
/// `assumed` is the role the control was rendered with, `persisted` the value
/// fetched immediately before this call. A mismatch is always refused so the
/// operator sees the fresh value before retrying.
pub fn check_role_change(
    actor: &Actor,
    subject_id: &str,
    assumed: Role,
    persisted: Role,
    requested: Role,
) -> Result<(), GuardError> {
    if actor.is_self(subject_id) {
        return Err(GuardError::Denied(DenialRule::SelfAction));
    }
    let rule = role_change_rule(actor.role, persisted, requested);
    if assumed != persisted {
        return Err(GuardError::StaleRole {
            assumed,
            persisted,
            rule,
        });
    }
    match rule {
        Some(rule) => Err(GuardError::Denied(rule)),
        None => Ok(()),
    }
}

/// Guard a name change on a managed row.
pub fn check_rename(actor: &Actor, subject_id: &str, persisted: Role) -> Result<(), GuardError> {
    if actor.is_self(subject_id) {
        return Err(GuardError::Denied(DenialRule::SelfAction));
    }
    if capabilities(actor.role, persisted, false).can_modify_name {
        Ok(())
    } else {
        Err(GuardError::Denied(denial_for(actor.role)))
    }
}

/// Guard the delete button. Requires both the table's delete column and the
/// role-change gate; the privileged function re-checks authoritatively.
pub fn check_delete(
    actor: &Actor,
    subject_id: &str,
    subject_role: Option<Role>,
) -> Result<(), GuardError> {
    if actor.is_self(subject_id) {
        return Err(GuardError::Denied(DenialRule::SelfAction));
    }
    let Some(subject_role) = subject_role else {
        return Err(GuardError::Denied(DenialRule::UnknownRole));
    };
    let caps = capabilities(actor.role, subject_role, false);
    if caps.can_delete && caps.can_change_role {
        Ok(())
    } else {
        Err(GuardError::Denied(denial_for(actor.role)))
    }
}

/// Guard the role picked in the invite form.
pub fn check_invite_role(actor: Role, requested: Role) -> Result<(), GuardError> {
    if assignable_roles(actor).contains(&requested) {
        return Ok(());
    }
    let rule = if actor < Role::Admin {
        DenialRule::InsufficientPrivilege
    } else if requested == Role::Owner {
        DenialRule::OwnerGrantReserved
    } else {
        DenialRule::RoleNotAssignable(requested)
    };
    Err(GuardError::Denied(rule))
}

fn denial_for(actor: Role) -> DenialRule {
    if actor < Role::Admin {
        DenialRule::InsufficientPrivilege
    } else {
        DenialRule::SubjectOutranksActor
    }
}
