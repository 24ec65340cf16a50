//! ---
//! studio_section: "06-security-access-control"
//! studio_subsection: "module"
//! studio_type: "source"
//! studio_scope: "code"
//! studio_description: "Access-control lattice, capability rules and audit trail."
//! studio_version: "v0.1.0"
//! studio_owner: "tbd"
//! ---
use serde::{Deserialize, Serialize};

use crate::role::Role;

/// What an actor may do to one subject row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Capabilities {
    /// Edit the subject's full name.
    pub can_modify_name: bool,
    /// Change the subject's role.
    pub can_change_role: bool,
    /// Delete the subject's account.
    pub can_delete: bool,
}

impl Capabilities {
    /// Nothing allowed.
    pub const NONE: Capabilities = Capabilities {
        can_modify_name: false,
        can_change_role: false,
        can_delete: false,
    };

    /// Everything allowed.
    pub const ALL: Capabilities = Capabilities {
        can_modify_name: true,
        can_change_role: true,
        can_delete: true,
    };

    /// Whether any control on the row is enabled.
    pub fn any(&self) -> bool {
        self.can_modify_name || self.can_change_role || self.can_delete
    }
}

/// Which subject roles a rule column admits.
#[derive(Debug, Clone, Copy)]
enum SubjectScope {
    Any,
    AnyExcept(&'static [Role]),
    Only(&'static [Role]),
}

impl SubjectScope {
    fn admits(&self, subject: Role) -> bool {
        match self {
            SubjectScope::Any => true,
            SubjectScope::AnyExcept(excluded) => !excluded.contains(&subject),
            SubjectScope::Only(allowed) => allowed.contains(&subject),
        }
    }
}

struct CapabilityRule {
    actor: Role,
    modify_or_delete: SubjectScope,
    change_role: SubjectScope,
}

/// Evaluated top to bottom; first matching actor wins. Actors without a row
/// get nothing.
const CAPABILITY_RULES: &[CapabilityRule] = &[
    CapabilityRule {
        actor: Role::Owner,
        modify_or_delete: SubjectScope::Any,
        change_role: SubjectScope::Any,
    },
    CapabilityRule {
        actor: Role::SuperAdmin,
        modify_or_delete: SubjectScope::AnyExcept(&[Role::Owner]),
        change_role: SubjectScope::AnyExcept(&[Role::Owner, Role::SuperAdmin]),
    },
    CapabilityRule {
        actor: Role::Admin,
        modify_or_delete: SubjectScope::Only(&[Role::Member, Role::Editor]),
        change_role: SubjectScope::Only(&[Role::Member, Role::Editor]),
    },
];

/// Capabilities of `actor` over a subject holding `subject`.
///
/// Self-action is always denied regardless of role.
pub fn capabilities(actor: Role, subject: Role, is_self: bool) -> Capabilities {
    if is_self {
        return Capabilities::NONE;
    }
    let Some(rule) = CAPABILITY_RULES.iter().find(|rule| rule.actor == actor) else {
        return Capabilities::NONE;
    };
    let modify_or_delete = rule.modify_or_delete.admits(subject);
    Capabilities {
        can_modify_name: modify_or_delete,
        can_change_role: rule.change_role.admits(subject),
        can_delete: modify_or_delete,
    }
}

/// Highest role `actor` may hand out, if any.
fn assignable_ceiling(actor: Role) -> Option<Role> {
    match actor {
        Role::Owner => Some(Role::Owner),
        Role::SuperAdmin => Some(Role::SuperAdmin),
        Role::Admin => Some(Role::Editor),
        Role::Editor | Role::Member => None,
    }
}

/// Roles offered to `actor` in role dropdowns and the invite form, lowest first.
///
/// Ownership only ever appears for an owner.
pub fn assignable_roles(actor: Role) -> Vec<Role> {
    match assignable_ceiling(actor) {
        Some(ceiling) => Role::all().filter(|role| *role <= ceiling).collect(),
        None => Vec::new(),
    }
}

/// Roles hidden from the user list for a given actor.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProfileFilter {
    /// Rows holding any of these roles are not listed.
    pub excluded_roles: Vec<Role>,
}

impl ProfileFilter {
    /// Exclusions mirroring the capability table: rows the actor could never
    /// touch above its own tier are left out.
    pub fn for_actor(actor: Role) -> Self {
        let excluded_roles = match actor {
            Role::Owner => Vec::new(),
            Role::SuperAdmin => vec![Role::Owner],
            Role::Admin => vec![Role::SuperAdmin, Role::Owner],
            Role::Editor | Role::Member => Role::all().collect(),
        };
        Self { excluded_roles }
    }

    /// Whether a row with `role` passes the filter. Rows without a role are kept
    /// so operators can see accounts that need repair.
    pub fn admits(&self, role: Option<Role>) -> bool {
        match role {
            Some(role) => !self.excluded_roles.contains(&role),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_action_always_denied() {
        for role in Role::all() {
            assert_eq!(capabilities(role, role, true), Capabilities::NONE);
        }
    }

    #[test]
    fn owner_controls_everyone() {
        assert_eq!(
            capabilities(Role::Owner, Role::Owner, false),
            Capabilities::ALL
        );
        assert_eq!(
            capabilities(Role::Owner, Role::Member, false),
            Capabilities::ALL
        );
    }

    #[test]
    fn super_admin_cannot_touch_peers_roles_or_owners() {
        let peer = capabilities(Role::SuperAdmin, Role::SuperAdmin, false);
        assert!(peer.can_modify_name);
        assert!(!peer.can_change_role);
        assert!(peer.can_delete);

        assert!(capabilities(Role::SuperAdmin, Role::Admin, false).can_change_role);
        assert_eq!(
            capabilities(Role::SuperAdmin, Role::Owner, false),
            Capabilities::NONE
        );
    }

    #[test]
    fn admin_limited_to_members_and_editors() {
        assert_eq!(
            capabilities(Role::Admin, Role::Editor, false),
            Capabilities::ALL
        );
        assert!(!capabilities(Role::Admin, Role::Admin, false).can_change_role);
        assert!(!capabilities(Role::Admin, Role::SuperAdmin, false).can_delete);
    }

    #[test]
    fn editors_and_members_have_nothing() {
        for subject in Role::all() {
            assert_eq!(
                capabilities(Role::Editor, subject, false),
                Capabilities::NONE
            );
            assert_eq!(
                capabilities(Role::Member, subject, false),
                Capabilities::NONE
            );
        }
    }

    #[test]
    fn ownership_only_assignable_by_owner() {
        assert_eq!(
            assignable_roles(Role::Admin),
            vec![Role::Member, Role::Editor]
        );
        assert!(!assignable_roles(Role::SuperAdmin).contains(&Role::Owner));
        assert!(assignable_roles(Role::SuperAdmin).contains(&Role::SuperAdmin));
        assert!(assignable_roles(Role::Owner).contains(&Role::Owner));
        assert!(assignable_roles(Role::Editor).is_empty());
    }

    #[test]
    fn list_filter_mirrors_table() {
        assert!(ProfileFilter::for_actor(Role::Owner).excluded_roles.is_empty());
        let filter = ProfileFilter::for_actor(Role::SuperAdmin);
        assert!(!filter.admits(Some(Role::Owner)));
        assert!(filter.admits(Some(Role::SuperAdmin)));
        assert!(filter.admits(None));
        let admin = ProfileFilter::for_actor(Role::Admin);
        assert!(!admin.admits(Some(Role::SuperAdmin)));
        assert!(admin.admits(Some(Role::Editor)));
    }
}
