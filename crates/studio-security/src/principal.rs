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

/// Identifier of an account in the identity service.
pub type UserId = String;

/// The authenticated caller. Derived once per session by the role resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Account identifier.
    pub id: UserId,
    /// Email reported by the identity service.
    pub email: Option<String>,
    /// Resolved privilege level.
    pub role: Role,
}

impl Actor {
    /// Construct an actor without an email.
    pub fn new(id: impl Into<UserId>, role: Role) -> Self {
        Self {
            id: id.into(),
            email: None,
            role,
        }
    }

    /// Whether `subject_id` refers to the caller.
    pub fn is_self(&self, subject_id: &str) -> bool {
        self.id == subject_id
    }
}

/// A user row as listed in the management view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    /// Account identifier.
    pub id: UserId,
    /// Full name, if set.
    pub name: Option<String>,
    /// Email, if known.
    pub email: Option<String>,
    /// Persisted role. `None` when the store holds no recognisable role.
    pub role: Option<Role>,
}

impl Subject {
    /// Name used for display, `N/A` when missing.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or("N/A")
    }

    /// Email used for display, `No Email` when missing.
    pub fn display_email(&self) -> &str {
        self.email
            .as_deref()
            .filter(|email| !email.is_empty())
            .unwrap_or("No Email")
    }
}
