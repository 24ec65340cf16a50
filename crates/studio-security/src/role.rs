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
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};
use tracing::warn;

/// Privilege level of an account.
///
/// Variants are declared in ascending privilege order so the derived `Ord`
/// is the lattice: `member < editor < admin < super_admin < owner`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    /// Regular account. Part of the lattice for comparisons, never admitted to the console.
    Member,
    /// Manages gallery and blog content.
    Editor,
    /// Editor plus team member profiles.
    Admin,
    /// Admin plus invitations and user management.
    SuperAdmin,
    /// Unrestricted.
    Owner,
}

impl Role {
    /// Wire representation (`super_admin`, ...).
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    /// Label shown in forms, e.g. `Super admin`.
    pub fn display_name(&self) -> String {
        let raw = self.as_str().replacen('_', " ", 1);
        let mut chars = raw.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    /// All roles, lowest privilege first.
    pub fn all() -> impl Iterator<Item = Role> {
        Role::iter()
    }

    /// Whether this role may enter the console at all.
    pub fn grants_console_access(&self) -> bool {
        *self >= Role::Editor
    }

    /// Parse a role column value. Blank or unrecognised values yield `None`
    /// so callers treat them as an absent role rather than guessing.
    pub fn from_column(value: Option<&str>) -> Option<Role> {
        let raw = value.map(str::trim).filter(|raw| !raw.is_empty())?;
        match raw.parse::<Role>() {
            Ok(role) => Some(role),
            Err(_) => {
                warn!(role = raw, "unrecognised role value treated as absent");
                None
            }
        }
    }
}
