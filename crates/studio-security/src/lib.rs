//! ---
//! studio_section: "06-security-access-control"
//! studio_subsection: "module"
//! studio_type: "source"
//! studio_scope: "code"
//! studio_description: "Access-control lattice, capability rules and audit trail."
//! studio_version: "v0.1.0"
//! studio_owner: "tbd"
//! ---
//! Access-control model for the Studio console.
//!
//! Everything in this crate is a UI-affordance layer. The authoritative
//! boundary is the hosted profile store policy and the privileged
//! functions; the checks here exist so the console never offers a control
//! that the backend would reject, and they fail closed on any role they do
//! not recognise.
#![warn(missing_docs)]

pub mod audit;
pub mod capability;
pub mod guard;
pub mod metrics;
pub mod principal;
pub mod role;
pub mod section;

pub use audit::{AuditEntry, AuditLog, ConsoleAction};
pub use capability::{assignable_roles, capabilities, Capabilities, ProfileFilter};
pub use guard::{
    check_delete, check_invite_role, check_rename, check_role_change, role_change_rule,
    DenialRule, GuardError,
};
pub use metrics::SecurityMetrics;
pub use principal::{Actor, Subject};
pub use role::Role;
pub use section::{visible_sections, Section, SectionView};
