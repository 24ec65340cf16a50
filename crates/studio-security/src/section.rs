//! ---
//! studio_section: "06-security-access-control"
//! studio_subsection: "module"
//! studio_type: "source"
//! studio_scope: "code"
//! studio_description: "Access-control lattice, capability rules and audit trail."
//! studio_version: "v0.1.0"
//! studio_owner: "tbd"
//! ---
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use tracing::{debug, warn};

use crate::role::Role;

/// Console areas that can be shown or hidden.
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
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Section {
    /// Gallery media.
    Gallery,
    /// Blog posts.
    Blog,
    /// Team member profiles shown on the public site.
    Members,
    /// User invitations.
    Invite,
    /// Account and role management.
    Profiles,
}

impl Section {
    /// Whether opening the section issues a data load. Invite is a bare form.
    pub fn loads_data(&self) -> bool {
        !matches!(self, Section::Invite)
    }

    /// Lowest role that sees the section.
    pub fn minimum_role(&self) -> Role {
        match self {
            Section::Gallery | Section::Blog => Role::Editor,
            Section::Members => Role::Admin,
            Section::Invite | Section::Profiles => Role::SuperAdmin,
        }
    }
}

/// Sections visible to `role`. Additive: every role sees a superset of what
/// any lower role sees.
pub fn visible_sections(role: Role) -> BTreeSet<Section> {
    use strum::IntoEnumIterator;

    Section::iter()
        .filter(|section| role >= section.minimum_role())
        .collect()
}

/// Result of applying permissions: the visible set and the section left active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionView {
    /// Sections rendered for the actor.
    pub visible: BTreeSet<Section>,
    /// Section left active after the fallback ran.
    pub active: Option<Section>,
}

impl SectionView {
    /// Compute visibility for `role` and reconcile the currently active section.
    ///
    /// An active section that stays visible is kept. Otherwise Gallery becomes
    /// active when visible, else nothing is active. Applying the result again
    /// with the same role yields the same view.
    pub fn apply(role: Role, active: Option<Section>) -> Self {
        let visible = visible_sections(role);
        let active = match active {
            Some(current) if visible.contains(&current) => Some(current),
            previous => {
                let fallback = visible
                    .contains(&Section::Gallery)
                    .then_some(Section::Gallery);
                match previous {
                    Some(hidden) => {
                        warn!(%role, section = %hidden, fallback = ?fallback, "active section hidden by permissions")
                    }
                    None => debug!(%role, fallback = ?fallback, "no active section, applying default"),
                }
                fallback
            }
        };
        Self { visible, active }
    }

    /// Whether `section` is rendered.
    pub fn is_visible(&self, section: Section) -> bool {
        self.visible.contains(&section)
    }
}
