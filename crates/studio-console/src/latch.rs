//! ---
//! studio_section: "02-console-core"
//! studio_subsection: "module"
//! studio_type: "source"
//! studio_scope: "code"
//! studio_description: "Console workflows over the access-control model."
//! studio_version: "v0.1.0"
//! studio_owner: "tbd"
//! ---
//! Per-control in-flight latches. A control stays disabled while its own
//! request is outstanding; unrelated controls are unaffected.

use std::collections::HashSet;
use std::fmt;

use parking_lot::Mutex;
use studio_backend::ContentKind;
use studio_security::principal::UserId;

use crate::error::ConsoleError;

/// Identifies one triggering control.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ControlId {
    /// Save button of a user row.
    SaveRow(UserId),
    /// Delete button of a user row.
    DeleteRow(UserId),
    /// Invite form submit.
    Invite,
    /// Own name form.
    AccountName,
    /// Own password form.
    AccountPassword,
    /// Logout button.
    SignOut,
    /// Delete button of a content row.
    ContentDelete(ContentKind, String),
    /// Save button of the post editor.
    ContentEdit(ContentKind, String),
}

impl fmt::Display for ControlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlId::SaveRow(id) => write!(f, "saving user {id}"),
            ControlId::DeleteRow(id) => write!(f, "deleting user {id}"),
            ControlId::Invite => f.write_str("sending an invitation"),
            ControlId::AccountName => f.write_str("updating your name"),
            ControlId::AccountPassword => f.write_str("updating your password"),
            ControlId::SignOut => f.write_str("signing out"),
            ControlId::ContentDelete(kind, id) => write!(f, "deleting {kind} item {id}"),
            ControlId::ContentEdit(kind, id) => write!(f, "saving {kind} item {id}"),
        }
    }
}

/// Set of controls with a request in flight.
#[derive(Debug, Default)]
pub struct Latches {
    held: Mutex<HashSet<ControlId>>,
}

impl Latches {
    /// Mark `control` busy until the returned guard drops.
    pub fn acquire(&self, control: ControlId) -> Result<LatchGuard<'_>, ConsoleError> {
        let mut held = self.held.lock();
        if !held.insert(control.clone()) {
            return Err(ConsoleError::ControlBusy(control));
        }
        Ok(LatchGuard {
            latches: self,
            control,
        })
    }

    /// Whether `control` is currently disabled.
    pub fn is_held(&self, control: &ControlId) -> bool {
        self.held.lock().contains(control)
    }
}

/// Re-enables the control on drop, whatever the outcome.
pub struct LatchGuard<'a> {
    latches: &'a Latches,
    control: ControlId,
}

impl Drop for LatchGuard<'_> {
    fn drop(&mut self) {
        self.latches.held.lock().remove(&self.control);
    }
}
