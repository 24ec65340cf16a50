//! ---
//! studio_section: "02-console-core"
//! studio_subsection: "module"
//! studio_type: "source"
//! studio_scope: "code"
//! studio_description: "Console workflows over the access-control model."
//! studio_version: "v0.1.0"
//! studio_owner: "tbd"
//! ---
//! Console workflows built on `studio-security` and the backend collaborators.
//!
//! [`Console::bootstrap`] runs once per page: session, role, visibility, then
//! the active section's load. The resolved [`ActorContext`] is passed to every
//! workflow ([`UserManager`], [`Inviter`], [`ContentManager`]) instead of being
//! read from shared state.
#![warn(missing_docs)]

pub mod account;
pub mod console;
pub mod content;
pub mod error;
pub mod invite;
pub mod latch;
pub mod resolver;
pub mod services;
pub mod status;
pub mod users;

pub use account::{Account, AccountProfile};
pub use console::{ActorContext, Console, ConsoleState, SectionContent};
pub use content::ContentManager;
pub use error::{ConsoleError, ROLE_ABSENT_MESSAGE};
pub use invite::Inviter;
pub use latch::{ControlId, Latches};
pub use resolver::{ResolvedRole, RoleResolver};
pub use services::{ConsoleHooks, ConsoleServices, ConsoleSettings};
pub use status::{StatusMessage, Tone};
pub use users::{DeleteRequest, SaveOutcome, SaveRejection, SaveRequest, UserManager, UserRow};
