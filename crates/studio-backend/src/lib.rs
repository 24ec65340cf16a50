//! ---
//! studio_section: "05-external-interfaces"
//! studio_subsection: "module"
//! studio_type: "source"
//! studio_scope: "code"
//! studio_description: "Hosted backend collaborators consumed by the console."
//! studio_version: "v0.1.0"
//! studio_owner: "tbd"
//! ---
//! Narrow interfaces over the hosted backend: identity/session, the profile
//! table, privileged edge functions and the content tables.
//!
//! [`HostedBackend`] speaks the platform's HTTP API; [`InMemoryBackend`]
//! implements the same traits in-process and records every call.
#![warn(missing_docs)]

pub mod error;
pub mod hosted;
pub mod memory;
pub mod model;
pub mod service;

pub use error::BackendError;
pub use hosted::HostedBackend;
pub use memory::InMemoryBackend;
pub use model::{
    AuthUser, BlogPost, ContentItem, ContentKind, ContentPatch, FunctionReply, ProfileRecord,
    ProfileUpdate, Session,
};
pub use service::{ContentStore, IdentityService, PrivilegedFunctions, ProfileStore};
