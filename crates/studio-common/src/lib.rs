//! ---
//! studio_section: "01-core-functionality"
//! studio_subsection: "module"
//! studio_type: "source"
//! studio_scope: "code"
//! studio_description: "Shared configuration and tracing primitives."
//! studio_version: "v0.1.0"
//! studio_owner: "tbd"
//! ---
//! Shared primitives for the Studio workspace: configuration loading and
//! tracing initialisation consumed by the CLI and integration tests.

pub mod config;
pub mod logging;

pub use config::{
    AppConfig, AuditConfig, BackendConfig, ContentConfig, ContentTarget, FunctionsConfig,
    LoadedAppConfig, LoggingConfig, RedirectConfig,
};
pub use logging::{init_tracing, LogFormat};
