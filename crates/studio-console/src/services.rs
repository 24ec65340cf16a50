//! ---
//! studio_section: "02-console-core"
//! studio_subsection: "module"
//! studio_type: "source"
//! studio_scope: "code"
//! studio_description: "Console workflows over the access-control model."
//! studio_version: "v0.1.0"
//! studio_owner: "tbd"
//! ---
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use studio_backend::{ContentStore, IdentityService, PrivilegedFunctions, ProfileStore};
use studio_common::{AppConfig, FunctionsConfig, RedirectConfig};
use studio_logging::{log_console_event, ConsoleEventOutcome, LogContext};
use studio_security::{AuditLog, ConsoleAction, SecurityMetrics};
use tracing::warn;

use crate::error::ConsoleError;
use crate::latch::Latches;

/// Function names and redirect targets the workflows need.
#[derive(Debug, Clone, Default)]
pub struct ConsoleSettings {
    /// Privileged function names.
    pub functions: FunctionsConfig,
    /// Redirect destinations.
    pub redirects: RedirectConfig,
}

impl ConsoleSettings {
    /// Settings taken from the application configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            functions: config.functions.clone(),
            redirects: config.redirects.clone(),
        }
    }
}

/// Optional observers: Prometheus counters and the audit trail.
#[derive(Clone, Default)]
pub struct ConsoleHooks {
    metrics: Option<SecurityMetrics>,
    audit: Option<Arc<Mutex<AuditLog>>>,
}

impl ConsoleHooks {
    pub(crate) fn metrics(&self) -> Option<&SecurityMetrics> {
        self.metrics.as_ref()
    }

    /// Count and log a local refusal.
    pub(crate) fn refused(&self, context: &LogContext<'_>, event: &str, err: &ConsoleError) {
        if let Some(metrics) = &self.metrics {
            match err {
                ConsoleError::StaleRoleConflict { .. } => metrics.inc_stale_conflict(),
                ConsoleError::PermissionDenied(rule) => metrics.inc_denial(rule),
                _ => {}
            }
        }
        log_console_event(
            Some(context),
            event,
            &err.to_string(),
            ConsoleEventOutcome::Denied,
        );
    }

    /// Append a confirmed mutation to the audit trail, if one is configured.
    /// The mutation already happened, so a failing trail is logged, not raised.
    pub(crate) fn audit(&self, actor: &str, action: ConsoleAction, subject: &str, metadata: Value) {
        let Some(audit) = &self.audit else {
            return;
        };
        if let Err(err) = audit.lock().record(actor, action, subject, metadata) {
            warn!(actor, subject, %action, error = %err, "audit append failed");
        }
    }
}

/// Collaborators plus shared state for one console process.
pub struct ConsoleServices {
    pub(crate) identity: Arc<dyn IdentityService>,
    pub(crate) profiles: Arc<dyn ProfileStore>,
    pub(crate) functions: Arc<dyn PrivilegedFunctions>,
    pub(crate) content: Arc<dyn ContentStore>,
    pub(crate) settings: ConsoleSettings,
    pub(crate) hooks: ConsoleHooks,
    pub(crate) latches: Latches,
}

impl ConsoleServices {
    /// Use one backend for every collaborator.
    pub fn new<B>(backend: Arc<B>, settings: ConsoleSettings) -> Self
    where
        B: IdentityService + ProfileStore + PrivilegedFunctions + ContentStore,
    {
        Self::from_parts(
            backend.clone(),
            backend.clone(),
            backend.clone(),
            backend,
            settings,
        )
    }

    /// Assemble from separate collaborators.
    pub fn from_parts(
        identity: Arc<dyn IdentityService>,
        profiles: Arc<dyn ProfileStore>,
        functions: Arc<dyn PrivilegedFunctions>,
        content: Arc<dyn ContentStore>,
        settings: ConsoleSettings,
    ) -> Self {
        Self {
            identity,
            profiles,
            functions,
            content,
            settings,
            hooks: ConsoleHooks::default(),
            latches: Latches::default(),
        }
    }

    /// Export access-control counters.
    pub fn with_metrics(mut self, metrics: SecurityMetrics) -> Self {
        self.hooks.metrics = Some(metrics);
        self
    }

    /// Record confirmed mutations.
    pub fn with_audit(mut self, audit: AuditLog) -> Self {
        self.hooks.audit = Some(Arc::new(Mutex::new(audit)));
        self
    }

    /// Configured settings.
    pub fn settings(&self) -> &ConsoleSettings {
        &self.settings
    }

    /// In-flight latches, shared by every workflow.
    pub fn latches(&self) -> &Latches {
        &self.latches
    }
}
