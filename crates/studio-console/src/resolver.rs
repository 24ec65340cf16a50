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

use studio_backend::ProfileStore;
use studio_security::{Role, SecurityMetrics};
use tracing::{debug, error, info};

use crate::error::ConsoleError;

/// Outcome of a role lookup that reached the profile store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedRole {
    /// Profile carries a recognised role.
    Role(Role),
    /// No profile, or a blank/unrecognised role column.
    Absent,
}

impl ResolvedRole {
    /// Metric label for the outcome.
    pub fn outcome(&self) -> &'static str {
        match self {
            ResolvedRole::Role(Role::Member) => "member",
            ResolvedRole::Role(_) => "granted",
            ResolvedRole::Absent => "absent",
        }
    }
}

/// Classifies the caller into the role lattice.
pub struct RoleResolver {
    profiles: Arc<dyn ProfileStore>,
    metrics: Option<SecurityMetrics>,
}

impl RoleResolver {
    /// Resolver backed by `profiles`.
    pub fn new(profiles: Arc<dyn ProfileStore>) -> Self {
        Self {
            profiles,
            metrics: None,
        }
    }

    /// Count outcomes in `metrics`.
    pub fn with_metrics(mut self, metrics: Option<SecurityMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Look up exactly one profile by id. A missing row is `Absent`; any other
    /// store failure is `RoleFetchFailed` with the store's reason.
    pub async fn resolve(&self, user_id: &str) -> Result<ResolvedRole, ConsoleError> {
        let record = match self.profiles.fetch_profile(user_id).await {
            Ok(record) => record,
            Err(err) => {
                error!(user = user_id, error = %err, "role lookup failed");
                if let Some(metrics) = &self.metrics {
                    metrics.inc_role_fetch_failure();
                }
                return Err(ConsoleError::RoleFetchFailed(err.to_string()));
            }
        };
        let resolved = match record.and_then(|record| record.role) {
            Some(role) => ResolvedRole::Role(role),
            None => ResolvedRole::Absent,
        };
        match resolved {
            ResolvedRole::Role(role) => info!(user = user_id, %role, "role resolved"),
            ResolvedRole::Absent => debug!(user = user_id, "no role on profile"),
        }
        if let Some(metrics) = &self.metrics {
            metrics.inc_role_resolution(resolved.outcome());
        }
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::Registry;
    use studio_backend::InMemoryBackend;

    fn resolver(backend: &Arc<InMemoryBackend>) -> (RoleResolver, SecurityMetrics) {
        let metrics = SecurityMetrics::new(Arc::new(Registry::new())).unwrap();
        let resolver = RoleResolver::new(backend.clone()).with_metrics(Some(metrics.clone()));
        (resolver, metrics)
    }

    #[tokio::test]
    async fn classifies_profiles() {
        let backend = Arc::new(InMemoryBackend::new());
        backend.insert_profile("u-1", None, None, Some("admin"));
        backend.insert_profile("u-2", None, None, Some(""));
        backend.insert_profile("u-3", None, None, Some("root"));
        let (resolver, metrics) = resolver(&backend);

        assert_eq!(
            resolver.resolve("u-1").await.unwrap(),
            ResolvedRole::Role(Role::Admin)
        );
        assert_eq!(resolver.resolve("u-2").await.unwrap(), ResolvedRole::Absent);
        assert_eq!(resolver.resolve("u-3").await.unwrap(), ResolvedRole::Absent);
        assert_eq!(resolver.resolve("nobody").await.unwrap(), ResolvedRole::Absent);

        let text = prometheus::TextEncoder::new()
            .encode_to_string(&metrics.registry().gather())
            .unwrap();
        assert!(text.contains("studio_role_resolutions_total{outcome=\"absent\"} 3"));
    }

    #[tokio::test]
    async fn store_failure_is_not_absence() {
        let backend = Arc::new(InMemoryBackend::new());
        backend.fail_profile_fetch("permission denied for table profiles");
        let (resolver, _) = resolver(&backend);
        let err = resolver.resolve("u-1").await.unwrap_err();
        assert_eq!(
            err,
            ConsoleError::RoleFetchFailed("permission denied for table profiles".into())
        );
    }
}
