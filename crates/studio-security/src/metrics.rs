//! ---
//! studio_section: "06-security-access-control"
//! studio_subsection: "module"
//! studio_type: "source"
//! studio_scope: "code"
//! studio_description: "Access-control lattice, capability rules and audit trail."
//! studio_version: "v0.1.0"
//! studio_owner: "tbd"
//! ---
use prometheus::{IntCounter, IntCounterVec, Opts, Registry};
use std::sync::Arc;

use crate::guard::DenialRule;

/// Access-control counters exported via Prometheus.
#[derive(Clone)]
pub struct SecurityMetrics {
    registry: Arc<Registry>,
    role_resolutions_total: IntCounterVec,
    role_fetch_failures_total: IntCounter,
    permission_denials_total: IntCounterVec,
    stale_role_conflicts_total: IntCounter,
}

impl SecurityMetrics {
    /// Register the counters with `registry`.
    pub fn new(registry: Arc<Registry>) -> anyhow::Result<Self> {
        let role_resolutions_total = IntCounterVec::new(
            Opts::new(
                "studio_role_resolutions_total",
                "Role resolutions by outcome",
            ),
            &["outcome"],
        )?;
        let role_fetch_failures_total = IntCounter::new(
            "studio_role_fetch_failures_total",
            "Role lookups that failed for reasons other than a missing profile",
        )?;
        let permission_denials_total = IntCounterVec::new(
            Opts::new(
                "studio_permission_denials_total",
                "Console actions refused by a permission rule",
            ),
            &["rule"],
        )?;
        let stale_role_conflicts_total = IntCounter::new(
            "studio_stale_role_conflicts_total",
            "Role submissions refused because the persisted role had changed",
        )?;

        registry.register(Box::new(role_resolutions_total.clone()))?;
        registry.register(Box::new(role_fetch_failures_total.clone()))?;
        registry.register(Box::new(permission_denials_total.clone()))?;
        registry.register(Box::new(stale_role_conflicts_total.clone()))?;

        Ok(Self {
            registry,
            role_resolutions_total,
            role_fetch_failures_total,
            permission_denials_total,
            stale_role_conflicts_total,
        })
    }

    /// Access the underlying registry.
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Count a resolution (`granted`, `member`, `absent`).
    pub fn inc_role_resolution(&self, outcome: &str) {
        self.role_resolutions_total
            .with_label_values(&[outcome])
            .inc();
    }

    /// Count a failed role lookup.
    pub fn inc_role_fetch_failure(&self) {
        self.role_fetch_failures_total.inc();
    }

    /// Count a refusal, labelled by the rule that fired.
    pub fn inc_denial(&self, rule: &DenialRule) {
        self.permission_denials_total
            .with_label_values(&[rule_label(rule)])
            .inc();
    }

    /// Count a stale-role refusal.
    pub fn inc_stale_conflict(&self) {
        self.stale_role_conflicts_total.inc();
    }
}

fn rule_label(rule: &DenialRule) -> &'static str {
    match rule {
        DenialRule::SelfAction => "self_action",
        DenialRule::OwnerGrantReserved => "owner_grant_reserved",
        DenialRule::PeerSuperAdminImmutable => "peer_super_admin_immutable",
        DenialRule::AdminScopeExceeded => "admin_scope_exceeded",
        DenialRule::SubjectOutranksActor => "subject_outranks_actor",
        DenialRule::InsufficientPrivilege => "insufficient_privilege",
        DenialRule::RoleNotAssignable(_) => "role_not_assignable",
        DenialRule::SectionHidden(_) => "section_hidden",
        DenialRule::UnknownRole => "unknown_role",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_register_and_increment() {
        let registry = Arc::new(Registry::new());
        let metrics = SecurityMetrics::new(registry.clone()).unwrap();
        metrics.inc_role_resolution("granted");
        metrics.inc_role_fetch_failure();
        metrics.inc_denial(&DenialRule::PeerSuperAdminImmutable);
        metrics.inc_stale_conflict();
        assert_eq!(registry.gather().len(), 4);
    }

    #[test]
    fn double_registration_fails() {
        let registry = Arc::new(Registry::new());
        SecurityMetrics::new(registry.clone()).unwrap();
        assert!(SecurityMetrics::new(registry).is_err());
    }
}
