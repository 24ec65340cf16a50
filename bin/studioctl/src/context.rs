//! ---
//! studio_section: "05-external-interfaces"
//! studio_subsection: "binary"
//! studio_type: "source"
//! studio_scope: "code"
//! studio_description: "Command-line front end for the Studio console."
//! studio_version: "v0.1.0"
//! studio_owner: "tbd"
//! ---
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use prometheus::Registry;
use serde::Serialize;
use studio_backend::HostedBackend;
use studio_common::{init_tracing, AppConfig};
use studio_console::{Console, ConsoleServices, ConsoleSettings, ConsoleState, SectionContent};
use studio_security::{AuditLog, Role, Section, SecurityMetrics};
use tracing::debug;

/// Everything a subcommand needs: configuration, the hosted client and the
/// console services built on it.
pub struct CliContext {
    backend: Arc<HostedBackend>,
    services: Arc<ConsoleServices>,
    json: bool,
}

impl CliContext {
    pub fn load(config_path: Option<&Path>, token: Option<String>, json: bool) -> Result<Self> {
        let config = match config_path {
            Some(path) => AppConfig::from_path(path)?,
            None => AppConfig::load(&AppConfig::CANDIDATES)?,
        };
        init_tracing("studioctl", &config.logging)?;

        let mut backend = HostedBackend::new(&config.backend, config.content.clone())
            .context("unable to build backend client")?;
        if let Some(token) = token.filter(|token| !token.trim().is_empty()) {
            backend = backend.with_access_token(token);
        }
        let backend = Arc::new(backend);

        let metrics = SecurityMetrics::new(Arc::new(Registry::new()))?;
        let mut services = ConsoleServices::new(backend.clone(), ConsoleSettings::from_config(&config))
            .with_metrics(metrics);
        if let Some(path) = &config.audit.path {
            let audit = AuditLog::open(path)
                .with_context(|| format!("unable to open audit log {}", path.display()))?;
            services = services.with_audit(audit);
        }
        debug!(backend = %config.backend.url, "cli context ready");
        Ok(Self {
            backend,
            services: Arc::new(services),
            json,
        })
    }

    pub fn services(&self) -> Arc<ConsoleServices> {
        self.services.clone()
    }

    /// Print `value` as JSON, or the text produced by `human`.
    pub fn emit<T: Serialize>(&self, value: &T, human: impl FnOnce() -> String) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            println!("{}", human());
        }
        Ok(())
    }

    /// Bootstrap a console opened on `section` and insist that it becomes ready.
    /// Returns the section content bootstrap already loaded.
    pub async fn ready(&self, section: Option<Section>) -> Result<(Console, Option<SectionContent>)> {
        let console = Console::starting_at(self.services.clone(), section);
        let content = initial_content(console.bootstrap().await)?;
        Ok((console, content))
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<()> {
        let session = self.backend.sign_in_with_password(email, password).await?;
        self.emit(&session, || {
            format!(
                "signed in as {}\nexport STUDIO_ACCESS_TOKEN={}",
                session.user.email.as_deref().unwrap_or(&session.user.id),
                session.access_token
            )
        })
    }

    pub async fn status(&self) -> Result<()> {
        let console = Console::starting_at(self.services.clone(), None);
        let state = console.bootstrap().await;
        self.emit(&state, || describe_state(&state))?;
        if !state.is_ready() {
            bail!("console is not available for this session");
        }
        Ok(())
    }

    pub async fn invite(&self, email: &str, role: Role) -> Result<()> {
        let (console, _) = self.ready(Some(Section::Invite)).await?;
        let status = console.inviter()?.invite(email, Some(role)).await?;
        self.emit(&status, || status.text.clone())
    }
}

/// Content of a ready console. A failed initial load is an error.
pub fn initial_content(state: ConsoleState) -> Result<Option<SectionContent>> {
    match state {
        ConsoleState::Ready {
            status: Some(status),
            ..
        } => Err(anyhow!(status.text)),
        ConsoleState::Ready { content, .. } => Ok(content),
        other => Err(anyhow!(describe_state(&other))),
    }
}

pub fn describe_state(state: &ConsoleState) -> String {
    match state {
        ConsoleState::LoginRedirect { destination, reason } => match reason {
            Some(reason) => format!("Error verifying session ({reason}); sign in at {destination}"),
            None => format!("Authentication required; sign in at {destination}"),
        },
        ConsoleState::MemberRedirect { destination } => {
            format!("Member accounts use the dashboard at {destination}")
        }
        ConsoleState::AccessDenied { message } => format!("Access Denied: {message}"),
        ConsoleState::FetchFailed { message } => message.clone(),
        ConsoleState::Ready {
            context,
            active,
            status,
            ..
        } => {
            let visible = context
                .visible
                .iter()
                .map(|section| section.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            let mut text = format!(
                "{} ({})\nsections: {visible}\nactive: {}",
                context.actor.email.as_deref().unwrap_or(&context.actor.id),
                context.role().display_name(),
                active.map(|section| section.to_string()).unwrap_or_else(|| "none".into())
            );
            if let Some(status) = status {
                text.push('\n');
                text.push_str(&status.text);
            }
            text
        }
    }
}
