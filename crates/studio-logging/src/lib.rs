//! ---
//! studio_section: "03-logging"
//! studio_subsection: "module"
//! studio_type: "source"
//! studio_scope: "code"
//! studio_description: "Structured logging helpers for console events."
//! studio_version: "v0.1.0"
//! studio_owner: "tbd"
//! ---
#![warn(missing_docs)]
//! Console-flavoured wrappers around `tracing`. Every event carries the same
//! actor/role/section/subject fields so log queries can slice by who did what.

use tracing::Level;
use tracing_subscriber::{fmt as subscriber_fmt, prelude::*, EnvFilter, Registry};

pub mod macros;

/// Initialize a baseline tracing subscriber suitable for tests and quick tools.
pub fn init() {
    let _ = Registry::default()
        .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(subscriber_fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Fields attached to console log events.
#[derive(Debug, Default, Clone)]
pub struct LogContext<'a> {
    /// Acting account id.
    pub actor: Option<&'a str>,
    /// Acting account role.
    pub role: Option<&'a str>,
    /// Console section involved.
    pub section: Option<&'a str>,
    /// Account or record acted upon.
    pub subject: Option<&'a str>,
}

impl<'a> LogContext<'a> {
    /// Create an empty logging context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the acting account.
    pub fn with_actor(mut self, actor: &'a str) -> Self {
        self.actor = Some(actor);
        self
    }

    /// Attach the acting role.
    pub fn with_role(mut self, role: &'a str) -> Self {
        self.role = Some(role);
        self
    }

    /// Attach a section name.
    pub fn with_section(mut self, section: &'a str) -> Self {
        self.section = Some(section);
        self
    }

    /// Attach the target account or record.
    pub fn with_subject(mut self, subject: &'a str) -> Self {
        self.subject = Some(subject);
        self
    }
}

/// Outcome of a console operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleEventOutcome {
    /// Backend confirmed the operation.
    Success,
    /// A permission rule refused the operation before any write.
    Denied,
    /// The backend or transport failed.
    Fault,
}

impl ConsoleEventOutcome {
    fn as_str(&self) -> &'static str {
        match self {
            ConsoleEventOutcome::Success => "success",
            ConsoleEventOutcome::Denied => "denied",
            ConsoleEventOutcome::Fault => "fault",
        }
    }
}

/// Emit a standardized console event.
pub fn log_console_event(
    context: Option<&LogContext>,
    event: &str,
    message: &str,
    outcome: ConsoleEventOutcome,
) {
    let default = LogContext::default();
    let ctx = context.unwrap_or(&default);
    let fields = (
        ctx.actor.unwrap_or(""),
        ctx.role.unwrap_or(""),
        ctx.section.unwrap_or(""),
        ctx.subject.unwrap_or(""),
    );
    // `tracing::event!` needs a constant level, hence the explicit dispatch.
    macro_rules! emit {
        ($level:expr) => {
            tracing::event!(
                $level,
                event,
                outcome = outcome.as_str(),
                actor = fields.0,
                role = fields.1,
                section = fields.2,
                subject = fields.3,
                message = %message
            )
        };
    }
    match outcome {
        ConsoleEventOutcome::Success => emit!(Level::INFO),
        ConsoleEventOutcome::Denied => emit!(Level::WARN),
        ConsoleEventOutcome::Fault => emit!(Level::ERROR),
    }
}
