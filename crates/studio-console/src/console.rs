//! ---
//! studio_section: "02-console-core"
//! studio_subsection: "module"
//! studio_type: "source"
//! studio_scope: "code"
//! studio_description: "Console workflows over the access-control model."
//! studio_version: "v0.1.0"
//! studio_owner: "tbd"
//! ---
use std::collections::BTreeSet;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use serde::Serialize;
use studio_backend::{ContentItem, ContentKind};
use studio_logging::{console_info, console_warn, LogContext};
use studio_security::{Actor, DenialRule, Role, Section, SectionView};
use tracing::{debug, warn};

use crate::content::ContentManager;
use crate::error::{ConsoleError, ROLE_ABSENT_MESSAGE};
use crate::invite::Inviter;
use crate::resolver::{ResolvedRole, RoleResolver};
use crate::services::ConsoleServices;
use crate::status::StatusMessage;
use crate::users::{UserManager, UserRow};

/// Resolved caller for one session. Immutable once built; every workflow
/// receives it explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActorContext {
    /// The caller.
    pub actor: Actor,
    /// Sections rendered for the caller.
    pub visible: BTreeSet<Section>,
}

impl ActorContext {
    /// Context for `actor`, with visibility derived from its role.
    pub fn new(actor: Actor) -> Self {
        let visible = SectionView::apply(actor.role, None).visible;
        Self { actor, visible }
    }

    /// Caller role.
    pub fn role(&self) -> Role {
        self.actor.role
    }

    /// Refuse unless `section` is rendered for the caller.
    pub fn require_section(&self, section: Section) -> Result<(), ConsoleError> {
        if self.visible.contains(&section) {
            Ok(())
        } else {
            Err(ConsoleError::PermissionDenied(DenialRule::SectionHidden(
                section,
            )))
        }
    }

    pub(crate) fn log_context(&self) -> LogContext<'_> {
        LogContext::new()
            .with_actor(&self.actor.id)
            .with_role(self.actor.role.as_str())
    }
}

/// Data shown by a section after it loads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "section", rename_all = "lowercase")]
pub enum SectionContent {
    /// Gallery, blog or team member rows.
    Content {
        /// Which table.
        kind: ContentKind,
        /// Rows in display order.
        items: Vec<ContentItem>,
    },
    /// Managed user rows.
    Profiles {
        /// Rows with their capabilities.
        rows: Vec<UserRow>,
    },
    /// Invite form; nothing is fetched.
    Invite {
        /// Roles offered in the picker.
        assignable: Vec<Role>,
    },
}

/// Where bootstrap left the console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConsoleState {
    /// No usable session.
    LoginRedirect {
        /// Login page.
        destination: String,
        /// Why the session check failed, when it errored.
        reason: Option<String>,
    },
    /// Member accounts use their own dashboard.
    MemberRedirect {
        /// Member dashboard.
        destination: String,
    },
    /// Terminal: no role on the caller's profile. Content stays hidden.
    AccessDenied {
        /// Text rendered in place of the console.
        message: String,
    },
    /// Role lookup failed; activation halted.
    FetchFailed {
        /// Raw reason, for the operator.
        message: String,
    },
    /// Console is active.
    Ready {
        /// Resolved caller.
        context: ActorContext,
        /// Section active after the fallback.
        active: Option<Section>,
        /// Initial load of the active section.
        content: Option<SectionContent>,
        /// Status of the initial load when it failed.
        status: Option<StatusMessage>,
    },
}

impl ConsoleState {
    /// Whether the console body is shown.
    pub fn is_ready(&self) -> bool {
        matches!(self, ConsoleState::Ready { .. })
    }
}

/// One console page: session check, role resolution, visibility and section loads.
pub struct Console {
    services: Arc<ConsoleServices>,
    context: OnceCell<ActorContext>,
    active: Mutex<Option<Section>>,
}

impl Console {
    /// Console that opens on Gallery, like the default tab.
    pub fn new(services: Arc<ConsoleServices>) -> Self {
        Self::starting_at(services, Some(Section::Gallery))
    }

    /// Console whose initially active section is `section`.
    pub fn starting_at(services: Arc<ConsoleServices>, section: Option<Section>) -> Self {
        Self {
            services,
            context: OnceCell::new(),
            active: Mutex::new(section),
        }
    }

    /// Shared services.
    pub fn services(&self) -> &Arc<ConsoleServices> {
        &self.services
    }

    /// Resolved caller, once bootstrap reached `Ready`.
    pub fn context(&self) -> Result<&ActorContext, ConsoleError> {
        self.context.get().ok_or(ConsoleError::SessionMissing)
    }

    /// Currently active section.
    pub fn active_section(&self) -> Option<Section> {
        *self.active.lock()
    }

    /// Session check, then role resolution, then visibility, then the initial
    /// load of the active section. Each step is awaited before the next; no
    /// data load happens unless the caller resolved to a console role.
    pub async fn bootstrap(&self) -> ConsoleState {
        let redirects = &self.services.settings.redirects;
        let session = match self.services.identity.get_session().await {
            Ok(Some(session)) => session,
            Ok(None) => {
                debug!("no active session");
                return ConsoleState::LoginRedirect {
                    destination: redirects.login.clone(),
                    reason: None,
                };
            }
            Err(err) => {
                warn!(error = %err, "session check failed");
                return ConsoleState::LoginRedirect {
                    destination: redirects.login.clone(),
                    reason: Some(err.to_string()),
                };
            }
        };

        let resolver = RoleResolver::new(self.services.profiles.clone())
            .with_metrics(self.services.hooks.metrics().cloned());
        let role = match resolver.resolve(&session.user.id).await {
            Ok(ResolvedRole::Role(role)) => role,
            Ok(ResolvedRole::Absent) => {
                warn!(user = %session.user.id, "access denied: profile has no role");
                return ConsoleState::AccessDenied {
                    message: ROLE_ABSENT_MESSAGE.to_owned(),
                };
            }
            Err(err) => {
                return ConsoleState::FetchFailed {
                    message: err.to_string(),
                };
            }
        };
        if !role.grants_console_access() {
            console_info!(
                context = LogContext::new()
                    .with_actor(&session.user.id)
                    .with_role(role.as_str()),
                "member account redirected to dashboard"
            );
            return ConsoleState::MemberRedirect {
                destination: redirects.member_dashboard.clone(),
            };
        }

        let actor = Actor {
            id: session.user.id.clone(),
            email: session.user.email.clone(),
            role,
        };
        let context = ActorContext::new(actor);
        if self.context.set(context.clone()).is_err() {
            debug!("console already bootstrapped, keeping the first context");
        }
        let context = match self.context.get() {
            Some(context) => context.clone(),
            None => context,
        };

        let view = {
            let mut active = self.active.lock();
            let view = SectionView::apply(context.role(), *active);
            *active = view.active;
            view
        };
        console_info!(
            context = context.log_context(),
            "console ready with {} visible sections",
            view.visible.len()
        );

        let (content, status) = match view.active {
            Some(section) => match self.load(&context, section).await {
                Ok(content) => (content, None),
                Err(err) => (None, Some(err.status())),
            },
            None => (None, None),
        };
        ConsoleState::Ready {
            context,
            active: view.active,
            content,
            status,
        }
    }

    /// Switch to `section` and load it. Hidden sections are refused; the
    /// already-active section is a no-op returning `None`.
    pub async fn open_section(
        &self,
        section: Section,
    ) -> Result<Option<SectionContent>, ConsoleError> {
        let context = self.context()?;
        if let Err(err) = context.require_section(section) {
            let section_name: &'static str = section.into();
            self.services.hooks.refused(
                &context.log_context().with_section(section_name),
                "section.open",
                &err,
            );
            return Err(err);
        }
        {
            let mut active = self.active.lock();
            if *active == Some(section) {
                return Ok(None);
            }
            *active = Some(section);
        }
        self.load(context, section).await
    }

    /// User management for the caller. Requires the Profiles section.
    pub fn users(&self) -> Result<UserManager, ConsoleError> {
        let context = self.context()?;
        context.require_section(Section::Profiles)?;
        Ok(UserManager::new(self.services.clone(), context.clone()))
    }

    /// Invitations for the caller. Requires the Invite section.
    pub fn inviter(&self) -> Result<Inviter, ConsoleError> {
        let context = self.context()?;
        context.require_section(Section::Invite)?;
        Ok(Inviter::new(self.services.clone(), context.clone()))
    }

    /// Content tables for the caller.
    pub fn content(&self) -> Result<ContentManager, ConsoleError> {
        let context = self.context()?;
        Ok(ContentManager::new(self.services.clone(), context.clone()))
    }

    async fn load(
        &self,
        context: &ActorContext,
        section: Section,
    ) -> Result<Option<SectionContent>, ConsoleError> {
        let section_name: &'static str = section.into();
        let result = match section {
            Section::Invite => Ok(SectionContent::Invite {
                assignable: Inviter::new(self.services.clone(), context.clone()).assignable(),
            }),
            Section::Profiles => UserManager::new(self.services.clone(), context.clone())
                .load_rows()
                .await
                .map(|rows| SectionContent::Profiles { rows }),
            Section::Gallery | Section::Blog | Section::Members => {
                let kind = match ContentKind::for_section(section) {
                    Some(kind) => kind,
                    None => return Ok(None),
                };
                ContentManager::new(self.services.clone(), context.clone())
                    .list(kind)
                    .await
                    .map(|items| SectionContent::Content { kind, items })
            }
        };
        match result {
            Ok(content) => Ok(Some(content)),
            Err(err) => {
                console_warn!(
                    context = context.log_context().with_section(section_name),
                    "section load failed: {}",
                    err
                );
                Err(match err {
                    ConsoleError::LoadFailed(_) => err,
                    other if other.is_terminal() => other,
                    other => ConsoleError::LoadFailed(other.to_string()),
                })
            }
        }
    }
}
