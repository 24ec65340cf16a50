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

use serde_json::json;
use studio_backend::{BlogPost, ContentItem, ContentKind, ContentPatch};
use studio_logging::{console_debug, log_console_event, ConsoleEventOutcome};
use studio_security::{ConsoleAction, Section};

use crate::console::ActorContext;
use crate::error::ConsoleError;
use crate::latch::ControlId;
use crate::services::ConsoleServices;
use crate::status::StatusMessage;

/// Gallery, blog and team member tables, gated by section visibility.
pub struct ContentManager {
    services: Arc<ConsoleServices>,
    context: ActorContext,
}

impl ContentManager {
    /// Manager acting as `context`.
    pub fn new(services: Arc<ConsoleServices>, context: ActorContext) -> Self {
        Self { services, context }
    }

    fn require(&self, kind: ContentKind) -> Result<(), ConsoleError> {
        let section = kind.section();
        self.context.require_section(section).inspect_err(|err| {
            let section_name: &'static str = section.into();
            self.services.hooks.refused(
                &self.context.log_context().with_section(section_name),
                "content.access",
                err,
            );
        })
    }

    /// Rows of `kind` in display order.
    pub async fn list(&self, kind: ContentKind) -> Result<Vec<ContentItem>, ConsoleError> {
        self.require(kind)?;
        let items = self
            .services
            .content
            .list_items(kind)
            .await
            .map_err(|err| ConsoleError::LoadFailed(err.to_string()))?;
        console_debug!(
            context = self.context.log_context(),
            "listed {} {} rows",
            items.len(),
            kind
        );
        Ok(items)
    }

    /// Open blog post `id` for editing.
    pub async fn edit(&self, id: &str) -> Result<BlogPost, ConsoleError> {
        self.require(ContentKind::Blog)?;
        let row = self
            .services
            .content
            .fetch_item(ContentKind::Blog, id)
            .await
            .map_err(|err| ConsoleError::LoadFailed(err.to_string()))?;
        row.as_ref()
            .and_then(BlogPost::from_row)
            .ok_or_else(|| ConsoleError::LoadFailed("Post not found".to_owned()))
    }

    /// Write the edited title, author and body of blog post `id`.
    pub async fn update(&self, id: &str, patch: ContentPatch) -> Result<StatusMessage, ConsoleError> {
        if patch.is_empty() {
            return Err(ConsoleError::InvalidInput("Nothing to update.".to_owned()));
        }
        self.require(ContentKind::Blog)?;
        let _latch = self
            .services
            .latches
            .acquire(ControlId::ContentEdit(ContentKind::Blog, id.to_owned()))?;
        let section_name: &'static str = Section::Blog.into();
        let ctx = self
            .context
            .log_context()
            .with_section(section_name)
            .with_subject(id);
        if let Err(err) = self
            .services
            .content
            .update_item(ContentKind::Blog, id, &patch)
            .await
        {
            let err = ConsoleError::WriteFailed(err.to_string());
            log_console_event(Some(&ctx), "content.update", &err.to_string(), ConsoleEventOutcome::Fault);
            return Err(err);
        }
        self.services.hooks.audit(
            &self.context.actor.id,
            ConsoleAction::ContentUpdate,
            id,
            json!({ "kind": ContentKind::Blog, "title": patch.title }),
        );
        log_console_event(Some(&ctx), "content.update", "post updated", ConsoleEventOutcome::Success);
        Ok(StatusMessage::success("Post updated successfully!"))
    }

    /// Remove one row and its media object.
    pub async fn delete(
        &self,
        kind: ContentKind,
        item: &ContentItem,
        confirmed: bool,
    ) -> Result<StatusMessage, ConsoleError> {
        if !confirmed {
            return Err(ConsoleError::InvalidInput(
                "Deletion must be confirmed.".to_owned(),
            ));
        }
        self.require(kind)?;
        let _latch = self
            .services
            .latches
            .acquire(ControlId::ContentDelete(kind, item.id.clone()))?;
        let section_name: &'static str = kind.section().into();
        let ctx = self
            .context
            .log_context()
            .with_section(section_name)
            .with_subject(&item.id);
        if let Err(err) = self.services.content.delete_item(kind, item).await {
            let err = ConsoleError::DeleteFailed(format!("Deletion failed: {err}"));
            log_console_event(Some(&ctx), "content.delete", &err.to_string(), ConsoleEventOutcome::Fault);
            return Err(err);
        }
        self.services.hooks.audit(
            &self.context.actor.id,
            ConsoleAction::ContentDelete,
            &item.id,
            json!({ "kind": kind, "title": item.title }),
        );
        log_console_event(Some(&ctx), "content.delete", "item deleted", ConsoleEventOutcome::Success);
        Ok(StatusMessage::success("Item deleted successfully!"))
    }
}
