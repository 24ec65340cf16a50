//! ---
//! studio_section: "05-external-interfaces"
//! studio_subsection: "binary"
//! studio_type: "source"
//! studio_scope: "code"
//! studio_description: "Command-line front end for the Studio console."
//! studio_version: "v0.1.0"
//! studio_owner: "tbd"
//! ---
use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Subcommand};
use studio_backend::{BlogPost, ContentItem, ContentKind, ContentPatch};
use studio_console::{ContentManager, SectionContent};
use studio_security::Section;

use crate::context::CliContext;

pub async fn run(ctx: &CliContext, command: ContentCommand) -> Result<()> {
    match command {
        ContentCommand::List(args) => {
            let (_, items) = load(ctx, args.kind).await?;
            ctx.emit(&items, || render(args.kind, &items))
        }
        ContentCommand::Delete(args) => {
            let (manager, items) = load(ctx, args.kind).await?;
            let item = items
                .iter()
                .find(|item| item.id == args.id)
                .ok_or_else(|| anyhow!("no {} item with id {}", args.kind, args.id))?;
            if !args.yes {
                bail!(
                    "refusing to delete \"{}\" without --yes",
                    item.display_title(args.kind)
                );
            }
            let status = manager.delete(args.kind, item, args.yes).await?;
            ctx.emit(&status, || status.text.clone())
        }
        ContentCommand::Edit(args) => edit(ctx, args).await,
    }
}

async fn load(ctx: &CliContext, kind: ContentKind) -> Result<(ContentManager, Vec<ContentItem>)> {
    let (console, content) = ctx.ready(Some(kind.section())).await?;
    let manager = console.content()?;
    let items = match content {
        Some(SectionContent::Content {
            kind: loaded,
            items,
        }) if loaded == kind => items,
        _ => manager.list(kind).await?,
    };
    Ok((manager, items))
}

async fn edit(ctx: &CliContext, args: EditArgs) -> Result<()> {
    let (console, _) = ctx.ready(Some(Section::Blog)).await?;
    let manager = console.content()?;
    let post = manager.edit(&args.id).await?;
    let content = match &args.content_file {
        Some(path) => Some(
            fs::read_to_string(path)
                .with_context(|| format!("unable to read {}", path.display()))?,
        ),
        None => args.content,
    };
    let patch = ContentPatch {
        title: args.title,
        author: args.author,
        content,
    };
    if patch.is_empty() {
        return ctx.emit(&post, || render_post(&post));
    }
    let status = manager.update(&post.id, patch).await?;
    ctx.emit(&status, || status.text.clone())
}

#[derive(Debug, Subcommand)]
pub enum ContentCommand {
    /// List rows of a content table.
    List(ListArgs),
    /// Delete a row and its media.
    Delete(DeleteArgs),
    /// Show a blog post, or change its title, author or body.
    Edit(EditArgs),
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// gallery, blog or members.
    kind: ContentKind,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// gallery, blog or members.
    kind: ContentKind,
    /// Row id.
    id: String,
    /// Confirm the deletion.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    yes: bool,
}

#[derive(Debug, Args)]
pub struct EditArgs {
    /// Post id.
    id: String,
    /// New title.
    #[arg(long)]
    title: Option<String>,
    /// New author.
    #[arg(long)]
    author: Option<String>,
    /// New Markdown body.
    #[arg(long)]
    content: Option<String>,
    /// Read the new body from a file.
    #[arg(long, conflicts_with = "content")]
    content_file: Option<PathBuf>,
}

fn render_post(post: &BlogPost) -> String {
    format!(
        "{}\nBy {}\n\n{}",
        post.title.as_deref().unwrap_or(ContentKind::Blog.untitled()),
        post.author.as_deref().unwrap_or("Unknown Author"),
        post.content.as_deref().unwrap_or("")
    )
}

fn render(kind: ContentKind, items: &[ContentItem]) -> String {
    if items.is_empty() {
        return format!("No {kind} items yet.");
    }
    items
        .iter()
        .map(|item| {
            format!(
                "{:<10} {:<40} {}",
                item.id,
                item.display_title(kind),
                item.display_detail(kind).unwrap_or_default()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blog_listing_falls_back_for_blank_fields() {
        let items = vec![ContentItem {
            id: "4".into(),
            title: None,
            detail: None,
            media_url: None,
            created_at: None,
        }];
        let text = render(ContentKind::Blog, &items);
        assert!(text.contains("Untitled Post"));
        assert!(text.ends_with("By Unknown Author"));
        assert_eq!(render(ContentKind::Members, &[]), "No members items yet.");
    }
}
