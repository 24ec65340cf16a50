//! ---
//! studio_section: "05-external-interfaces"
//! studio_subsection: "binary"
//! studio_type: "source"
//! studio_scope: "code"
//! studio_description: "Command-line front end for the Studio console."
//! studio_version: "v0.1.0"
//! studio_owner: "tbd"
//! ---
use anyhow::{anyhow, bail, Result};
use clap::{Args, Subcommand};
use studio_console::{DeleteRequest, SaveRequest, SectionContent, UserManager, UserRow};
use studio_security::{Role, Section};

use crate::context::CliContext;

pub async fn run(ctx: &CliContext, command: UsersCommand) -> Result<()> {
    match command {
        UsersCommand::List => list(ctx).await,
        UsersCommand::Save(args) => save(ctx, args).await,
        UsersCommand::Delete(args) => delete(ctx, args).await,
    }
}

#[derive(Debug, Subcommand)]
pub enum UsersCommand {
    /// List manageable users with the controls each row enables.
    List,
    /// Save a row's name and role.
    Save(SaveArgs),
    /// Delete an account through the privileged function.
    Delete(DeleteArgs),
}

#[derive(Debug, Args)]
pub struct SaveArgs {
    /// Account id.
    id: String,
    /// New role.
    #[arg(long)]
    role: Role,
    /// New full name (defaults to the listed name).
    #[arg(long)]
    name: Option<String>,
    /// Role you believe is persisted; refused if it has changed since.
    #[arg(long = "expect-role")]
    expect_role: Option<Role>,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// Account id.
    id: String,
    /// Confirm the deletion. It cannot be undone.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    yes: bool,
}

fn render(rows: &[UserRow]) -> String {
    if rows.is_empty() {
        return "No user profiles found.".to_owned();
    }
    rows.iter()
        .map(|row| {
            let role = row
                .subject
                .role
                .map(|role| role.to_string())
                .unwrap_or_else(|| "-".into());
            let flag = |enabled: bool, label: &str| {
                if enabled {
                    label.to_owned()
                } else {
                    "-".repeat(label.len())
                }
            };
            format!(
                "{:<38} {:<24} {:<32} {:<12} [{} {} {}]{}",
                row.subject.id,
                row.subject.display_name(),
                row.subject.display_email(),
                role,
                flag(row.capabilities.can_modify_name, "name"),
                flag(row.capabilities.can_change_role, "role"),
                flag(row.capabilities.can_delete, "delete"),
                if row.is_self { " (you)" } else { "" }
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

async fn load(ctx: &CliContext) -> Result<(UserManager, Vec<UserRow>)> {
    let (console, content) = ctx.ready(Some(Section::Profiles)).await?;
    let manager = console.users()?;
    Ok((manager, profile_rows(content)?))
}

fn profile_rows(content: Option<SectionContent>) -> Result<Vec<UserRow>> {
    match content {
        Some(SectionContent::Profiles { rows }) => Ok(rows),
        _ => bail!("user profiles were not loaded"),
    }
}

async fn list(ctx: &CliContext) -> Result<()> {
    let (_, rows) = load(ctx).await?;
    ctx.emit(&rows, || render(&rows))
}

async fn save(ctx: &CliContext, args: SaveArgs) -> Result<()> {
    let (manager, rows) = load(ctx).await?;
    let row = rows
        .iter()
        .find(|row| row.subject.id == args.id)
        .ok_or_else(|| anyhow!("user {} is not in your list", args.id))?;
    let assumed_role = match args.expect_role.or(row.subject.role) {
        Some(role) => role,
        None => bail!("user {} has no recognised role", args.id),
    };
    let request = SaveRequest {
        subject_id: args.id.clone(),
        assumed_role,
        role: args.role,
        full_name: args
            .name
            .or_else(|| row.subject.name.clone())
            .unwrap_or_default(),
    };
    match manager.save(request).await {
        Ok(outcome) => ctx.emit(&outcome.status, || outcome.status.text.clone()),
        Err(rejection) => {
            if let Some(role) = rejection.revert_to {
                eprintln!("role for {} remains {}", args.id, role.display_name());
            }
            Err(rejection.into())
        }
    }
}

async fn delete(ctx: &CliContext, args: DeleteArgs) -> Result<()> {
    let (manager, rows) = load(ctx).await?;
    let row = rows
        .iter()
        .find(|row| row.subject.id == args.id)
        .ok_or_else(|| anyhow!("user {} is not in your list", args.id))?;
    if !args.yes {
        bail!(
            "refusing to permanently delete {} without --yes",
            row.subject.display_email()
        );
    }
    let status = manager
        .delete(DeleteRequest {
            subject_id: args.id.clone(),
            email: row.subject.email.clone(),
            role: row.subject.role,
            confirmed: args.yes,
        })
        .await?;
    ctx.emit(&status, || status.text.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use studio_backend::InMemoryBackend;
    use studio_console::{Console, ConsoleServices, ConsoleSettings};

    use crate::context::initial_content;

    #[tokio::test]
    async fn rows_come_from_the_bootstrap_load() {
        let backend = Arc::new(InMemoryBackend::new());
        backend.sign_in("me", Some("me@example.com"));
        backend.insert_profile("me", Some("Me"), Some("me@example.com"), Some("owner"));
        backend.insert_profile("ed", Some("Eddie"), None, Some("editor"));
        let services = Arc::new(ConsoleServices::new(backend.clone(), ConsoleSettings::default()));
        let console = Console::starting_at(services, Some(Section::Profiles));

        let content = initial_content(console.bootstrap().await).unwrap();
        console.users().unwrap();
        let rows = profile_rows(content).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(render(&rows).contains("Eddie"));
        assert_eq!(backend.call_count("list_profiles"), 1);
    }

    #[tokio::test]
    async fn failed_initial_load_is_reported() {
        let backend = Arc::new(InMemoryBackend::new());
        backend.sign_in("me", None);
        backend.insert_profile("me", None, None, Some("super_admin"));
        backend.fail_profile_listing("relation \"profiles\" is locked");
        let services = Arc::new(ConsoleServices::new(backend.clone(), ConsoleSettings::default()));
        let console = Console::starting_at(services, Some(Section::Profiles));

        let err = initial_content(console.bootstrap().await).unwrap_err();
        assert!(err.to_string().contains("is locked"));
        assert!(profile_rows(None).is_err());
    }
}
