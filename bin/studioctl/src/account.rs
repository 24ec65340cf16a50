//! ---
//! studio_section: "05-external-interfaces"
//! studio_subsection: "binary"
//! studio_type: "source"
//! studio_scope: "code"
//! studio_description: "Command-line front end for the Studio console."
//! studio_version: "v0.1.0"
//! studio_owner: "tbd"
//! ---
use anyhow::Result;
use clap::{Args, Subcommand};
use serde_json::json;
use studio_console::Account;

use crate::context::CliContext;

pub async fn run(ctx: &CliContext, command: AccountCommand) -> Result<()> {
    let account = Account::new(ctx.services());
    match command {
        AccountCommand::Show => {
            let profile = account.load().await?;
            ctx.emit(&profile, || {
                format!(
                    "email: {}\nname:  {}\nrole:  {}",
                    profile.email.as_deref().unwrap_or("No Email"),
                    profile.full_name,
                    profile.role_label
                )
            })
        }
        AccountCommand::Rename(args) => {
            let status = account.rename(&args.name).await?;
            ctx.emit(&status, || status.text.clone())
        }
        AccountCommand::Password(args) => {
            let status = account
                .change_password(&args.password, &args.confirm)
                .await?;
            ctx.emit(&status, || status.text.clone())
        }
    }
}

pub async fn logout(ctx: &CliContext) -> Result<()> {
    let destination = Account::new(ctx.services()).sign_out().await?;
    ctx.emit(&json!({ "redirect": destination }), || {
        "Signed out. Unset STUDIO_ACCESS_TOKEN.".to_owned()
    })
}

#[derive(Debug, Subcommand)]
pub enum AccountCommand {
    /// Show your email, name and role.
    Show,
    /// Change your own name.
    Rename(RenameArgs),
    /// Change your password.
    Password(PasswordArgs),
}

#[derive(Debug, Args)]
pub struct RenameArgs {
    /// New full name.
    name: String,
}

#[derive(Debug, Args)]
pub struct PasswordArgs {
    /// New password, at least six characters.
    #[arg(long, env = "STUDIO_NEW_PASSWORD", hide_env_values = true)]
    password: String,
    /// Repeat the new password.
    #[arg(long)]
    confirm: String,
}
