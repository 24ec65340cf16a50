//! ---
//! studio_section: "05-external-interfaces"
//! studio_subsection: "binary"
//! studio_type: "source"
//! studio_scope: "code"
//! studio_description: "Command-line front end for the Studio console."
//! studio_version: "v0.1.0"
//! studio_owner: "tbd"
//! ---
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use studio_security::Role;

mod account;
mod content;
mod context;
mod users;

use context::CliContext;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Studio administration console utility",
    long_about = None
)]
struct Cli {
    /// Configuration file (otherwise studio.toml or configs/studio.toml).
    #[arg(long, value_name = "FILE", env = "STUDIO_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Access token from a previous `login`.
    #[arg(
        long,
        value_name = "TOKEN",
        env = "STUDIO_ACCESS_TOKEN",
        hide_env_values = true,
        global = true
    )]
    token: Option<String>,

    /// Print machine-readable JSON instead of text.
    #[arg(long, global = true, action = clap::ArgAction::SetTrue)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Sign in with email and password and print the access token.
    Login(LoginArgs),
    /// Resolve the caller's role and show what the console would render.
    Status,
    #[command(subcommand, about = "Managed user rows")]
    Users(users::UsersCommand),
    /// Send an invitation.
    Invite(InviteArgs),
    #[command(subcommand, about = "Your own account")]
    Account(account::AccountCommand),
    #[command(subcommand, about = "Gallery, blog and team member content")]
    Content(content::ContentCommand),
    /// End the current session.
    Logout,
}

#[derive(Debug, Args)]
struct LoginArgs {
    /// Account email.
    #[arg(long)]
    email: String,
    /// Account password.
    #[arg(long, env = "STUDIO_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Debug, Args)]
struct InviteArgs {
    /// Address to invite.
    #[arg(long)]
    email: String,
    /// Role granted on acceptance (member, editor, admin, super_admin, owner).
    #[arg(long)]
    role: Role,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let ctx = CliContext::load(cli.config.as_deref(), cli.token, cli.json)?;
    match cli.command {
        Commands::Login(args) => ctx.login(&args.email, &args.password).await,
        Commands::Status => ctx.status().await,
        Commands::Users(cmd) => users::run(&ctx, cmd).await,
        Commands::Invite(args) => ctx.invite(&args.email, args.role).await,
        Commands::Account(cmd) => account::run(&ctx, cmd).await,
        Commands::Content(cmd) => content::run(&ctx, cmd).await,
        Commands::Logout => account::logout(&ctx).await,
    }
}
