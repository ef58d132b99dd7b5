//! CLI argument definitions.
//!
//! Uses clap derive macros for type-safe argument parsing.

use clap::{Parser, Subcommand};
use uuid::Uuid;

/// Forum authentication service
#[derive(Parser, Debug)]
#[command(name = "forum-auth")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server
    Serve(ServeArgs),

    /// Run database migrations
    Migrate(MigrateArgs),

    /// Manage blocked email domain labels
    Blacklist(BlacklistArgs),

    /// Manage users
    Users(UsersArgs),
}

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Host to bind to, overrides SERVER_HOST
    #[arg(short = 'H', long)]
    pub host: Option<String>,

    /// Port to listen on, overrides SERVER_PORT
    #[arg(short, long)]
    pub port: Option<u16>,
}

/// Arguments for the migrate command
#[derive(Parser, Debug)]
pub struct MigrateArgs {
    #[command(subcommand)]
    pub action: MigrateAction,
}

/// Migration actions
#[derive(Subcommand, Debug)]
pub enum MigrateAction {
    /// Run pending migrations
    Up,
    /// Rollback last migration
    Down,
    /// Show migration status
    Status,
    /// Reset and re-run all migrations
    Fresh,
}

/// Arguments for the blacklist command
#[derive(Parser, Debug)]
pub struct BlacklistArgs {
    #[command(subcommand)]
    pub action: BlacklistAction,
}

/// Blacklist actions
#[derive(Subcommand, Debug)]
pub enum BlacklistAction {
    /// Block one or more labels (e.g. "spammy")
    Add {
        #[arg(required = true)]
        domains: Vec<String>,
    },
    /// List blocked labels
    List,
    /// Remove an entry by id
    Remove { id: Uuid },
    /// Report whether an email address would be rejected
    Check { email: String },
}

/// Arguments for the users command
#[derive(Parser, Debug)]
pub struct UsersArgs {
    #[command(subcommand)]
    pub action: UsersAction,
}

/// User actions
#[derive(Subcommand, Debug)]
pub enum UsersAction {
    /// Grant the admin role
    Promote { email: String },
}
