//! CLI module - Command-line interface for the application.
//!
//! - `serve` - Start the HTTP server
//! - `migrate` - Database migrations
//! - `blacklist` - Blocked domain administration
//! - `users` - User administration

pub mod args;

pub use args::{Cli, Commands};
