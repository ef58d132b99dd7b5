//! Forum auth - signup, login and one-time passcode authentication.
//!
//! Every flow that accepts an email checks its domain against an
//! admin-managed blacklist. OTP codes live in Redis with a TTL and are
//! delivered by a background notification worker.
//!
//! # Architecture Layers
//!
//! - **cli**: Command-line interface
//! - **commands**: CLI command implementations
//! - **config**: Application configuration and constants
//! - **domain**: Core entities and pure rules (domain matching, OTP codes)
//! - **services**: Use cases (blacklist, OTP, auth, users)
//! - **infra**: Database, Redis, notification provider, captcha
//! - **jobs**: Notification queue and worker
//! - **api**: HTTP handlers, middleware, and routes
//! - **errors**: Centralized error handling
//!
//! # CLI Usage
//!
//! ```bash
//! forum-auth serve
//! forum-auth migrate up
//! forum-auth blacklist add spammy
//! forum-auth users promote admin@example.com
//! ```

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod infra;
pub mod jobs;
pub mod services;

// Re-export commonly used types at crate root
pub use api::AppState;
pub use config::Config;
pub use domain::{BlacklistEntry, User, UserRole};
pub use errors::{AppError, AppResult};
