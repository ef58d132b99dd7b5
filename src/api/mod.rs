//! API layer - HTTP handlers and middleware
//!
//! - Request handlers for auth, users and blacklist administration
//! - Middleware (bearer auth, admin gate, rate limiting)
//! - Custom extractors
//! - Route definitions

pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use routes::create_router;
pub use state::AppState;
