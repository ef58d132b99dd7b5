//! HTTP request handlers.

pub mod auth_handler;
pub mod blacklist_handler;
pub mod user_handler;

pub use auth_handler::auth_routes;
pub use blacklist_handler::blacklist_routes;
pub use user_handler::user_routes;
