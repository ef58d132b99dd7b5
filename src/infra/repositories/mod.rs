//! Repository layer - Data access abstraction
//!
//! Repositories provide an abstraction over data persistence,
//! following the Repository pattern for clean separation of concerns.

mod blacklist_repository;
pub(crate) mod entities;
mod user_repository;

pub use blacklist_repository::{BlacklistRepository, BlacklistStore};
pub use user_repository::{UserRepository, UserStore};

// Export mocks for tests (both unit and integration)
#[cfg(any(test, feature = "test-utils"))]
pub use blacklist_repository::MockBlacklistRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use user_repository::MockUserRepository;
