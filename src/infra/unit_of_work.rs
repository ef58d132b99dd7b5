//! Unit of Work - centralized repository access.
//!
//! Services depend on this trait rather than on individual stores, so a
//! test can swap every repository at once.

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use super::repositories::{BlacklistRepository, BlacklistStore, UserRepository, UserStore};

/// Repository access for services.
pub trait UnitOfWork: Send + Sync {
    /// Get user repository
    fn users(&self) -> Arc<dyn UserRepository>;

    /// Get blacklist repository
    fn blacklist(&self) -> Arc<dyn BlacklistRepository>;
}

/// Database-backed implementation of UnitOfWork
pub struct Persistence {
    user_repo: Arc<UserStore>,
    blacklist_repo: Arc<BlacklistStore>,
}

impl Persistence {
    /// Create new UnitOfWork instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            user_repo: Arc::new(UserStore::new(db.clone())),
            blacklist_repo: Arc::new(BlacklistStore::new(db)),
        }
    }
}

impl UnitOfWork for Persistence {
    fn users(&self) -> Arc<dyn UserRepository> {
        self.user_repo.clone()
    }

    fn blacklist(&self) -> Arc<dyn BlacklistRepository> {
        self.blacklist_repo.clone()
    }
}
