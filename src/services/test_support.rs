//! Shared fixtures for service unit tests.

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::Config;
use crate::domain::{User, UserRole};
use crate::infra::{
    BlacklistRepository, MockBlacklistRepository, MockUserRepository, UnitOfWork, UserRepository,
};

/// Unit of Work over mock repositories.
pub(crate) struct TestUnitOfWork {
    users: Arc<MockUserRepository>,
    blacklist: Arc<MockBlacklistRepository>,
}

impl TestUnitOfWork {
    pub fn new(users: MockUserRepository, blacklist: MockBlacklistRepository) -> Self {
        Self {
            users: Arc::new(users),
            blacklist: Arc::new(blacklist),
        }
    }
}

impl UnitOfWork for TestUnitOfWork {
    fn users(&self) -> Arc<dyn UserRepository> {
        self.users.clone()
    }

    fn blacklist(&self) -> Arc<dyn BlacklistRepository> {
        self.blacklist.clone()
    }
}

/// Blacklist repository whose stored labels are `labels`.
pub(crate) fn banning(labels: &'static [&'static str]) -> MockBlacklistRepository {
    let mut repo = MockBlacklistRepository::new();
    repo.expect_domains()
        .returning(move || Ok(labels.iter().map(|s| s.to_string()).collect()));
    repo
}

pub(crate) fn test_user(email: &str) -> User {
    User {
        id: Uuid::new_v4(),
        username: "jane_doe".to_string(),
        email: email.to_string(),
        password_hash: "hashed".to_string(),
        name: "Jane Doe".to_string(),
        phone_code: None,
        phone_number: None,
        role: UserRole::User,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub(crate) fn test_config() -> Config {
    Config::new("test-secret-key-for-testing-only-32chars")
}
