//! User service - account lookup and role administration.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{User, UserRole};
use crate::errors::{AppError, AppResult};
use crate::infra::UnitOfWork;

/// User service trait for dependency injection.
#[async_trait]
pub trait UserService: Send + Sync {
    /// Get user by ID
    async fn get_user(&self, id: Uuid) -> AppResult<User>;

    /// Grant the admin role to the user with this email
    async fn promote_to_admin(&self, email: &str) -> AppResult<User>;
}

/// Concrete implementation of UserService using Unit of Work.
pub struct UserManager<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> UserManager<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl<U: UnitOfWork> UserService for UserManager<U> {
    async fn get_user(&self, id: Uuid) -> AppResult<User> {
        self.uow
            .users()
            .find_by_id(id)
            .await?
            .ok_or(AppError::UserNotFound)
    }

    async fn promote_to_admin(&self, email: &str) -> AppResult<User> {
        let users = self.uow.users();
        let user = users
            .find_by_email(email)
            .await?
            .ok_or(AppError::UserNotFound)?;

        if user.is_admin() {
            return Ok(user);
        }

        let user = users.set_role(user.id, UserRole::Admin).await?;
        tracing::info!(user_id = %user.id, "User promoted to admin");
        Ok(user)
    }
}
