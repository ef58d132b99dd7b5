//! Blacklist repository implementation.

use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QuerySelect, Set};
use uuid::Uuid;

use super::entities::blacklist::{self, ActiveModel, Entity as BlacklistEntity};
use crate::domain::BlacklistEntry;
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Persistence for banned domain labels.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait BlacklistRepository: Send + Sync {
    /// Insert an entry. Duplicates are accepted.
    async fn create(&self, domain: String) -> AppResult<BlacklistEntry>;

    /// All entries, unordered
    async fn list(&self) -> AppResult<Vec<BlacklistEntry>>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<BlacklistEntry>>;

    async fn update(&self, id: Uuid, domain: String) -> AppResult<BlacklistEntry>;

    async fn delete(&self, id: Uuid) -> AppResult<()>;

    /// Just the labels, for matching
    async fn domains(&self) -> AppResult<Vec<String>>;
}

/// SeaORM-backed blacklist repository
pub struct BlacklistStore {
    db: DatabaseConnection,
}

impl BlacklistStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BlacklistRepository for BlacklistStore {
    async fn create(&self, domain: String) -> AppResult<BlacklistEntry> {
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            created_at: Set(chrono::Utc::now()),
            domain: Set(domain),
        };

        let model = active_model.insert(&self.db).await?;
        Ok(BlacklistEntry::from(model))
    }

    async fn list(&self) -> AppResult<Vec<BlacklistEntry>> {
        let models = BlacklistEntity::find().all(&self.db).await?;
        Ok(models.into_iter().map(BlacklistEntry::from).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<BlacklistEntry>> {
        let result = BlacklistEntity::find_by_id(id).one(&self.db).await?;
        Ok(result.map(BlacklistEntry::from))
    }

    async fn update(&self, id: Uuid, domain: String) -> AppResult<BlacklistEntry> {
        let entry = BlacklistEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let mut active: ActiveModel = entry.into();
        active.domain = Set(domain);

        let model = active.update(&self.db).await?;
        Ok(BlacklistEntry::from(model))
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = BlacklistEntity::delete_by_id(id).exec(&self.db).await?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }

        Ok(())
    }

    async fn domains(&self) -> AppResult<Vec<String>> {
        let domains = BlacklistEntity::find()
            .select_only()
            .column(blacklist::Column::Domain)
            .into_tuple::<String>()
            .all(&self.db)
            .await?;

        Ok(domains)
    }
}
