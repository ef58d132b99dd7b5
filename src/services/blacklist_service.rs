//! Blacklist service - admin management of banned domain labels and the
//! email gate applied by every flow that accepts an address.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::BLACKLIST_BATCH_CONCURRENCY;
use crate::domain::blacklist::{email_domain, is_domain_blocked, validate_label};
use crate::domain::BlacklistEntry;
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;

/// Blacklist service trait for dependency injection.
#[async_trait]
pub trait BlacklistService: Send + Sync {
    /// Add one label. Duplicates are accepted.
    async fn add_domain(&self, domain: String) -> AppResult<BlacklistEntry>;

    /// Add many labels. One result per input, in input order.
    async fn add_domains(&self, domains: Vec<String>) -> Vec<AppResult<BlacklistEntry>>;

    async fn list_domains(&self) -> AppResult<Vec<BlacklistEntry>>;

    async fn get_domain(&self, id: Uuid) -> AppResult<BlacklistEntry>;

    async fn update_domain(&self, id: Uuid, domain: String) -> AppResult<BlacklistEntry>;

    async fn delete_domain(&self, id: Uuid) -> AppResult<()>;

    /// Whether any non-final label of `candidate` is banned.
    async fn is_domain_blocked(&self, candidate: &str) -> AppResult<bool>;

    /// Reject malformed addresses and addresses on a banned domain.
    async fn check_email(&self, email: &str) -> AppResult<()>;
}

/// Concrete implementation of BlacklistService using Unit of Work.
pub struct BlacklistManager<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> BlacklistManager<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl<U: UnitOfWork> BlacklistService for BlacklistManager<U> {
    async fn add_domain(&self, domain: String) -> AppResult<BlacklistEntry> {
        validate_label(&domain)?;
        let entry = self.uow.blacklist().create(domain).await?;
        tracing::info!(id = %entry.id, domain = %entry.domain, "Domain blacklisted");
        Ok(entry)
    }

    async fn add_domains(&self, domains: Vec<String>) -> Vec<AppResult<BlacklistEntry>> {
        // Bounded so a large batch cannot hold every pooled connection
        stream::iter(domains)
            .map(|domain| self.add_domain(domain))
            .buffered(BLACKLIST_BATCH_CONCURRENCY)
            .collect()
            .await
    }

    async fn list_domains(&self) -> AppResult<Vec<BlacklistEntry>> {
        self.uow.blacklist().list().await
    }

    async fn get_domain(&self, id: Uuid) -> AppResult<BlacklistEntry> {
        self.uow.blacklist().find_by_id(id).await?.ok_or_not_found()
    }

    async fn update_domain(&self, id: Uuid, domain: String) -> AppResult<BlacklistEntry> {
        validate_label(&domain)?;
        let entry = self.uow.blacklist().update(id, domain).await?;
        tracing::info!(id = %entry.id, domain = %entry.domain, "Blacklist entry updated");
        Ok(entry)
    }

    async fn delete_domain(&self, id: Uuid) -> AppResult<()> {
        self.uow.blacklist().delete(id).await?;
        tracing::info!(id = %id, "Blacklist entry deleted");
        Ok(())
    }

    async fn is_domain_blocked(&self, candidate: &str) -> AppResult<bool> {
        if !candidate.contains('.') {
            return Ok(false);
        }
        let banned = self.uow.blacklist().domains().await?;
        Ok(is_domain_blocked(candidate, &banned))
    }

    async fn check_email(&self, email: &str) -> AppResult<()> {
        let domain = email_domain(email)?;
        if self.is_domain_blocked(domain).await? {
            tracing::info!(domain = %domain, "Rejected email on blacklisted domain");
            return Err(AppError::BlockedDomain);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mockall::predicate::eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::infra::{MockBlacklistRepository, MockUserRepository};
    use crate::services::test_support::{banning, TestUnitOfWork};

    fn manager(repo: MockBlacklistRepository) -> BlacklistManager<TestUnitOfWork> {
        BlacklistManager::new(Arc::new(TestUnitOfWork::new(MockUserRepository::new(), repo)))
    }

    fn entry(domain: &str) -> BlacklistEntry {
        BlacklistEntry {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            domain: domain.to_string(),
        }
    }

    #[tokio::test]
    async fn test_check_email_blocks_inner_label() {
        let service = manager(banning(&["spammy"]));

        assert!(matches!(
            service.check_email("jane@mail.spammy.co").await,
            Err(AppError::BlockedDomain)
        ));
        assert!(matches!(
            service.check_email("jane@spammy.co").await,
            Err(AppError::BlockedDomain)
        ));
        assert!(service.check_email("jane@co.spammy").await.is_ok());
    }

    #[tokio::test]
    async fn test_check_email_rejects_malformed() {
        let service = manager(banning(&[]));

        assert!(matches!(
            service.check_email("not-an-email").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            service.check_email("a@b@c.com").await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_dotless_domain_skips_lookup() {
        let mut repo = MockBlacklistRepository::new();
        repo.expect_domains().never();

        assert!(!manager(repo).is_domain_blocked("localhost").await.unwrap());
    }

    #[tokio::test]
    async fn test_batch_isolates_failures() {
        let mut repo = MockBlacklistRepository::new();
        repo.expect_create()
            .with(eq("spam".to_string()))
            .returning(|d| Ok(entry(&d)));

        let results = manager(repo)
            .add_domains(vec!["spam".to_string(), "bad.label".to_string()])
            .await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_ref().unwrap().domain, "spam");
        assert!(matches!(results[1], Err(AppError::Validation(_))));
    }

    /// Counts how many inserts are running at once.
    #[derive(Default)]
    struct SlowInserts {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl crate::infra::BlacklistRepository for SlowInserts {
        async fn create(&self, domain: String) -> AppResult<BlacklistEntry> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(entry(&domain))
        }

        async fn list(&self) -> AppResult<Vec<BlacklistEntry>> {
            Ok(Vec::new())
        }

        async fn find_by_id(&self, _id: Uuid) -> AppResult<Option<BlacklistEntry>> {
            Ok(None)
        }

        async fn update(&self, _id: Uuid, _domain: String) -> AppResult<BlacklistEntry> {
            Err(AppError::NotFound)
        }

        async fn delete(&self, _id: Uuid) -> AppResult<()> {
            Err(AppError::NotFound)
        }

        async fn domains(&self) -> AppResult<Vec<String>> {
            Ok(Vec::new())
        }
    }

    struct SlowUnitOfWork(Arc<SlowInserts>);

    impl UnitOfWork for SlowUnitOfWork {
        fn users(&self) -> Arc<dyn crate::infra::UserRepository> {
            Arc::new(MockUserRepository::new())
        }

        fn blacklist(&self) -> Arc<dyn crate::infra::BlacklistRepository> {
            self.0.clone()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_bounds_concurrent_inserts() {
        let repo = Arc::new(SlowInserts::default());
        let service = BlacklistManager::new(Arc::new(SlowUnitOfWork(repo.clone())));

        let domains: Vec<String> = (0..50).map(|i| format!("spam{}", i)).collect();
        let results = service.add_domains(domains).await;

        assert_eq!(results.len(), 50);
        assert_eq!(results[0].as_ref().unwrap().domain, "spam0");
        assert_eq!(results[49].as_ref().unwrap().domain, "spam49");
        let peak = repo.peak.load(Ordering::SeqCst);
        assert!(peak >= 1 && peak <= BLACKLIST_BATCH_CONCURRENCY, "peak was {}", peak);
    }

    #[tokio::test]
    async fn test_get_unknown_is_not_found() {
        let mut repo = MockBlacklistRepository::new();
        repo.expect_find_by_id().returning(|_| Ok(None));

        assert!(matches!(
            manager(repo).get_domain(Uuid::new_v4()).await,
            Err(AppError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let mut repo = MockBlacklistRepository::new();
        repo.expect_domains()
            .returning(|| Err(AppError::internal("connection reset")));

        assert!(manager(repo).check_email("jane@mail.example.com").await.is_err());
    }
}
