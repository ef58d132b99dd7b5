//! Blacklist command - Manage blocked email domain labels from the shell.
//!
//! ```bash
//! forum-auth blacklist add spammy junkmail
//! forum-auth blacklist check someone@mail.spammy.co
//! ```

use std::sync::Arc;

use crate::cli::args::{BlacklistAction, BlacklistArgs};
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::infra::{Database, Persistence};
use crate::services::{BlacklistManager, BlacklistService};

/// Execute the blacklist command
pub async fn execute(args: BlacklistArgs, config: Config) -> AppResult<()> {
    let db = Database::connect_without_migrations(&config).await?;
    let blacklist = BlacklistManager::new(Arc::new(Persistence::new(db.get_connection())));

    run(&blacklist, args.action).await
}

async fn run(blacklist: &dyn BlacklistService, action: BlacklistAction) -> AppResult<()> {
    match action {
        BlacklistAction::Add { domains } => {
            let mut failed = 0;
            for (domain, outcome) in domains.iter().zip(blacklist.add_domains(domains.clone()).await) {
                match outcome {
                    Ok(entry) => println!("{}\t{}", entry.id, entry.domain),
                    Err(e) => {
                        failed += 1;
                        eprintln!("{}: {}", domain, e.user_message());
                    }
                }
            }
            if failed > 0 {
                return Err(AppError::validation(format!("{} domain(s) rejected", failed)));
            }
        }
        BlacklistAction::List => {
            for entry in blacklist.list_domains().await? {
                println!("{}\t{}\t{}", entry.id, entry.domain, entry.created_at);
            }
        }
        BlacklistAction::Remove { id } => {
            blacklist.delete_domain(id).await?;
            tracing::info!(%id, "Blacklist entry removed");
        }
        BlacklistAction::Check { email } => match blacklist.check_email(&email).await {
            Ok(()) => println!("{}: allowed", email),
            Err(AppError::BlockedDomain) => println!("{}: blocked", email),
            Err(e) => return Err(e),
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{MockBlacklistRepository, MockUserRepository};
    use crate::services::test_support::{banning, TestUnitOfWork};

    fn manager(repo: MockBlacklistRepository) -> BlacklistManager<TestUnitOfWork> {
        BlacklistManager::new(Arc::new(TestUnitOfWork::new(
            MockUserRepository::new(),
            repo,
        )))
    }

    #[tokio::test]
    async fn test_check_reports_blocked_without_failing() {
        let blacklist = manager(banning(&["spammy"]));

        let action = BlacklistAction::Check {
            email: "jane@mail.spammy.co".to_string(),
        };
        assert!(run(&blacklist, action).await.is_ok());
    }

    #[tokio::test]
    async fn test_add_invalid_label_fails() {
        let mut repo = MockBlacklistRepository::new();
        repo.expect_create().never();
        let blacklist = manager(repo);

        let action = BlacklistAction::Add {
            domains: vec!["spammy.co".to_string()],
        };
        assert!(matches!(
            run(&blacklist, action).await,
            Err(AppError::Validation(_))
        ));
    }
}
