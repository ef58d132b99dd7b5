//! Email domain blacklist.
//!
//! Entries are single domain labels ("spammy"), matched against the
//! dot-separated components of an email's domain.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};

/// A banned domain label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct BlacklistEntry {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    #[schema(example = "spammy")]
    pub domain: String,
}

/// Domain part of an email address.
///
/// The address must split on `@` into exactly two parts.
pub fn email_domain(email: &str) -> AppResult<&str> {
    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(domain), None) => Ok(domain),
        _ => Err(AppError::validation("Invalid email format")),
    }
}

/// Whether any label of `candidate` except the last one equals a banned label.
///
/// Comparison is exact and case-sensitive. The final label (the TLD
/// position) is never checked, so `co.spammy` passes even when `spammy`
/// is banned.
pub fn is_domain_blocked<S: AsRef<str>>(candidate: &str, banned: &[S]) -> bool {
    let labels: Vec<&str> = candidate.split('.').collect();
    let checked = labels.len().saturating_sub(1);

    labels[..checked]
        .iter()
        .any(|label| banned.iter().any(|b| b.as_ref() == *label))
}

/// Validate a label before it is stored.
///
/// Dotted values could never match a single label, so they are rejected.
pub fn validate_label(domain: &str) -> AppResult<()> {
    if domain.is_empty() {
        return Err(AppError::validation("Domain must not be empty"));
    }
    if domain
        .chars()
        .any(|c| c == '.' || c == '@' || c.is_whitespace())
    {
        return Err(AppError::validation(
            "Domain must be a single label without dots, '@' or whitespace",
        ));
    }
    Ok(())
}
