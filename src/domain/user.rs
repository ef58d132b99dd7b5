//! User domain entity and related types.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::{ROLE_ADMIN, ROLE_USER};
use crate::errors::{AppError, AppResult};

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]{3,21}$").expect("valid username regex"));
static PHONE_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+[0-9]{1,4}$").expect("valid phone code regex"));
static PHONE_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{6,15}$").expect("valid phone number regex"));

/// User roles enumeration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

impl UserRole {
    /// Check if this role has admin privileges
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

impl From<&str> for UserRole {
    fn from(s: &str) -> Self {
        match s {
            ROLE_ADMIN => UserRole::Admin,
            _ => UserRole::User,
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Admin => write!(f, "{}", ROLE_ADMIN),
            UserRole::User => write!(f, "{}", ROLE_USER),
        }
    }
}

/// User domain entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Display name, may be empty
    pub name: String,
    pub phone_code: Option<String>,
    pub phone_number: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Check if user has admin role
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Phone in international form, empty unless both parts are known.
    pub fn full_phone(&self) -> String {
        match (&self.phone_code, &self.phone_number) {
            (Some(code), Some(number)) => format!("{}{}", code, number),
            _ => String::new(),
        }
    }
}

/// Registration input shared by password and passwordless signup.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    /// `None` for passwordless signup; a random password is generated.
    pub password: Option<String>,
    pub name: String,
    pub phone_code: Option<String>,
    pub phone_number: Option<String>,
}

impl CreateUser {
    /// Field rules that the request extractor cannot express.
    pub fn validate(&self) -> AppResult<()> {
        if !USERNAME_RE.is_match(&self.username) {
            return Err(AppError::validation(
                "Username must be 3-21 characters of letters, digits or underscores",
            ));
        }

        match (&self.phone_code, &self.phone_number) {
            (None, None) => {}
            (Some(code), Some(number)) => {
                if !PHONE_CODE_RE.is_match(code) {
                    return Err(AppError::validation("Invalid phone code"));
                }
                if !PHONE_NUMBER_RE.is_match(number) {
                    return Err(AppError::validation("Invalid phone number"));
                }
            }
            _ => {
                return Err(AppError::validation(
                    "Phone code and phone number must be provided together",
                ))
            }
        }

        Ok(())
    }
}

/// Row to insert, after hashing.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub phone_code: Option<String>,
    pub phone_number: Option<String>,
}

/// User response (safe to return to client)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,
    #[schema(example = "jane_doe")]
    pub username: String,
    #[schema(example = "user@example.com")]
    pub email: String,
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "+1")]
    pub phone_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "5550100")]
    pub phone_number: Option<String>,
    #[schema(example = "user")]
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            name: user.name,
            phone_code: user.phone_code,
            phone_number: user.phone_number,
            role: user.role.to_string(),
            created_at: user.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(username: &str) -> CreateUser {
        CreateUser {
            username: username.to_string(),
            email: "jane@example.com".to_string(),
            password: None,
            name: "Jane".to_string(),
            phone_code: None,
            phone_number: None,
        }
    }

    #[test]
    fn test_username_rules() {
        assert!(input("jane_doe").validate().is_ok());
        assert!(input("ab").validate().is_err());
        assert!(input("has space").validate().is_err());
        assert!(input("a_very_long_username_xx").validate().is_err());
    }

    #[test]
    fn test_phone_must_be_complete() {
        let mut user = input("jane");
        user.phone_code = Some("+44".to_string());
        assert!(user.validate().is_err());

        user.phone_number = Some("7700900123".to_string());
        assert!(user.validate().is_ok());

        user.phone_code = Some("44".to_string());
        assert!(user.validate().is_err());
    }

    #[test]
    fn test_full_phone() {
        let user = User {
            id: Uuid::new_v4(),
            username: "jane".to_string(),
            email: "jane@example.com".to_string(),
            password_hash: "hashed".to_string(),
            name: "Jane".to_string(),
            phone_code: Some("+1".to_string()),
            phone_number: Some("5550100".to_string()),
            role: UserRole::User,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(user.full_phone(), "+15550100");

        let without = User { phone_number: None, ..user };
        assert_eq!(without.full_phone(), "");
    }

    #[test]
    fn test_user_role_from_str() {
        assert_eq!(UserRole::from("admin"), UserRole::Admin);
        assert_eq!(UserRole::from("anything"), UserRole::User);
        assert_eq!(UserRole::Admin.to_string(), "admin");
    }
}
