//! Domain layer - Core business entities and logic
//!
//! Models and rules that do not depend on storage or transport.

pub mod blacklist;
pub mod otp;
pub mod password;
pub mod user;

pub use blacklist::{email_domain, is_domain_blocked, BlacklistEntry};
pub use otp::{OtpCode, OtpKey};
pub use password::Password;
pub use user::{CreateUser, NewUser, User, UserResponse, UserRole};
