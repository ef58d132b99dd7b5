//! One-time passcodes and the keys they are stored under.

use rand::{rngs::OsRng, Rng};
use uuid::Uuid;

use crate::config::CACHE_PREFIX_OTP;

/// Numeric one-time passcode. Leading zeros are significant.
#[derive(Clone, PartialEq, Eq)]
pub struct OtpCode(String);

impl OtpCode {
    /// Draw `len` independent digits from the OS random source.
    pub fn generate(len: usize) -> Self {
        let code = (0..len)
            .map(|_| char::from(b'0' + OsRng.gen_range(0..10u8)))
            .collect();
        Self(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for OtpCode {
    fn from(code: String) -> Self {
        Self(code)
    }
}

impl std::fmt::Debug for OtpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("OtpCode([REDACTED])")
    }
}

/// Store key for one OTP session: `otp:{email}:{session_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OtpKey(String);

impl OtpKey {
    pub fn new(email: &str, session_id: Uuid) -> Self {
        Self(format!("{}{}:{}", CACHE_PREFIX_OTP, email, session_id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_has_requested_digits() {
        for _ in 0..100 {
            let code = OtpCode::generate(4);
            assert_eq!(code.as_str().len(), 4);
            assert!(code.as_str().chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_codes_vary() {
        let codes: std::collections::HashSet<String> = (0..50)
            .map(|_| OtpCode::generate(6).as_str().to_string())
            .collect();
        assert!(codes.len() > 1);
    }

    #[test]
    fn test_debug_hides_code() {
        let code = OtpCode::from("0013".to_string());
        assert!(!format!("{:?}", code).contains("0013"));
    }

    #[test]
    fn test_key_layout() {
        let session = Uuid::nil();
        let key = OtpKey::new("jane@example.com", session);
        assert_eq!(
            key.as_str(),
            "otp:jane@example.com:00000000-0000-0000-0000-000000000000"
        );
    }
}
