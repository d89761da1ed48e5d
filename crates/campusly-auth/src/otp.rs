//! One-time verification codes.
//!
//! A code is a short string of decimal digits mailed to the user. Only a
//! SHA-256 digest of `user_id:purpose:code` is persisted, so equal codes for
//! different users never share a digest.
//!
//! [`OtpState::check`] decides the outcome of a guess; the caller persists
//! the attempt counter or consumption afterwards.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::tokens::{constant_time_eq, random_digits, sha256_hex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OtpPurpose {
    EmailVerification,
    PasswordReset,
}

impl OtpPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            OtpPurpose::EmailVerification => "email_verification",
            OtpPurpose::PasswordReset => "password_reset",
        }
    }
}

impl fmt::Display for OtpPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OtpPurpose {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email_verification" => Ok(OtpPurpose::EmailVerification),
            "password_reset" => Ok(OtpPurpose::PasswordReset),
            other => Err(format!("Unknown OTP purpose: {}", other)),
        }
    }
}

pub fn generate_code(length: usize) -> String {
    random_digits(length)
}

pub fn hash_code(user_id: Uuid, purpose: OtpPurpose, code: &str) -> String {
    sha256_hex(format!("{}:{}:{}", user_id, purpose.as_str(), code.trim()).as_bytes())
}

/// Result of checking a submitted code against the latest issued one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpCheck {
    Verified,
    Expired,
    Mismatch { attempts_left: i32 },
    Exhausted,
    AlreadyConsumed,
}

impl OtpCheck {
    pub fn message(&self) -> String {
        match self {
            OtpCheck::Verified => "Code verified".to_string(),
            OtpCheck::Expired => "Code has expired, request a new one".to_string(),
            OtpCheck::Mismatch { attempts_left } => {
                format!("Invalid code, {} attempt(s) left", attempts_left)
            }
            OtpCheck::Exhausted => "Too many invalid attempts, request a new code".to_string(),
            OtpCheck::AlreadyConsumed => "Code has already been used".to_string(),
        }
    }
}

/// The persisted fields of an issued code that matter for checking it.
#[derive(Debug, Clone)]
pub struct OtpState {
    pub code_hash: String,
    pub expires_at: DateTime<Utc>,
    pub attempts: i32,
    pub max_attempts: i32,
    pub consumed: bool,
}

impl OtpState {
    /// Evaluates `candidate_hash` at `now`.
    ///
    /// Consumption is checked first, then exhaustion, then expiry, so a stale
    /// code that was also brute-forced reports `Exhausted`.
    pub fn check(&self, candidate_hash: &str, now: DateTime<Utc>) -> OtpCheck {
        if self.consumed {
            return OtpCheck::AlreadyConsumed;
        }
        if self.attempts >= self.max_attempts {
            return OtpCheck::Exhausted;
        }
        if now >= self.expires_at {
            return OtpCheck::Expired;
        }
        if constant_time_eq(&self.code_hash, candidate_hash) {
            return OtpCheck::Verified;
        }
        OtpCheck::Mismatch {
            attempts_left: (self.max_attempts - self.attempts - 1).max(0),
        }
    }
}

/// Seconds the caller must still wait before another code may be issued,
/// or `None` when a resend is allowed.
pub fn resend_wait_seconds(
    last_issued_at: Option<DateTime<Utc>>,
    cooldown_seconds: i64,
    now: DateTime<Utc>,
) -> Option<i64> {
    let last = last_issued_at?;
    let ready_at = last + Duration::seconds(cooldown_seconds);
    if now < ready_at {
        Some((ready_at - now).num_seconds().max(1))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(code: &str, user: Uuid, attempts: i32) -> OtpState {
        OtpState {
            code_hash: hash_code(user, OtpPurpose::EmailVerification, code),
            expires_at: Utc::now() + Duration::minutes(10),
            attempts,
            max_attempts: 5,
            consumed: false,
        }
    }

    #[test]
    fn test_generate_code_length() {
        let code = generate_code(6);
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_hash_is_bound_to_user_and_purpose() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_ne!(
            hash_code(a, OtpPurpose::EmailVerification, "123456"),
            hash_code(b, OtpPurpose::EmailVerification, "123456")
        );
        assert_ne!(
            hash_code(a, OtpPurpose::EmailVerification, "123456"),
            hash_code(a, OtpPurpose::PasswordReset, "123456")
        );
        assert_eq!(
            hash_code(a, OtpPurpose::PasswordReset, " 123456 "),
            hash_code(a, OtpPurpose::PasswordReset, "123456")
        );
    }

    #[test]
    fn test_correct_code_verifies() {
        let user = Uuid::new_v4();
        let s = state("123456", user, 0);
        let guess = hash_code(user, OtpPurpose::EmailVerification, "123456");
        assert_eq!(s.check(&guess, Utc::now()), OtpCheck::Verified);
    }

    #[test]
    fn test_wrong_code_reports_attempts_left() {
        let user = Uuid::new_v4();
        let s = state("123456", user, 1);
        let guess = hash_code(user, OtpPurpose::EmailVerification, "000000");
        assert_eq!(
            s.check(&guess, Utc::now()),
            OtpCheck::Mismatch { attempts_left: 3 }
        );
    }

    #[test]
    fn test_last_wrong_guess_leaves_zero() {
        let user = Uuid::new_v4();
        let s = state("123456", user, 4);
        let guess = hash_code(user, OtpPurpose::EmailVerification, "000000");
        assert_eq!(
            s.check(&guess, Utc::now()),
            OtpCheck::Mismatch { attempts_left: 0 }
        );
    }

    #[test]
    fn test_exhausted_even_with_correct_code() {
        let user = Uuid::new_v4();
        let s = state("123456", user, 5);
        let guess = hash_code(user, OtpPurpose::EmailVerification, "123456");
        assert_eq!(s.check(&guess, Utc::now()), OtpCheck::Exhausted);
    }

    #[test]
    fn test_expired_code() {
        let user = Uuid::new_v4();
        let s = state("123456", user, 0);
        let guess = hash_code(user, OtpPurpose::EmailVerification, "123456");
        let later = Utc::now() + Duration::minutes(11);
        assert_eq!(s.check(&guess, later), OtpCheck::Expired);
    }

    #[test]
    fn test_consumed_code() {
        let user = Uuid::new_v4();
        let mut s = state("123456", user, 0);
        s.consumed = true;
        let guess = hash_code(user, OtpPurpose::EmailVerification, "123456");
        assert_eq!(s.check(&guess, Utc::now()), OtpCheck::AlreadyConsumed);
    }

    #[test]
    fn test_resend_cooldown() {
        let now = Utc::now();
        assert_eq!(resend_wait_seconds(None, 60, now), None);
        assert_eq!(
            resend_wait_seconds(Some(now - Duration::seconds(20)), 60, now),
            Some(40)
        );
        assert_eq!(
            resend_wait_seconds(Some(now - Duration::seconds(61)), 60, now),
            None
        );
    }

    #[test]
    fn test_purpose_parse() {
        assert_eq!(
            "password_reset".parse::<OtpPurpose>().unwrap(),
            OtpPurpose::PasswordReset
        );
        assert!("sms".parse::<OtpPurpose>().is_err());
        assert_eq!(OtpPurpose::EmailVerification.to_string(), "email_verification");
    }
}
