//! Persisted one-time codes.

use campusly_auth::OtpState;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// A row of `otp_codes`. Never serialized to clients.
#[derive(Debug, Clone, FromRow)]
pub struct OtpCode {
    pub id: Uuid,
    pub user_id: Uuid,
    pub purpose: String,
    pub code_hash: String,
    pub expires_at: DateTime<Utc>,
    pub attempts: i32,
    pub max_attempts: i32,
    pub consumed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl OtpCode {
    pub fn state(&self) -> OtpState {
        OtpState {
            code_hash: self.code_hash.clone(),
            expires_at: self.expires_at,
            attempts: self.attempts,
            max_attempts: self.max_attempts,
            consumed: self.consumed_at.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campusly_auth::OtpCheck;
    use campusly_auth::otp::hash_code;
    use campusly_auth::OtpPurpose;
    use chrono::Duration;

    #[test]
    fn test_state_reflects_consumption() {
        let user_id = Uuid::new_v4();
        let row = OtpCode {
            id: Uuid::new_v4(),
            user_id,
            purpose: "password_reset".to_string(),
            code_hash: hash_code(user_id, OtpPurpose::PasswordReset, "424242"),
            expires_at: Utc::now() + Duration::minutes(5),
            attempts: 0,
            max_attempts: 5,
            consumed_at: Some(Utc::now()),
            created_at: Utc::now(),
        };
        let guess = hash_code(user_id, OtpPurpose::PasswordReset, "424242");
        assert_eq!(row.state().check(&guess, Utc::now()), OtpCheck::AlreadyConsumed);
    }
}
