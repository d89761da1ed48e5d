//! Invite token status machine.
//!
//! ```text
//! pending ──validate──▶ active
//!    │                    │
//!    ├──────redeem────────┤──▶ used     (use_count reaches max_uses)
//!    ├──────clock─────────┤──▶ expired  (now >= expires_at)
//!    └──────admin─────────┘──▶ revoked
//! ```
//!
//! `used`, `expired` and `revoked` are terminal. Expiry is not driven by a
//! timer: [`InviteState::effective_status`] derives it on access and the
//! service persists the derived status.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::tokens::{random_hex, sha256_hex};

/// Random bytes in a plaintext invite token.
pub const TOKEN_BYTES: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum InviteStatus {
    Pending,
    Active,
    Used,
    Expired,
    Revoked,
}

impl InviteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InviteStatus::Pending => "pending",
            InviteStatus::Active => "active",
            InviteStatus::Used => "used",
            InviteStatus::Expired => "expired",
            InviteStatus::Revoked => "revoked",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            InviteStatus::Used | InviteStatus::Expired | InviteStatus::Revoked
        )
    }

    pub fn can_transition_to(&self, next: InviteStatus) -> bool {
        use InviteStatus::*;
        matches!(
            (self, next),
            (Pending, Active)
                | (Pending, Used)
                | (Pending, Expired)
                | (Pending, Revoked)
                | (Active, Used)
                | (Active, Expired)
                | (Active, Revoked)
        )
    }
}

impl fmt::Display for InviteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InviteStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(InviteStatus::Pending),
            "active" => Ok(InviteStatus::Active),
            "used" => Ok(InviteStatus::Used),
            "expired" => Ok(InviteStatus::Expired),
            "revoked" => Ok(InviteStatus::Revoked),
            other => Err(format!("Unknown invite status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InviteError {
    /// The invite is in a terminal state and cannot change.
    Closed(InviteStatus),
}

impl fmt::Display for InviteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InviteError::Closed(status) => write!(f, "Invite is {}", status),
        }
    }
}

impl std::error::Error for InviteError {}

/// Outcome of a successful redemption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Redemption {
    pub status: InviteStatus,
    pub use_count: i32,
}

#[derive(Debug, Clone)]
pub struct InviteState {
    pub status: InviteStatus,
    pub use_count: i32,
    pub max_uses: i32,
    pub expires_at: DateTime<Utc>,
}

impl InviteState {
    /// Stored status with lazy expiry applied.
    pub fn effective_status(&self, now: DateTime<Utc>) -> InviteStatus {
        if !self.status.is_terminal() && now >= self.expires_at {
            InviteStatus::Expired
        } else {
            self.status
        }
    }

    /// Opening the invite link: pending becomes active, active stays active.
    pub fn open(&self, now: DateTime<Utc>) -> Result<InviteStatus, InviteError> {
        match self.effective_status(now) {
            InviteStatus::Pending | InviteStatus::Active => Ok(InviteStatus::Active),
            closed => Err(InviteError::Closed(closed)),
        }
    }

    /// Consumes one use of the invite.
    pub fn redeem(&self, now: DateTime<Utc>) -> Result<Redemption, InviteError> {
        let current = self.effective_status(now);
        if current.is_terminal() {
            return Err(InviteError::Closed(current));
        }

        let use_count = self.use_count + 1;
        let status = if use_count >= self.max_uses {
            InviteStatus::Used
        } else {
            InviteStatus::Active
        };
        Ok(Redemption { status, use_count })
    }

    pub fn revoke(&self, now: DateTime<Utc>) -> Result<InviteStatus, InviteError> {
        let current = self.effective_status(now);
        if current.is_terminal() {
            return Err(InviteError::Closed(current));
        }
        Ok(InviteStatus::Revoked)
    }
}

pub fn generate_token() -> String {
    random_hex(TOKEN_BYTES)
}

pub fn hash_token(token: &str) -> String {
    sha256_hex(token.trim().as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn invite(status: InviteStatus, use_count: i32, max_uses: i32) -> InviteState {
        InviteState {
            status,
            use_count,
            max_uses,
            expires_at: Utc::now() + Duration::hours(72),
        }
    }

    #[test]
    fn test_open_pending_activates() {
        let i = invite(InviteStatus::Pending, 0, 1);
        assert_eq!(i.open(Utc::now()), Ok(InviteStatus::Active));
    }

    #[test]
    fn test_single_use_redeem_marks_used() {
        let i = invite(InviteStatus::Pending, 0, 1);
        let r = i.redeem(Utc::now()).unwrap();
        assert_eq!(r.status, InviteStatus::Used);
        assert_eq!(r.use_count, 1);
    }

    #[test]
    fn test_multi_use_stays_active_until_last() {
        let i = invite(InviteStatus::Active, 1, 3);
        let r = i.redeem(Utc::now()).unwrap();
        assert_eq!(r.status, InviteStatus::Active);
        assert_eq!(r.use_count, 2);

        let i = invite(InviteStatus::Active, 2, 3);
        assert_eq!(i.redeem(Utc::now()).unwrap().status, InviteStatus::Used);
    }

    #[test]
    fn test_expired_is_derived_lazily() {
        let mut i = invite(InviteStatus::Active, 0, 1);
        i.expires_at = Utc::now() - Duration::seconds(1);
        assert_eq!(i.effective_status(Utc::now()), InviteStatus::Expired);
        assert_eq!(
            i.redeem(Utc::now()),
            Err(InviteError::Closed(InviteStatus::Expired))
        );
        assert!(i.open(Utc::now()).is_err());
    }

    #[test]
    fn test_terminal_statuses_do_not_expire_again() {
        let mut i = invite(InviteStatus::Revoked, 0, 1);
        i.expires_at = Utc::now() - Duration::hours(1);
        assert_eq!(i.effective_status(Utc::now()), InviteStatus::Revoked);
    }

    #[test]
    fn test_terminal_cannot_be_redeemed_or_revoked() {
        for status in [InviteStatus::Used, InviteStatus::Revoked] {
            let i = invite(status, 1, 1);
            assert_eq!(i.redeem(Utc::now()), Err(InviteError::Closed(status)));
            assert_eq!(i.revoke(Utc::now()), Err(InviteError::Closed(status)));
        }
    }

    #[test]
    fn test_transition_table() {
        use InviteStatus::*;
        assert!(Pending.can_transition_to(Active));
        assert!(Active.can_transition_to(Used));
        assert!(!Active.can_transition_to(Pending));
        assert!(!Used.can_transition_to(Active));
        assert!(!Expired.can_transition_to(Active));
        assert!(!Revoked.can_transition_to(Pending));
    }

    #[test]
    fn test_error_message_names_status() {
        assert_eq!(
            InviteError::Closed(InviteStatus::Used).to_string(),
            "Invite is used"
        );
    }

    #[test]
    fn test_token_and_hash() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert_eq!(hash_token(&token), hash_token(&format!(" {} ", token)));
        assert_ne!(hash_token(&token), token);
    }

    #[test]
    fn test_status_parse_roundtrip() {
        for s in ["pending", "active", "used", "expired", "revoked"] {
            assert_eq!(s.parse::<InviteStatus>().unwrap().as_str(), s);
        }
        assert!("open".parse::<InviteStatus>().is_err());
    }
}
