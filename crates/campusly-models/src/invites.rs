//! Invite models.

use campusly_auth::{InviteState, InviteStatus};
use campusly_core::serde::deserialize_optional_i64;
use campusly_core::{AppError, PaginationParams};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::users::UserRole;

pub const MAX_INVITE_USES: i32 = 100;
pub const MAX_INVITE_TTL_HOURS: i64 = 720;

/// An invite as stored. The token digest is never selected into this struct.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Invite {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    #[schema(example = "pending")]
    pub status: String,
    pub max_uses: i32,
    pub use_count: i32,
    pub expires_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const INVITE_COLUMNS: &str =
    "id, email, role, status, max_uses, use_count, expires_at, created_by, created_at, updated_at";

impl Invite {
    pub fn state(&self) -> Result<InviteState, AppError> {
        let status = self
            .status
            .parse::<InviteStatus>()
            .map_err(AppError::internal_error)?;
        Ok(InviteState {
            status,
            use_count: self.use_count,
            max_uses: self.max_uses,
            expires_at: self.expires_at,
        })
    }
}

fn validate_invite_role(role: &UserRole) -> Result<(), ValidationError> {
    if role.is_staff() {
        Ok(())
    } else {
        Err(ValidationError::new("invite_role")
            .with_message("Invites are only issued for admin or teacher roles".into()))
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateInviteDto {
    #[validate(email)]
    pub email: String,
    #[validate(custom(function = "validate_invite_role"))]
    pub role: UserRole,
    /// Defaults to 1
    #[validate(range(min = 1, max = 100))]
    pub max_uses: Option<i32>,
    /// Defaults to `INVITE_TTL_HOURS`
    #[validate(range(min = 1, max = 720))]
    pub expires_in_hours: Option<i64>,
}

/// Returned once on creation; the plaintext token is not recoverable later.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CreatedInvite {
    pub invite: Invite,
    pub token: String,
    pub registration_url: String,
}

/// What an anonymous holder of the token may learn about the invite.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InvitePreview {
    pub email: String,
    pub role: String,
    pub status: InviteStatus,
    pub expires_at: DateTime<Utc>,
    pub uses_left: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidateInviteQuery {
    pub token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InviteFilterParams {
    pub status: Option<InviteStatus>,
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub limit: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub offset: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub page: Option<i64>,
}

impl InviteFilterParams {
    pub fn pagination(&self) -> PaginationParams {
        PaginationParams {
            limit: self.limit,
            offset: self.offset,
            page: self.page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dto(role: UserRole) -> CreateInviteDto {
        CreateInviteDto {
            email: "new.teacher@school.test".to_string(),
            role,
            max_uses: None,
            expires_in_hours: None,
        }
    }

    #[test]
    fn test_invites_only_for_staff_roles() {
        assert!(dto(UserRole::Teacher).validate().is_ok());
        assert!(dto(UserRole::Admin).validate().is_ok());
        assert!(dto(UserRole::Student).validate().is_err());
        assert!(dto(UserRole::Parent).validate().is_err());
    }

    #[test]
    fn test_invite_bounds() {
        let too_many = CreateInviteDto {
            max_uses: Some(MAX_INVITE_USES + 1),
            ..dto(UserRole::Teacher)
        };
        assert!(too_many.validate().is_err());

        let too_long = CreateInviteDto {
            expires_in_hours: Some(MAX_INVITE_TTL_HOURS + 1),
            ..dto(UserRole::Teacher)
        };
        assert!(too_long.validate().is_err());
    }

    #[test]
    fn test_state_parses_status() {
        let invite = Invite {
            id: Uuid::new_v4(),
            email: "x@school.test".to_string(),
            role: "teacher".to_string(),
            status: "active".to_string(),
            max_uses: 2,
            use_count: 1,
            expires_at: Utc::now(),
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let state = invite.state().unwrap();
        assert_eq!(state.status, InviteStatus::Active);
        assert_eq!(state.use_count, 1);

        let broken = Invite {
            status: "weird".to_string(),
            ..invite
        };
        assert!(broken.state().is_err());
    }

    #[test]
    fn test_filter_params() {
        let p: InviteFilterParams =
            serde_json::from_str(r#"{"status":"pending","page":"2"}"#).unwrap();
        assert_eq!(p.status, Some(InviteStatus::Pending));
        assert_eq!(p.pagination().offset(), 10);
    }
}
