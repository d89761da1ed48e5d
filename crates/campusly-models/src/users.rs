//! User domain models and DTOs.
//!
//! Every person who can sign in is a row in `users`. Role-specific data
//! (student, teacher and parent profiles) lives in separate tables keyed by
//! `user_id`.

use std::fmt;
use std::str::FromStr;

use campusly_core::PaginationParams;
use campusly_core::serde::deserialize_optional_bool;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// The four roles a user can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Teacher,
    Student,
    Parent,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Teacher => "teacher",
            UserRole::Student => "student",
            UserRole::Parent => "parent",
        }
    }

    /// Admins and teachers.
    pub fn is_staff(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Teacher)
    }

    /// Roles open to self-registration without an invite.
    pub fn is_self_registrable(&self) -> bool {
        matches!(self, UserRole::Student | UserRole::Parent)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Ok(UserRole::Admin),
            "teacher" => Ok(UserRole::Teacher),
            "student" => Ok(UserRole::Student),
            "parent" => Ok(UserRole::Parent),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

/// A user as returned by the API. The password hash is never selected here.
#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    #[schema(example = "teacher")]
    pub role: String,
    pub is_verified: bool,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Columns selected for [`User`].
pub const USER_COLUMNS: &str = "id, first_name, last_name, email, phone, role, is_verified, \
     is_active, last_login_at, created_at, updated_at";

/// The fields needed to authenticate a user.
#[derive(FromRow, Debug, Clone)]
pub struct UserCredentials {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    pub password_hash: String,
    pub is_verified: bool,
    pub is_active: bool,
}

/// DTO for creating a user directly (admin only).
#[derive(Deserialize, Debug, Clone, Validate, ToSchema)]
pub struct CreateUserDto {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    pub role: UserRole,
}

/// DTO for admin edits. Only provided fields are changed.
#[derive(Deserialize, Debug, Clone, Default, Validate, ToSchema)]
pub struct UpdateUserDto {
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    pub role: Option<UserRole>,
}

#[derive(Deserialize, Debug, Clone, Default, Validate, ToSchema)]
pub struct UpdateProfileDto {
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Validate, ToSchema)]
pub struct ChangePasswordDto {
    #[validate(length(min = 1))]
    pub current_password: String,
    #[validate(length(min = 8))]
    pub new_password: String,
}

#[derive(Deserialize, Debug, Clone, ToSchema)]
pub struct UpdateUserStatusDto {
    pub is_active: bool,
}

/// Query parameters for `GET /users`.
#[derive(Deserialize, Debug, Clone)]
pub struct UserFilterParams {
    pub role: Option<UserRole>,
    /// Matches first name, last name or email (case-insensitive).
    pub search: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_bool")]
    pub is_active: Option<bool>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

/// Wraps `term` for an `ILIKE` match, or `None` when blank.
pub fn like_pattern(term: Option<&str>) -> Option<String> {
    term.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| format!("%{}%", t.replace('%', "\\%").replace('_', "\\_")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_and_display() {
        assert_eq!("Teacher".parse::<UserRole>().unwrap(), UserRole::Teacher);
        assert_eq!(UserRole::Parent.to_string(), "parent");
        assert!("janitor".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_role_groups() {
        assert!(UserRole::Admin.is_staff());
        assert!(UserRole::Teacher.is_staff());
        assert!(!UserRole::Student.is_staff());
        assert!(UserRole::Student.is_self_registrable());
        assert!(UserRole::Parent.is_self_registrable());
        assert!(!UserRole::Teacher.is_self_registrable());
    }

    #[test]
    fn test_role_serde_is_lowercase() {
        assert_eq!(serde_json::to_string(&UserRole::Admin).unwrap(), r#""admin""#);
        let r: UserRole = serde_json::from_str(r#""student""#).unwrap();
        assert_eq!(r, UserRole::Student);
    }

    #[test]
    fn test_create_user_dto_validation() {
        let dto = CreateUserDto {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@school.test".to_string(),
            password: "password123".to_string(),
            phone: None,
            role: UserRole::Teacher,
        };
        assert!(dto.validate().is_ok());

        let bad = CreateUserDto {
            email: "not-an-email".to_string(),
            password: "short".to_string(),
            ..dto
        };
        let errors = bad.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
        assert!(errors.field_errors().contains_key("password"));
    }

    #[test]
    fn test_update_profile_rejects_empty_name() {
        let dto = UpdateProfileDto {
            first_name: Some(String::new()),
            ..Default::default()
        };
        assert!(dto.validate().is_err());
        assert!(UpdateProfileDto::default().validate().is_ok());
    }

    #[test]
    fn test_filter_params_from_query() {
        let params: UserFilterParams =
            serde_json::from_str(r#"{"role":"teacher","is_active":"false","limit":"5"}"#).unwrap();
        assert_eq!(params.role, Some(UserRole::Teacher));
        assert_eq!(params.is_active, Some(false));
        assert_eq!(params.pagination.limit(), 5);
    }

    #[test]
    fn test_like_pattern() {
        assert_eq!(like_pattern(Some(" ada ")), Some("%ada%".to_string()));
        assert_eq!(like_pattern(Some("50%")), Some("%50\\%%".to_string()));
        assert_eq!(like_pattern(Some("  ")), None);
        assert_eq!(like_pattern(None), None);
    }
}
