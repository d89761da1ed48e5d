//! Authentication request and response models.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::users::{User, UserRole};

pub use campusly_auth::{Claims, OtpPurpose, RefreshTokenClaims};

/// Self-registration. Only `student` and `parent` are accepted here; staff
/// accounts need an invite.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(email)]
    #[schema(example = "parent@example.com")]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    pub role: UserRole,
}

/// Registration with an invite token. Email and role come from the invite.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct InviteRegisterRequest {
    #[validate(length(min = 1))]
    pub token: String,
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(length(min = 8))]
    pub password: String,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RegisterResponse {
    pub user: User,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    #[schema(example = "password123")]
    pub password: String,
}

/// Successful login: a token pair plus the user.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub user: User,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1))]
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct VerifyOtpRequest {
    #[validate(email)]
    pub email: String,
    pub purpose: OtpPurpose,
    #[validate(length(min = 4, max = 10))]
    #[schema(example = "123456")]
    pub code: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ResendOtpRequest {
    #[validate(email)]
    pub email: String,
    pub purpose: OtpPurpose,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ForgotPasswordRequest {
    #[validate(email)]
    #[schema(example = "user@example.com")]
    pub email: String,
}

/// Completes a password reset with the emailed code.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ResetPasswordRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 4, max = 10))]
    pub code: String,
    #[validate(length(min = 8))]
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_deserialize() {
        let req: RegisterRequest = serde_json::from_str(
            r#"{"first_name":"A","last_name":"B","email":"a@b.test","password":"password123","role":"parent"}"#,
        )
        .unwrap();
        assert_eq!(req.role, UserRole::Parent);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_register_request_unknown_role_fails_to_parse() {
        let result: Result<RegisterRequest, _> = serde_json::from_str(
            r#"{"first_name":"A","last_name":"B","email":"a@b.test","password":"password123","role":"root"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_verify_otp_request_validation() {
        let req = VerifyOtpRequest {
            email: "a@b.test".to_string(),
            purpose: OtpPurpose::EmailVerification,
            code: "12".to_string(),
        };
        assert!(req.validate().is_err());

        let req = VerifyOtpRequest {
            code: "123456".to_string(),
            ..req
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_reset_password_requires_strong_password() {
        let req = ResetPasswordRequest {
            email: "a@b.test".to_string(),
            code: "123456".to_string(),
            new_password: "short".to_string(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_otp_purpose_wire_format() {
        let req: ResendOtpRequest =
            serde_json::from_str(r#"{"email":"a@b.test","purpose":"password_reset"}"#).unwrap();
        assert_eq!(req.purpose, OtpPurpose::PasswordReset);
    }
}
