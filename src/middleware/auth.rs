use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use campusly_auth::{Claims, verify_token};
use campusly_core::AppError;
use campusly_models::users::UserRole;
use uuid::Uuid;

use crate::state::AppState;

/// Extractor that validates the bearer JWT and provides the caller's claims.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    /// Get the user ID as UUID
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.0.sub)
            .map_err(|_| AppError::unauthorized("Invalid user ID in token".to_string()))
    }

    pub fn email(&self) -> &str {
        &self.0.email
    }

    /// The role claim, rejected with 401 when it is not a known role.
    pub fn role(&self) -> Result<UserRole, AppError> {
        self.0
            .role
            .parse()
            .map_err(|_| AppError::unauthorized("Invalid role in token".to_string()))
    }

    pub fn is_admin(&self) -> bool {
        matches!(self.role(), Ok(UserRole::Admin))
    }

    pub fn is_staff(&self) -> bool {
        self.role().map(|r| r.is_staff()).unwrap_or(false)
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing authorization header".to_string()))?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::unauthorized("Invalid authorization header format".to_string())
        })?;

        let claims = verify_token(token, &state.jwt_config)?;

        Ok(AuthUser(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth_user(sub: &str, role: &str) -> AuthUser {
        AuthUser(Claims {
            sub: sub.to_string(),
            email: "someone@example.com".to_string(),
            role: role.to_string(),
            exp: 0,
            iat: 0,
        })
    }

    #[test]
    fn test_user_id_parses_subject() {
        let id = Uuid::new_v4();
        assert_eq!(auth_user(&id.to_string(), "admin").user_id().unwrap(), id);
    }

    #[test]
    fn test_bad_subject_is_unauthorized() {
        let err = auth_user("not-a-uuid", "admin").user_id().unwrap_err();
        assert_eq!(err.status.as_u16(), 401);
    }

    #[test]
    fn test_role_helpers() {
        let id = Uuid::new_v4().to_string();
        assert!(auth_user(&id, "admin").is_admin());
        assert!(auth_user(&id, "admin").is_staff());
        assert!(auth_user(&id, "teacher").is_staff());
        assert!(!auth_user(&id, "teacher").is_admin());
        assert!(!auth_user(&id, "parent").is_staff());
        assert!(!auth_user(&id, "janitor").is_staff());
        assert!(auth_user(&id, "janitor").role().is_err());
    }
}
