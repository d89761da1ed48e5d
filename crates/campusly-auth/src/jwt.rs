//! JWT utilities for authentication.
//!
//! - **Access tokens**: Short-lived tokens carrying the user's id, email and role
//! - **Refresh tokens**: Long-lived tokens exchanged for a new access token
//!
//! Both are HS256-signed with the secret from [`JwtConfig`].

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use campusly_config::JwtConfig;
use campusly_core::AppError;

use crate::claims::{Claims, RefreshTokenClaims};

/// Returns `(iat, exp)` for a token living `expiry_secs` from now.
fn token_window(expiry_secs: i64) -> Result<(usize, usize), AppError> {
    let now = Utc::now().timestamp();
    let exp = now
        .checked_add(expiry_secs)
        .and_then(|exp| usize::try_from(exp).ok())
        .ok_or_else(|| {
            AppError::internal_error(format!("Token expiry of {}s is out of range", expiry_secs))
        })?;
    let iat = usize::try_from(now)
        .map_err(|_| AppError::internal_error("System clock is before the epoch".to_string()))?;
    Ok((iat, exp))
}

/// Creates an access token with the user's role embedded.
///
/// # Errors
///
/// Returns an internal error if token encoding fails.
pub fn create_access_token(
    user_id: Uuid,
    email: &str,
    role: &str,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let (now, exp) = token_window(jwt_config.access_token_expiry)?;

    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        role: role.to_string(),
        exp,
        iat: now,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| AppError::internal_error(format!("Failed to create token: {}", e)))
}

/// Verifies an access token and returns the embedded claims.
///
/// # Errors
///
/// Returns an unauthorized error if the signature is invalid, the token has
/// expired or the payload is not an access token.
pub fn verify_token(token: &str, jwt_config: &JwtConfig) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized("Invalid or expired token".to_string()))
}

/// Creates a refresh token for obtaining new access tokens.
pub fn create_refresh_token(
    user_id: Uuid,
    email: &str,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let (now, exp) = token_window(jwt_config.refresh_token_expiry)?;

    let claims = RefreshTokenClaims {
        sub: user_id.to_string(),
        email: email.to_string(),
        exp,
        iat: now,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| AppError::internal_error(format!("Failed to create refresh token: {}", e)))
}

/// Verifies a refresh token and returns the claims.
pub fn verify_refresh_token(
    token: &str,
    jwt_config: &JwtConfig,
) -> Result<RefreshTokenClaims, AppError> {
    decode::<RefreshTokenClaims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized("Invalid or expired refresh token".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_test_jwt_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-key-at-least-32-characters-long".to_string(),
            access_token_expiry: 3600,
            refresh_token_expiry: 604800,
        }
    }

    #[test]
    fn test_create_access_token_success() {
        let config = get_test_jwt_config();
        let token = create_access_token(Uuid::new_v4(), "test@example.com", "admin", &config)
            .unwrap();
        assert!(!token.is_empty());
        assert_eq!(token.split('.').count(), 3);
    }

    #[test]
    fn test_verify_token_success() {
        let config = get_test_jwt_config();
        let user_id = Uuid::new_v4();

        let token = create_access_token(user_id, "test@example.com", "teacher", &config).unwrap();
        let claims = verify_token(&token, &config).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.email, "test@example.com");
        assert_eq!(claims.role, "teacher");
        assert_eq!(claims.exp, claims.iat + 3600);
    }

    #[test]
    fn test_verify_token_invalid() {
        let config = get_test_jwt_config();
        let err = verify_token("invalid-token", &config).unwrap_err();
        assert_eq!(err.status.as_u16(), 401);
    }

    #[test]
    fn test_verify_token_wrong_secret() {
        let config = get_test_jwt_config();
        let token =
            create_access_token(Uuid::new_v4(), "test@example.com", "student", &config).unwrap();

        let wrong_config = JwtConfig {
            secret: "different-secret-key-at-least-32-characters".to_string(),
            ..get_test_jwt_config()
        };

        assert!(verify_token(&token, &wrong_config).is_err());
    }

    #[test]
    fn test_verify_token_expired() {
        let config = JwtConfig {
            access_token_expiry: -3600,
            ..get_test_jwt_config()
        };
        let token =
            create_access_token(Uuid::new_v4(), "test@example.com", "parent", &config).unwrap();
        assert!(verify_token(&token, &config).is_err());
    }

    #[test]
    fn test_out_of_range_expiry_is_an_error() {
        let config = JwtConfig {
            access_token_expiry: i64::MAX,
            refresh_token_expiry: i64::MIN,
            ..get_test_jwt_config()
        };
        let err = create_access_token(Uuid::new_v4(), "test@example.com", "admin", &config)
            .unwrap_err();
        assert_eq!(err.status.as_u16(), 500);

        let err = create_refresh_token(Uuid::new_v4(), "test@example.com", &config).unwrap_err();
        assert_eq!(err.status.as_u16(), 500);
    }

    #[test]
    fn test_refresh_token_roundtrip() {
        let config = get_test_jwt_config();
        let user_id = Uuid::new_v4();

        let token = create_refresh_token(user_id, "test@example.com", &config).unwrap();
        let claims = verify_refresh_token(&token, &config).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert!(Uuid::parse_str(&claims.jti).is_ok());
    }

    #[test]
    fn test_refresh_tokens_are_unique() {
        let config = get_test_jwt_config();
        let user_id = Uuid::new_v4();
        let a = create_refresh_token(user_id, "test@example.com", &config).unwrap();
        let b = create_refresh_token(user_id, "test@example.com", &config).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let config = get_test_jwt_config();
        let refresh = create_refresh_token(Uuid::new_v4(), "test@example.com", &config).unwrap();
        assert!(verify_token(&refresh, &config).is_err());

        let access =
            create_access_token(Uuid::new_v4(), "test@example.com", "admin", &config).unwrap();
        assert!(verify_refresh_token(&access, &config).is_err());
    }
}
