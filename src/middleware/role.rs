//! Role-based authorization.
//!
//! Two ways to gate a route:
//! 1. Route layer: [`require_admin`] with `axum::middleware::from_fn_with_state`
//! 2. Extractors: [`RequireAdmin`] and [`RequireStaff`] in the handler signature

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use campusly_core::AppError;
use campusly_models::users::UserRole;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;

const STAFF: [UserRole; 2] = [UserRole::Admin, UserRole::Teacher];

/// Fails with 403 unless the caller holds one of `allowed_roles`.
pub fn check_any_role(auth_user: &AuthUser, allowed_roles: &[UserRole]) -> Result<(), AppError> {
    let role = auth_user.role()?;
    if allowed_roles.contains(&role) {
        return Ok(());
    }
    let required = allowed_roles
        .iter()
        .map(UserRole::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    Err(AppError::forbidden(format!(
        "Access denied. Required role: {}",
        required
    )))
}

/// Middleware that checks the authenticated user has one of the required roles.
///
/// ```rust,ignore
/// let protected = Router::new()
///     .route("/stats", get(stats))
///     .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));
/// ```
pub async fn require_roles(
    State(state): State<AppState>,
    req: Request,
    next: Next,
    allowed_roles: &[UserRole],
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let auth_user = AuthUser::from_request_parts(&mut parts, &state).await?;
    check_any_role(&auth_user, allowed_roles)?;

    parts.extensions.insert(auth_user);
    let req = Request::from_parts(parts, body);
    Ok(next.run(req).await)
}

pub async fn require_admin(State(state): State<AppState>, req: Request, next: Next) -> Response {
    match require_roles(State(state), req, next, &[UserRole::Admin]).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

#[derive(Debug, Clone)]
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_user = AuthUser::from_request_parts(parts, state).await?;
        check_any_role(&auth_user, &[UserRole::Admin])?;
        Ok(RequireAdmin(auth_user))
    }
}

#[derive(Debug, Clone)]
pub struct RequireStaff(pub AuthUser);

impl FromRequestParts<AppState> for RequireStaff {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_user = AuthUser::from_request_parts(parts, state).await?;
        check_any_role(&auth_user, &STAFF)?;
        Ok(RequireStaff(auth_user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campusly_auth::Claims;

    fn user_with_role(role: &str) -> AuthUser {
        AuthUser(Claims {
            sub: uuid::Uuid::new_v4().to_string(),
            email: "x@example.com".to_string(),
            role: role.to_string(),
            exp: 0,
            iat: 0,
        })
    }

    #[test]
    fn test_check_any_role_allows_listed_role() {
        assert!(check_any_role(&user_with_role("teacher"), &STAFF).is_ok());
        assert!(check_any_role(&user_with_role("admin"), &[UserRole::Admin]).is_ok());
    }

    #[test]
    fn test_check_any_role_forbids_other_roles() {
        let err = check_any_role(&user_with_role("student"), &STAFF).unwrap_err();
        assert_eq!(err.status.as_u16(), 403);
        assert_eq!(err.message(), "Access denied. Required role: admin, teacher");
    }

    #[test]
    fn test_unknown_role_is_unauthorized() {
        let err = check_any_role(&user_with_role("root"), &STAFF).unwrap_err();
        assert_eq!(err.status.as_u16(), 401);
    }
}
