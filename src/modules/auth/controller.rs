use axum::{Json, extract::State, http::StatusCode};
use campusly_core::AppError;
use tracing::instrument;
use utoipa::ToSchema;

use crate::middleware::auth::AuthUser;
use crate::modules::users::model::User;
use crate::modules::users::service::UserService;
use crate::state::AppState;
use crate::utils::email::EmailService;
use crate::validator::ValidatedJson;

use super::model::{
    ForgotPasswordRequest, InviteRegisterRequest, LoginRequest, LoginResponse, MessageResponse,
    RefreshTokenRequest, RegisterRequest, RegisterResponse, ResendOtpRequest,
    ResetPasswordRequest, TokenResponse, VerifyOtpRequest,
};
use super::service::AuthService;

#[derive(ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Register as a student or parent
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered, verification code sent", body = RegisterResponse),
        (status = 403, description = "Staff roles require an invite", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let email = EmailService::new(state.email_config.clone());
    let response = AuthService::register(&state.db, &state.otp_config, &email, dto).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Register with an invite token
#[utoipa::path(
    post,
    path = "/api/auth/register/invite",
    request_body = InviteRegisterRequest,
    responses(
        (status = 201, description = "User registered", body = RegisterResponse),
        (status = 400, description = "Invite is used, expired or revoked", body = ErrorResponse),
        (status = 404, description = "Invite not found", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn register_with_invite(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<InviteRegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let response = AuthService::register_with_invite(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Login and receive an access and refresh token
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 403, description = "Account unverified or deactivated", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    Ok(Json(
        AuthService::login(&state.db, &state.jwt_config, dto).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "New token pair", body = TokenResponse),
        (status = 401, description = "Invalid or expired refresh token", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn refresh_token(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<RefreshTokenRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    Ok(Json(
        AuthService::refresh(&state.db, &state.jwt_config, dto).await?,
    ))
}

/// Verify an email with the emailed one-time code
#[utoipa::path(
    post,
    path = "/api/auth/otp/verify",
    request_body = VerifyOtpRequest,
    responses(
        (status = 200, description = "Email verified", body = User),
        (status = 400, description = "Invalid, expired or used code", body = ErrorResponse),
        (status = 429, description = "Too many wrong attempts", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn verify_otp(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<VerifyOtpRequest>,
) -> Result<Json<User>, AppError> {
    Ok(Json(AuthService::verify_otp(&state.db, dto).await?))
}

#[utoipa::path(
    post,
    path = "/api/auth/otp/resend",
    request_body = ResendOtpRequest,
    responses(
        (status = 200, description = "A new code was sent if the account exists", body = MessageResponse),
        (status = 429, description = "Resend cooldown has not elapsed", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn resend_otp(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<ResendOtpRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let email = EmailService::new(state.email_config.clone());
    AuthService::resend_otp(&state.db, &state.otp_config, &email, dto).await?;
    Ok(Json(MessageResponse::new(
        "If the account exists, a new code has been sent",
    )))
}

/// Request a password reset code
#[utoipa::path(
    post,
    path = "/api/auth/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "A reset code was sent if the account exists", body = MessageResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn forgot_password(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let email = EmailService::new(state.email_config.clone());
    AuthService::forgot_password(&state.db, &state.otp_config, &email, dto).await?;
    Ok(Json(MessageResponse::new(
        "If the account exists, a password reset code has been sent",
    )))
}

#[utoipa::path(
    post,
    path = "/api/auth/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset", body = MessageResponse),
        (status = 400, description = "Invalid or expired code", body = ErrorResponse),
        (status = 429, description = "Too many wrong attempts", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn reset_password(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let email = EmailService::new(state.email_config.clone());
    AuthService::reset_password(&state.db, &email, dto).await?;
    Ok(Json(MessageResponse::new("Password has been reset")))
}

/// The authenticated user
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Authentication"
)]
#[instrument(skip(state))]
pub async fn me(State(state): State<AppState>, auth_user: AuthUser) -> Result<Json<User>, AppError> {
    Ok(Json(UserService::get_user(&state.db, auth_user.user_id()?).await?))
}
