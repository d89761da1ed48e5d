use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    forgot_password, login, me, refresh_token, register, register_with_invite, reset_password,
    resend_otp, verify_otp,
};

/// Public credential endpoints. The router applies the strict auth limiter
/// to everything here except `/me`.
pub fn init_auth_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/register/invite", post(register_with_invite))
        .route("/login", post(login))
        .route("/refresh", post(refresh_token))
        .route("/otp/verify", post(verify_otp))
        .route("/otp/resend", post(resend_otp))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
}

pub fn init_session_router() -> Router<AppState> {
    Router::new().route("/me", get(me))
}
