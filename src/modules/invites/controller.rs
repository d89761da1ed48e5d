use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use campusly_core::{AppError, Paginated};
use tracing::instrument;
use uuid::Uuid;

use crate::middleware::auth::AuthUser;
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::utils::email::EmailService;
use crate::validator::ValidatedJson;

use super::model::{
    CreateInviteDto, CreatedInvite, Invite, InviteFilterParams, InvitePreview, ValidateInviteQuery,
};
use super::service::InviteService;

/// Issue an invite for a staff role (admin only)
///
/// The plaintext token is returned once in this response.
#[utoipa::path(
    post,
    path = "/api/invites",
    request_body = CreateInviteDto,
    responses(
        (status = 201, description = "Invite created", body = CreatedInvite),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - admin only", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Invites"
)]
#[instrument(skip(state, dto))]
pub async fn create_invite(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    ValidatedJson(dto): ValidatedJson<CreateInviteDto>,
) -> Result<(StatusCode, Json<CreatedInvite>), AppError> {
    let (invite, token) = InviteService::create_invite(
        &state.db,
        &state.invite_config,
        auth_user.user_id()?,
        dto,
    )
    .await?;

    let email = EmailService::new(state.email_config.clone());
    email.send_invite(&invite.email, &invite.role, &token, invite.expires_at);

    Ok((
        StatusCode::CREATED,
        Json(CreatedInvite {
            registration_url: email.registration_url(&token),
            invite,
            token,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/invites",
    params(
        ("status" = Option<String>, Query, description = "pending, active, used, expired or revoked"),
        ("limit" = Option<i64>, Query, description = "Page size (1-100)"),
        ("page" = Option<i64>, Query, description = "Page number, 1-indexed"),
        ("offset" = Option<i64>, Query, description = "Rows to skip when page is absent")
    ),
    responses(
        (status = 200, description = "Page of invites", body = Paginated<Invite>),
        (status = 403, description = "Forbidden - admin only", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Invites"
)]
#[instrument(skip(state))]
pub async fn get_invites(
    State(state): State<AppState>,
    Query(filters): Query<InviteFilterParams>,
) -> Result<Json<Paginated<Invite>>, AppError> {
    Ok(Json(InviteService::list_invites(&state.db, filters).await?))
}

#[utoipa::path(
    get,
    path = "/api/invites/{id}",
    params(("id" = Uuid, Path, description = "Invite ID")),
    responses(
        (status = 200, description = "Invite", body = Invite),
        (status = 404, description = "Invite not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Invites"
)]
#[instrument(skip(state))]
pub async fn get_invite(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Invite>, AppError> {
    Ok(Json(InviteService::get_invite(&state.db, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/invites/{id}/revoke",
    params(("id" = Uuid, Path, description = "Invite ID")),
    responses(
        (status = 200, description = "Invite revoked", body = Invite),
        (status = 400, description = "Invite already closed", body = ErrorResponse),
        (status = 404, description = "Invite not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Invites"
)]
#[instrument(skip(state))]
pub async fn revoke_invite(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Invite>, AppError> {
    Ok(Json(InviteService::revoke_invite(&state.db, id).await?))
}

/// Look up an invite by token (public)
#[utoipa::path(
    get,
    path = "/api/invites/validate",
    params(("token" = String, Query, description = "Invite token from the registration link")),
    responses(
        (status = 200, description = "Invite details", body = InvitePreview),
        (status = 404, description = "Invite not found", body = ErrorResponse)
    ),
    tag = "Invites"
)]
#[instrument(skip(state, query))]
pub async fn validate_invite(
    State(state): State<AppState>,
    Query(query): Query<ValidateInviteQuery>,
) -> Result<Json<InvitePreview>, AppError> {
    Ok(Json(
        InviteService::validate_token(&state.db, &query.token).await?,
    ))
}
