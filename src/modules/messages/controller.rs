use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use campusly_core::{AppError, Paginated, PaginationParams};
use tracing::instrument;
use uuid::Uuid;

use crate::middleware::auth::AuthUser;
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::model::{InboxFilterParams, Message, SendMessageDto, UnreadCount};
use super::service::MessageService;

#[utoipa::path(
    post,
    path = "/api/messages",
    request_body = SendMessageDto,
    responses(
        (status = 201, description = "Message sent", body = Message),
        (status = 400, description = "Recipient is the sender or deactivated", body = ErrorResponse),
        (status = 404, description = "Recipient not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Messages"
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn send_message(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<SendMessageDto>,
) -> Result<(StatusCode, Json<Message>), AppError> {
    let message = MessageService::send(&state.db, auth_user.user_id()?, dto).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

#[utoipa::path(
    get,
    path = "/api/messages/inbox",
    params(
        ("unread" = Option<bool>, Query, description = "Only unread (true) or read (false)"),
        ("limit" = Option<i64>, Query, description = "Page size (1-100)"),
        ("page" = Option<i64>, Query, description = "Page number, 1-indexed"),
        ("offset" = Option<i64>, Query, description = "Rows to skip when page is absent")
    ),
    responses(
        (status = 200, description = "Received messages, newest first", body = Paginated<Message>)
    ),
    security(("bearer_auth" = [])),
    tag = "Messages"
)]
#[instrument(skip(state, auth_user))]
pub async fn get_inbox(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(filters): Query<InboxFilterParams>,
) -> Result<Json<Paginated<Message>>, AppError> {
    Ok(Json(
        MessageService::inbox(&state.db, auth_user.user_id()?, filters).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/messages/sent",
    params(
        ("limit" = Option<i64>, Query, description = "Page size (1-100)"),
        ("page" = Option<i64>, Query, description = "Page number, 1-indexed"),
        ("offset" = Option<i64>, Query, description = "Rows to skip when page is absent")
    ),
    responses(
        (status = 200, description = "Sent messages, newest first", body = Paginated<Message>)
    ),
    security(("bearer_auth" = [])),
    tag = "Messages"
)]
#[instrument(skip(state, auth_user))]
pub async fn get_sent(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<Paginated<Message>>, AppError> {
    Ok(Json(
        MessageService::sent(&state.db, auth_user.user_id()?, pagination).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/messages/unread-count",
    responses(
        (status = 200, description = "Unread message count", body = UnreadCount)
    ),
    security(("bearer_auth" = [])),
    tag = "Messages"
)]
#[instrument(skip(state, auth_user))]
pub async fn get_unread_count(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<UnreadCount>, AppError> {
    Ok(Json(
        MessageService::unread_count(&state.db, auth_user.user_id()?).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/messages/{id}",
    params(("id" = Uuid, Path, description = "Message ID")),
    responses(
        (status = 200, description = "Message", body = Message),
        (status = 404, description = "Message not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Messages"
)]
#[instrument(skip(state, auth_user))]
pub async fn get_message(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Message>, AppError> {
    Ok(Json(
        MessageService::get_message(&state.db, auth_user.user_id()?, id).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/messages/{id}/read",
    params(("id" = Uuid, Path, description = "Message ID")),
    responses(
        (status = 200, description = "Message marked read", body = Message),
        (status = 404, description = "Message not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Messages"
)]
#[instrument(skip(state, auth_user))]
pub async fn mark_read(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Message>, AppError> {
    Ok(Json(
        MessageService::mark_read(&state.db, auth_user.user_id()?, id).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/messages/{id}",
    params(("id" = Uuid, Path, description = "Message ID")),
    responses(
        (status = 204, description = "Message removed from the caller's mailbox"),
        (status = 404, description = "Message not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Messages"
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_message(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    MessageService::delete_message(&state.db, auth_user.user_id()?, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
