use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use campusly_core::{AppError, Paginated};
use tracing::instrument;
use uuid::Uuid;

use crate::middleware::auth::AuthUser;
use crate::middleware::role::{RequireAdmin, RequireStaff};
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::utils::access::ensure_student_access;
use crate::validator::ValidatedJson;

use super::model::{
    AttendanceSession, AttendanceSummary, CreateSessionDto, RecordAttendanceDto,
    SessionFilterParams, SessionWithRecords, SummaryQuery,
};
use super::service::AttendanceService;

#[utoipa::path(
    post,
    path = "/api/attendance/sessions",
    request_body = CreateSessionDto,
    responses(
        (status = 201, description = "Session opened", body = AttendanceSession),
        (status = 400, description = "Section or subject outside the class", body = ErrorResponse),
        (status = 409, description = "Session already exists", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
#[instrument(skip(state, staff, dto))]
pub async fn create_session(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    ValidatedJson(dto): ValidatedJson<CreateSessionDto>,
) -> Result<(StatusCode, Json<AttendanceSession>), AppError> {
    let session = AttendanceService::create_session(&state.db, staff.user_id()?, dto).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

#[utoipa::path(
    get,
    path = "/api/attendance/sessions",
    params(
        ("class_id" = Option<Uuid>, Query, description = "Filter by class"),
        ("session_date" = Option<String>, Query, description = "Filter by date (YYYY-MM-DD)"),
        ("status" = Option<String>, Query, description = "open or closed"),
        ("limit" = Option<i64>, Query, description = "Page size (1-100)"),
        ("page" = Option<i64>, Query, description = "Page number, 1-indexed"),
        ("offset" = Option<i64>, Query, description = "Rows to skip when page is absent")
    ),
    responses(
        (status = 200, description = "Page of sessions", body = Paginated<AttendanceSession>)
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
#[instrument(skip(state))]
pub async fn get_sessions(
    State(state): State<AppState>,
    RequireStaff(_staff): RequireStaff,
    Query(filters): Query<SessionFilterParams>,
) -> Result<Json<Paginated<AttendanceSession>>, AppError> {
    Ok(Json(AttendanceService::list_sessions(&state.db, filters).await?))
}

#[utoipa::path(
    get,
    path = "/api/attendance/sessions/{id}",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Session with records", body = SessionWithRecords),
        (status = 404, description = "Session not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
#[instrument(skip(state))]
pub async fn get_session(
    State(state): State<AppState>,
    RequireStaff(_staff): RequireStaff,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionWithRecords>, AppError> {
    Ok(Json(
        AttendanceService::get_session_with_records(&state.db, id).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/attendance/sessions/{id}/records",
    params(("id" = Uuid, Path, description = "Session ID")),
    request_body = RecordAttendanceDto,
    responses(
        (status = 200, description = "Records saved", body = SessionWithRecords),
        (status = 400, description = "Session closed or student outside the class", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
#[instrument(skip(state, staff, dto))]
pub async fn record_attendance(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<RecordAttendanceDto>,
) -> Result<Json<SessionWithRecords>, AppError> {
    Ok(Json(
        AttendanceService::record_attendance(&state.db, staff.user_id()?, id, dto).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/attendance/sessions/{id}/close",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Session closed", body = AttendanceSession),
        (status = 400, description = "Session already closed", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
#[instrument(skip(state))]
pub async fn close_session(
    State(state): State<AppState>,
    RequireStaff(_staff): RequireStaff,
    Path(id): Path<Uuid>,
) -> Result<Json<AttendanceSession>, AppError> {
    Ok(Json(AttendanceService::close_session(&state.db, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/attendance/sessions/{id}/reopen",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Session reopened", body = AttendanceSession),
        (status = 400, description = "Session already open", body = ErrorResponse),
        (status = 403, description = "Forbidden - admin only", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
#[instrument(skip(state))]
pub async fn reopen_session(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<Json<AttendanceSession>, AppError> {
    Ok(Json(AttendanceService::reopen_session(&state.db, id).await?))
}

#[utoipa::path(
    get,
    path = "/api/attendance/students/{student_id}/summary",
    params(
        ("student_id" = Uuid, Path, description = "Student ID"),
        ("from" = Option<String>, Query, description = "Inclusive start date"),
        ("to" = Option<String>, Query, description = "Inclusive end date")
    ),
    responses(
        (status = 200, description = "Counts and attendance rate", body = AttendanceSummary),
        (status = 403, description = "No access to this student", body = ErrorResponse),
        (status = 404, description = "Student not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
#[instrument(skip(state, auth_user))]
pub async fn get_student_summary(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(student_id): Path<Uuid>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<AttendanceSummary>, AppError> {
    ensure_student_access(&state.db, &auth_user, student_id).await?;
    Ok(Json(
        AttendanceService::student_summary(&state.db, student_id, query).await?,
    ))
}
