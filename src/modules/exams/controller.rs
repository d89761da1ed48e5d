use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use campusly_core::{AppError, Paginated};
use tracing::instrument;
use uuid::Uuid;

use crate::middleware::auth::AuthUser;
use crate::middleware::role::RequireStaff;
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::utils::access::ensure_student_access;
use crate::validator::ValidatedJson;

use super::model::{
    CreateExamDto, EnterMarksDto, Exam, ExamFilterParams, ExamMark, StudentResult, UpdateExamDto,
};
use super::service::ExamService;

#[utoipa::path(
    post,
    path = "/api/exams",
    request_body = CreateExamDto,
    responses(
        (status = 201, description = "Draft exam created", body = Exam),
        (status = 400, description = "Subject does not belong to the class", body = ErrorResponse),
        (status = 403, description = "Forbidden - staff only", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Exams"
)]
#[instrument(skip(state, staff, dto))]
pub async fn create_exam(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    ValidatedJson(dto): ValidatedJson<CreateExamDto>,
) -> Result<(StatusCode, Json<Exam>), AppError> {
    let exam = ExamService::create_exam(&state.db, staff.user_id()?, dto).await?;
    Ok((StatusCode::CREATED, Json(exam)))
}

#[utoipa::path(
    get,
    path = "/api/exams",
    params(
        ("class_id" = Option<Uuid>, Query, description = "Filter by class"),
        ("subject_id" = Option<Uuid>, Query, description = "Filter by subject"),
        ("status" = Option<String>, Query, description = "draft or published"),
        ("limit" = Option<i64>, Query, description = "Page size (1-100)"),
        ("page" = Option<i64>, Query, description = "Page number, 1-indexed"),
        ("offset" = Option<i64>, Query, description = "Rows to skip when page is absent")
    ),
    responses(
        (status = 200, description = "Page of exams", body = Paginated<Exam>)
    ),
    security(("bearer_auth" = [])),
    tag = "Exams"
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_exams(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(filters): Query<ExamFilterParams>,
) -> Result<Json<Paginated<Exam>>, AppError> {
    Ok(Json(ExamService::list_exams(&state.db, filters).await?))
}

#[utoipa::path(
    get,
    path = "/api/exams/{id}",
    params(("id" = Uuid, Path, description = "Exam ID")),
    responses(
        (status = 200, description = "Exam", body = Exam),
        (status = 404, description = "Exam not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Exams"
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_exam(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Exam>, AppError> {
    Ok(Json(ExamService::get_exam(&state.db, id).await?))
}

#[utoipa::path(
    put,
    path = "/api/exams/{id}",
    params(("id" = Uuid, Path, description = "Exam ID")),
    request_body = UpdateExamDto,
    responses(
        (status = 200, description = "Exam updated", body = Exam),
        (status = 400, description = "Exam already published or max_marks below an entered mark", body = ErrorResponse),
        (status = 404, description = "Exam not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Exams"
)]
#[instrument(skip(state, dto))]
pub async fn update_exam(
    State(state): State<AppState>,
    RequireStaff(_staff): RequireStaff,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateExamDto>,
) -> Result<Json<Exam>, AppError> {
    Ok(Json(ExamService::update_exam(&state.db, id, dto).await?))
}

#[utoipa::path(
    delete,
    path = "/api/exams/{id}",
    params(("id" = Uuid, Path, description = "Exam ID")),
    responses(
        (status = 204, description = "Exam deleted"),
        (status = 400, description = "Exam already published", body = ErrorResponse),
        (status = 404, description = "Exam not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Exams"
)]
#[instrument(skip(state))]
pub async fn delete_exam(
    State(state): State<AppState>,
    RequireStaff(_staff): RequireStaff,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    ExamService::delete_exam(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Enter or overwrite marks for a draft exam
#[utoipa::path(
    post,
    path = "/api/exams/{id}/marks",
    params(("id" = Uuid, Path, description = "Exam ID")),
    request_body = EnterMarksDto,
    responses(
        (status = 200, description = "All marks for the exam", body = Vec<ExamMark>),
        (status = 400, description = "Out of range, not enrolled, or exam published", body = ErrorResponse),
        (status = 403, description = "Not the subject teacher", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Exams"
)]
#[instrument(skip(state, staff, dto))]
pub async fn enter_marks(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<EnterMarksDto>,
) -> Result<Json<Vec<ExamMark>>, AppError> {
    Ok(Json(
        ExamService::enter_marks(&state.db, &staff, id, dto).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/exams/{id}/marks",
    params(("id" = Uuid, Path, description = "Exam ID")),
    responses(
        (status = 200, description = "Marks for the exam", body = Vec<ExamMark>),
        (status = 404, description = "Exam not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Exams"
)]
#[instrument(skip(state))]
pub async fn get_marks(
    State(state): State<AppState>,
    RequireStaff(_staff): RequireStaff,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ExamMark>>, AppError> {
    ExamService::get_exam(&state.db, id).await?;
    Ok(Json(ExamService::list_marks(&state.db, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/exams/{id}/publish",
    params(("id" = Uuid, Path, description = "Exam ID")),
    responses(
        (status = 200, description = "Exam published", body = Exam),
        (status = 400, description = "Exam already published", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Exams"
)]
#[instrument(skip(state))]
pub async fn publish_exam(
    State(state): State<AppState>,
    RequireStaff(_staff): RequireStaff,
    Path(id): Path<Uuid>,
) -> Result<Json<Exam>, AppError> {
    Ok(Json(ExamService::publish_exam(&state.db, id).await?))
}

#[utoipa::path(
    get,
    path = "/api/exams/results/students/{student_id}",
    params(("student_id" = Uuid, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Published results with grades", body = Vec<StudentResult>),
        (status = 403, description = "No access to this student", body = ErrorResponse),
        (status = 404, description = "Student not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Exams"
)]
#[instrument(skip(state, auth_user))]
pub async fn get_student_results(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(student_id): Path<Uuid>,
) -> Result<Json<Vec<StudentResult>>, AppError> {
    ensure_student_access(&state.db, &auth_user, student_id).await?;
    Ok(Json(
        ExamService::student_results(&state.db, student_id).await?,
    ))
}
