use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use campusly_core::{AppError, Paginated};
use campusly_models::users::UserRole;
use tracing::instrument;
use uuid::Uuid;

use crate::middleware::auth::AuthUser;
use crate::middleware::role::{RequireStaff, check_any_role};
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::model::{
    CreateHomeworkDto, GradeSubmissionDto, Homework, HomeworkFilterParams, Submission,
    SubmitHomeworkDto, UpdateHomeworkDto,
};
use super::service::HomeworkService;

#[utoipa::path(
    post,
    path = "/api/homework",
    request_body = CreateHomeworkDto,
    responses(
        (status = 201, description = "Homework assigned", body = Homework),
        (status = 400, description = "Subject does not belong to the class", body = ErrorResponse),
        (status = 403, description = "Forbidden - staff only", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Homework"
)]
#[instrument(skip(state, staff, dto))]
pub async fn create_homework(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    ValidatedJson(dto): ValidatedJson<CreateHomeworkDto>,
) -> Result<(StatusCode, Json<Homework>), AppError> {
    let homework = HomeworkService::create_homework(&state.db, staff.user_id()?, dto).await?;
    Ok((StatusCode::CREATED, Json(homework)))
}

#[utoipa::path(
    get,
    path = "/api/homework",
    params(
        ("class_id" = Option<Uuid>, Query, description = "Filter by class (ignored for students)"),
        ("subject_id" = Option<Uuid>, Query, description = "Filter by subject"),
        ("limit" = Option<i64>, Query, description = "Page size (1-100)"),
        ("page" = Option<i64>, Query, description = "Page number, 1-indexed"),
        ("offset" = Option<i64>, Query, description = "Rows to skip when page is absent")
    ),
    responses(
        (status = 200, description = "Page of homework", body = Paginated<Homework>)
    ),
    security(("bearer_auth" = [])),
    tag = "Homework"
)]
#[instrument(skip(state, auth_user))]
pub async fn get_homework_list(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(filters): Query<HomeworkFilterParams>,
) -> Result<Json<Paginated<Homework>>, AppError> {
    Ok(Json(
        HomeworkService::list_homework(&state.db, &auth_user, filters).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/homework/{id}",
    params(("id" = Uuid, Path, description = "Homework ID")),
    responses(
        (status = 200, description = "Homework", body = Homework),
        (status = 404, description = "Homework not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Homework"
)]
#[instrument(skip(state, auth_user))]
pub async fn get_homework(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Homework>, AppError> {
    Ok(Json(
        HomeworkService::get_homework(&state.db, &auth_user, id).await?,
    ))
}

#[utoipa::path(
    put,
    path = "/api/homework/{id}",
    params(("id" = Uuid, Path, description = "Homework ID")),
    request_body = UpdateHomeworkDto,
    responses(
        (status = 200, description = "Homework updated", body = Homework),
        (status = 403, description = "Not the author", body = ErrorResponse),
        (status = 404, description = "Homework not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Homework"
)]
#[instrument(skip(state, staff, dto))]
pub async fn update_homework(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateHomeworkDto>,
) -> Result<Json<Homework>, AppError> {
    Ok(Json(
        HomeworkService::update_homework(&state.db, &staff, id, dto).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/homework/{id}",
    params(("id" = Uuid, Path, description = "Homework ID")),
    responses(
        (status = 204, description = "Homework deleted"),
        (status = 403, description = "Not the author", body = ErrorResponse),
        (status = 404, description = "Homework not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Homework"
)]
#[instrument(skip(state, staff))]
pub async fn delete_homework(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    HomeworkService::delete_homework(&state.db, &staff, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/homework/{id}/submissions",
    params(("id" = Uuid, Path, description = "Homework ID")),
    request_body = SubmitHomeworkDto,
    responses(
        (status = 201, description = "Submission saved", body = Submission),
        (status = 400, description = "Already graded", body = ErrorResponse),
        (status = 403, description = "Not a student of the class", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Homework"
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn submit_homework(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<SubmitHomeworkDto>,
) -> Result<(StatusCode, Json<Submission>), AppError> {
    check_any_role(&auth_user, &[UserRole::Student])?;
    let submission = HomeworkService::submit(&state.db, auth_user.user_id()?, id, dto).await?;
    Ok((StatusCode::CREATED, Json(submission)))
}

#[utoipa::path(
    get,
    path = "/api/homework/{id}/submissions",
    params(("id" = Uuid, Path, description = "Homework ID")),
    responses(
        (status = 200, description = "Submissions", body = Vec<Submission>),
        (status = 404, description = "Homework not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Homework"
)]
#[instrument(skip(state))]
pub async fn get_submissions(
    State(state): State<AppState>,
    RequireStaff(_staff): RequireStaff,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Submission>>, AppError> {
    Ok(Json(HomeworkService::list_submissions(&state.db, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/homework/submissions/{id}/grade",
    params(("id" = Uuid, Path, description = "Submission ID")),
    request_body = GradeSubmissionDto,
    responses(
        (status = 200, description = "Submission graded", body = Submission),
        (status = 404, description = "Submission not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Homework"
)]
#[instrument(skip(state, staff, dto))]
pub async fn grade_submission(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<GradeSubmissionDto>,
) -> Result<Json<Submission>, AppError> {
    Ok(Json(
        HomeworkService::grade(&state.db, staff.user_id()?, id, dto).await?,
    ))
}
