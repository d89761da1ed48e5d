use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use campusly_core::{AppError, Paginated};
use tracing::instrument;
use uuid::Uuid;

use crate::middleware::role::RequireAdmin;
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::utils::email::EmailService;
use crate::validator::ValidatedJson;

use super::model::{
    AcceptAdmissionDto, AcceptedAdmission, Admission, AdmissionFilterParams, CreateAdmissionDto,
    RecordAssessmentDto, RejectAdmissionDto, ScheduleAssessmentDto,
};
use super::service::AdmissionService;

#[utoipa::path(
    post,
    path = "/api/admissions",
    request_body = CreateAdmissionDto,
    responses(
        (status = 201, description = "Application submitted", body = Admission),
        (status = 400, description = "Invalid date of birth or unknown class", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Admissions"
)]
#[instrument(skip(state, dto))]
pub async fn create_application(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<CreateAdmissionDto>,
) -> Result<(StatusCode, Json<Admission>), AppError> {
    let admission = AdmissionService::create_application(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(admission)))
}

#[utoipa::path(
    get,
    path = "/api/admissions",
    params(
        ("status" = Option<String>, Query, description = "submitted, assessment_scheduled, assessed, accepted or rejected"),
        ("limit" = Option<i64>, Query, description = "Page size (1-100)"),
        ("page" = Option<i64>, Query, description = "Page number, 1-indexed"),
        ("offset" = Option<i64>, Query, description = "Rows to skip when page is absent")
    ),
    responses(
        (status = 200, description = "Page of applications", body = Paginated<Admission>),
        (status = 403, description = "Forbidden - admin only", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admissions"
)]
#[instrument(skip(state))]
pub async fn get_applications(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(filters): Query<AdmissionFilterParams>,
) -> Result<Json<Paginated<Admission>>, AppError> {
    Ok(Json(
        AdmissionService::list_applications(&state.db, filters).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/admissions/{id}",
    params(("id" = Uuid, Path, description = "Application ID")),
    responses(
        (status = 200, description = "Application", body = Admission),
        (status = 404, description = "Application not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admissions"
)]
#[instrument(skip(state))]
pub async fn get_application(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<Json<Admission>, AppError> {
    Ok(Json(AdmissionService::get_application(&state.db, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/admissions/{id}/schedule-assessment",
    params(("id" = Uuid, Path, description = "Application ID")),
    request_body = ScheduleAssessmentDto,
    responses(
        (status = 200, description = "Assessment scheduled", body = Admission),
        (status = 400, description = "Invalid transition or past date", body = ErrorResponse),
        (status = 404, description = "Application not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admissions"
)]
#[instrument(skip(state, dto))]
pub async fn schedule_assessment(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<ScheduleAssessmentDto>,
) -> Result<Json<Admission>, AppError> {
    let email = EmailService::new(state.email_config.clone());
    Ok(Json(
        AdmissionService::schedule_assessment(&state.db, &email, id, dto).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/admissions/{id}/assessment",
    params(("id" = Uuid, Path, description = "Application ID")),
    request_body = RecordAssessmentDto,
    responses(
        (status = 200, description = "Assessment recorded", body = Admission),
        (status = 400, description = "Invalid transition", body = ErrorResponse),
        (status = 422, description = "Score out of range", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admissions"
)]
#[instrument(skip(state, dto))]
pub async fn record_assessment(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<RecordAssessmentDto>,
) -> Result<Json<Admission>, AppError> {
    Ok(Json(
        AdmissionService::record_assessment(&state.db, id, dto).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/admissions/{id}/accept",
    params(("id" = Uuid, Path, description = "Application ID")),
    request_body = AcceptAdmissionDto,
    responses(
        (status = 200, description = "Application accepted and student enrolled", body = AcceptedAdmission),
        (status = 400, description = "Invalid transition or enrollment", body = ErrorResponse),
        (status = 409, description = "Email or admission number already in use", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admissions"
)]
#[instrument(skip(state, dto))]
pub async fn accept_application(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<AcceptAdmissionDto>,
) -> Result<Json<AcceptedAdmission>, AppError> {
    let email = EmailService::new(state.email_config.clone());
    Ok(Json(
        AdmissionService::accept(&state.db, &email, id, dto).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/admissions/{id}/reject",
    params(("id" = Uuid, Path, description = "Application ID")),
    request_body = RejectAdmissionDto,
    responses(
        (status = 200, description = "Application rejected", body = Admission),
        (status = 400, description = "Application already decided", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admissions"
)]
#[instrument(skip(state, dto))]
pub async fn reject_application(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<RejectAdmissionDto>,
) -> Result<Json<Admission>, AppError> {
    let email = EmailService::new(state.email_config.clone());
    Ok(Json(
        AdmissionService::reject(&state.db, &email, id, dto).await?,
    ))
}
