use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use campusly_core::{AppError, Paginated};
use tracing::instrument;
use uuid::Uuid;

use crate::middleware::auth::AuthUser;
use crate::middleware::role::RequireAdmin;
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::utils::access::ensure_student_access;
use crate::validator::ValidatedJson;

use super::model::{
    CreateInvoiceDto, InvoiceFilterParams, InvoiceView, Payment, PaymentReceipt, RecordPaymentDto,
};
use super::service::FeeService;

#[utoipa::path(
    post,
    path = "/api/fees/invoices",
    request_body = CreateInvoiceDto,
    responses(
        (status = 201, description = "Invoice issued", body = InvoiceView),
        (status = 403, description = "Forbidden - admin only", body = ErrorResponse),
        (status = 404, description = "Student not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Fees"
)]
#[instrument(skip(state, admin, dto))]
pub async fn create_invoice(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ValidatedJson(dto): ValidatedJson<CreateInvoiceDto>,
) -> Result<(StatusCode, Json<InvoiceView>), AppError> {
    let invoice = FeeService::create_invoice(&state.db, admin.user_id()?, dto).await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

#[utoipa::path(
    get,
    path = "/api/fees/invoices",
    params(
        ("student_id" = Option<Uuid>, Query, description = "Filter by student"),
        ("status" = Option<String>, Query, description = "unpaid, partially_paid, paid or cancelled"),
        ("limit" = Option<i64>, Query, description = "Page size (1-100)"),
        ("page" = Option<i64>, Query, description = "Page number, 1-indexed"),
        ("offset" = Option<i64>, Query, description = "Rows to skip when page is absent")
    ),
    responses(
        (status = 200, description = "Page of invoices", body = Paginated<InvoiceView>),
        (status = 403, description = "Forbidden - admin only", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Fees"
)]
#[instrument(skip(state))]
pub async fn get_invoices(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(filters): Query<InvoiceFilterParams>,
) -> Result<Json<Paginated<InvoiceView>>, AppError> {
    Ok(Json(FeeService::list_invoices(&state.db, filters).await?))
}

#[utoipa::path(
    get,
    path = "/api/fees/invoices/{id}",
    params(("id" = Uuid, Path, description = "Invoice ID")),
    responses(
        (status = 200, description = "Invoice", body = InvoiceView),
        (status = 404, description = "Invoice not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Fees"
)]
#[instrument(skip(state))]
pub async fn get_invoice(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<Json<InvoiceView>, AppError> {
    Ok(Json(FeeService::get_invoice(&state.db, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/fees/invoices/{id}/payments",
    params(("id" = Uuid, Path, description = "Invoice ID")),
    request_body = RecordPaymentDto,
    responses(
        (status = 201, description = "Payment recorded", body = PaymentReceipt),
        (status = 400, description = "Invoice closed or overpayment", body = ErrorResponse),
        (status = 404, description = "Invoice not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Fees"
)]
#[instrument(skip(state, admin, dto))]
pub async fn record_payment(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<RecordPaymentDto>,
) -> Result<(StatusCode, Json<PaymentReceipt>), AppError> {
    let receipt = FeeService::record_payment(&state.db, admin.user_id()?, id, dto).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

#[utoipa::path(
    get,
    path = "/api/fees/invoices/{id}/payments",
    params(("id" = Uuid, Path, description = "Invoice ID")),
    responses(
        (status = 200, description = "Payments in order received", body = Vec<Payment>),
        (status = 404, description = "Invoice not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Fees"
)]
#[instrument(skip(state))]
pub async fn get_payments(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Payment>>, AppError> {
    Ok(Json(FeeService::list_payments(&state.db, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/fees/invoices/{id}/cancel",
    params(("id" = Uuid, Path, description = "Invoice ID")),
    responses(
        (status = 200, description = "Invoice cancelled", body = InvoiceView),
        (status = 400, description = "Invoice has payments or is already cancelled", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Fees"
)]
#[instrument(skip(state))]
pub async fn cancel_invoice(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<Json<InvoiceView>, AppError> {
    Ok(Json(FeeService::cancel_invoice(&state.db, id).await?))
}

#[utoipa::path(
    get,
    path = "/api/fees/students/{student_id}/invoices",
    params(("student_id" = Uuid, Path, description = "Student ID")),
    responses(
        (status = 200, description = "The student's invoices", body = Vec<InvoiceView>),
        (status = 403, description = "No access to this student", body = ErrorResponse),
        (status = 404, description = "Student not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Fees"
)]
#[instrument(skip(state, auth_user))]
pub async fn get_student_invoices(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(student_id): Path<Uuid>,
) -> Result<Json<Vec<InvoiceView>>, AppError> {
    ensure_student_access(&state.db, &auth_user, student_id).await?;
    Ok(Json(FeeService::student_invoices(&state.db, student_id).await?))
}
