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
use crate::validator::ValidatedJson;

use super::model::{
    Book, BookFilterParams, CreateBookDto, CreateLoanDto, Loan, LoanFilterParams, UpdateBookDto,
};
use super::service::LibraryService;

#[utoipa::path(
    post,
    path = "/api/library/books",
    request_body = CreateBookDto,
    responses(
        (status = 201, description = "Book added", body = Book),
        (status = 409, description = "Duplicate ISBN", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Library"
)]
#[instrument(skip(state, dto))]
pub async fn create_book(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ValidatedJson(dto): ValidatedJson<CreateBookDto>,
) -> Result<(StatusCode, Json<Book>), AppError> {
    let book = LibraryService::create_book(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

#[utoipa::path(
    get,
    path = "/api/library/books",
    params(
        ("search" = Option<String>, Query, description = "Matches title, author or ISBN"),
        ("limit" = Option<i64>, Query, description = "Page size (1-100)"),
        ("page" = Option<i64>, Query, description = "Page number, 1-indexed"),
        ("offset" = Option<i64>, Query, description = "Rows to skip when page is absent")
    ),
    responses(
        (status = 200, description = "Page of books", body = Paginated<Book>)
    ),
    security(("bearer_auth" = [])),
    tag = "Library"
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_books(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(filters): Query<BookFilterParams>,
) -> Result<Json<Paginated<Book>>, AppError> {
    Ok(Json(LibraryService::list_books(&state.db, filters).await?))
}

#[utoipa::path(
    get,
    path = "/api/library/books/{id}",
    params(("id" = Uuid, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book", body = Book),
        (status = 404, description = "Book not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Library"
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_book(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Book>, AppError> {
    Ok(Json(LibraryService::get_book(&state.db, id).await?))
}

#[utoipa::path(
    put,
    path = "/api/library/books/{id}",
    params(("id" = Uuid, Path, description = "Book ID")),
    request_body = UpdateBookDto,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 400, description = "Total below copies on loan", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Library"
)]
#[instrument(skip(state, dto))]
pub async fn update_book(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateBookDto>,
) -> Result<Json<Book>, AppError> {
    Ok(Json(LibraryService::update_book(&state.db, id, dto).await?))
}

#[utoipa::path(
    delete,
    path = "/api/library/books/{id}",
    params(("id" = Uuid, Path, description = "Book ID")),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 409, description = "Copies on loan", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Library"
)]
#[instrument(skip(state))]
pub async fn delete_book(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    LibraryService::delete_book(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/library/loans",
    request_body = CreateLoanDto,
    responses(
        (status = 201, description = "Book issued", body = Loan),
        (status = 400, description = "Unavailable or loan limit reached", body = ErrorResponse),
        (status = 409, description = "Borrower already holds this book", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Library"
)]
#[instrument(skip(state, staff, dto))]
pub async fn issue_loan(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    ValidatedJson(dto): ValidatedJson<CreateLoanDto>,
) -> Result<(StatusCode, Json<Loan>), AppError> {
    let loan =
        LibraryService::issue_loan(&state.db, &state.library_config, staff.user_id()?, dto).await?;
    Ok((StatusCode::CREATED, Json(loan)))
}

#[utoipa::path(
    post,
    path = "/api/library/loans/{id}/return",
    params(("id" = Uuid, Path, description = "Loan ID")),
    responses(
        (status = 200, description = "Book returned; fine computed", body = Loan),
        (status = 400, description = "Already returned", body = ErrorResponse),
        (status = 404, description = "Loan not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Library"
)]
#[instrument(skip(state))]
pub async fn return_loan(
    State(state): State<AppState>,
    RequireStaff(_staff): RequireStaff,
    Path(id): Path<Uuid>,
) -> Result<Json<Loan>, AppError> {
    Ok(Json(
        LibraryService::return_loan(&state.db, &state.library_config, id).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/library/loans",
    params(
        ("borrower_id" = Option<Uuid>, Query, description = "Filter by borrower"),
        ("active" = Option<bool>, Query, description = "Only unreturned (true) or returned (false)"),
        ("limit" = Option<i64>, Query, description = "Page size (1-100)"),
        ("page" = Option<i64>, Query, description = "Page number, 1-indexed"),
        ("offset" = Option<i64>, Query, description = "Rows to skip when page is absent")
    ),
    responses(
        (status = 200, description = "Page of loans", body = Paginated<Loan>)
    ),
    security(("bearer_auth" = [])),
    tag = "Library"
)]
#[instrument(skip(state))]
pub async fn get_loans(
    State(state): State<AppState>,
    RequireStaff(_staff): RequireStaff,
    Query(filters): Query<LoanFilterParams>,
) -> Result<Json<Paginated<Loan>>, AppError> {
    Ok(Json(LibraryService::list_loans(&state.db, filters).await?))
}

#[utoipa::path(
    get,
    path = "/api/library/loans/me",
    responses(
        (status = 200, description = "The caller's loans, active first", body = Vec<Loan>)
    ),
    security(("bearer_auth" = [])),
    tag = "Library"
)]
#[instrument(skip(state, auth_user))]
pub async fn get_my_loans(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<Vec<Loan>>, AppError> {
    Ok(Json(
        LibraryService::my_loans(&state.db, auth_user.user_id()?).await?,
    ))
}
