use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    create_book, delete_book, get_book, get_books, get_loans, get_my_loans, issue_loan,
    return_loan, update_book,
};

pub fn init_library_router() -> Router<AppState> {
    Router::new()
        .route("/books", get(get_books).post(create_book))
        .route(
            "/books/{id}",
            get(get_book).put(update_book).delete(delete_book),
        )
        .route("/loans", get(get_loans).post(issue_loan))
        .route("/loans/me", get(get_my_loans))
        .route("/loans/{id}/return", post(return_loan))
}
