use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    cancel_invoice, create_invoice, get_invoice, get_invoices, get_payments,
    get_student_invoices, record_payment,
};

pub fn init_fees_router() -> Router<AppState> {
    Router::new()
        .route("/invoices", get(get_invoices).post(create_invoice))
        .route("/invoices/{id}", get(get_invoice))
        .route("/invoices/{id}/payments", get(get_payments).post(record_payment))
        .route("/invoices/{id}/cancel", post(cancel_invoice))
        .route("/students/{student_id}/invoices", get(get_student_invoices))
}
