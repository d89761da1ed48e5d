mod common;

use axum::http::StatusCode;
use campusly::modules::users::model::UserRole;
use common::{create_test_student, create_test_user, login_as, send, setup_test_app};
use serde_json::{Value, json};
use sqlx::PgPool;
use uuid::Uuid;

async fn issue_invoice(pool: &PgPool, token: &str, student_id: Uuid, amount_cents: i64) -> Value {
    let (status, body) = send(
        setup_test_app(pool.clone()),
        "POST",
        "/api/fees/invoices",
        Some(token),
        Some(json!({
            "student_id": student_id,
            "title": "Term 1 tuition",
            "amount_cents": amount_cents,
            "due_date": "2030-01-31"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body
}

async fn pay(pool: &PgPool, token: &str, invoice_id: &str, amount_cents: i64) -> (StatusCode, Value) {
    send(
        setup_test_app(pool.clone()),
        "POST",
        &format!("/api/fees/invoices/{}/payments", invoice_id),
        Some(token),
        Some(json!({ "amount_cents": amount_cents, "method": "bank_transfer" })),
    )
    .await
}

#[sqlx::test(migrations = "./migrations")]
async fn test_partial_then_full_payment(pool: PgPool) {
    let admin = create_test_user(&pool, UserRole::Admin).await;
    let token = login_as(&pool, &admin).await;
    let (_, student_id) = create_test_student(&pool, None).await;

    let invoice = issue_invoice(&pool, &token, student_id, 50_000).await;
    assert_eq!(invoice["status"], "unpaid");
    assert_eq!(invoice["balance_cents"], 50_000);
    let id = invoice["id"].as_str().unwrap().to_string();

    let (status, body) = pay(&pool, &token, &id, 20_000).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["invoice"]["status"], "partially_paid");
    assert_eq!(body["invoice"]["paid_cents"], 20_000);
    assert_eq!(body["invoice"]["balance_cents"], 30_000);

    let (status, _) = pay(&pool, &token, &id, 30_001).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "overpayment is rejected");

    let (status, body) = pay(&pool, &token, &id, 30_000).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["invoice"]["status"], "paid");
    assert_eq!(body["invoice"]["balance_cents"], 0);

    let (status, _) = pay(&pool, &token, &id, 1).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "paid invoices take no payments");

    let (status, body) = send(
        setup_test_app(pool.clone()),
        "GET",
        &format!("/api/fees/invoices/{}/payments", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_cancel_rules(pool: PgPool) {
    let admin = create_test_user(&pool, UserRole::Admin).await;
    let token = login_as(&pool, &admin).await;
    let (_, student_id) = create_test_student(&pool, None).await;

    let unpaid = issue_invoice(&pool, &token, student_id, 10_000).await;
    let unpaid_id = unpaid["id"].as_str().unwrap();
    let cancel_uri = format!("/api/fees/invoices/{}/cancel", unpaid_id);

    let (status, body) = send(setup_test_app(pool.clone()), "POST", &cancel_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "cancelled");

    let (status, _) = send(setup_test_app(pool.clone()), "POST", &cancel_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = pay(&pool, &token, unpaid_id, 100).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let partly_paid = issue_invoice(&pool, &token, student_id, 10_000).await;
    let partly_paid_id = partly_paid["id"].as_str().unwrap();
    pay(&pool, &token, partly_paid_id, 5_000).await;

    let (status, _) = send(
        setup_test_app(pool.clone()),
        "POST",
        &format!("/api/fees/invoices/{}/cancel", partly_paid_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_student_sees_only_own_invoices(pool: PgPool) {
    let admin = create_test_user(&pool, UserRole::Admin).await;
    let token = login_as(&pool, &admin).await;
    let (student, student_id) = create_test_student(&pool, None).await;
    let (_, other_id) = create_test_student(&pool, None).await;
    issue_invoice(&pool, &token, student_id, 7_500).await;

    let student_token = login_as(&pool, &student).await;
    let (status, body) = send(
        setup_test_app(pool.clone()),
        "GET",
        &format!("/api/fees/students/{}/invoices", student_id),
        Some(&student_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["amount_cents"], 7_500);

    let (status, _) = send(
        setup_test_app(pool.clone()),
        "GET",
        &format!("/api/fees/students/{}/invoices", other_id),
        Some(&student_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        setup_test_app(pool.clone()),
        "GET",
        "/api/fees/invoices",
        Some(&student_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
