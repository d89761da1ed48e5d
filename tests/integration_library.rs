mod common;

use axum::http::StatusCode;
use campusly::campusly_config::LibraryConfig;
use campusly::modules::users::model::UserRole;
use common::{create_test_user, login_as, send, setup_test_app};
use serde_json::{Value, json};
use sqlx::PgPool;
use uuid::Uuid;

const DUE_DATE: &str = "2030-06-30";

async fn add_book(pool: &PgPool, token: &str, copies: i32) -> Value {
    let isbn = format!("978{}", &Uuid::new_v4().simple().to_string()[..10]);
    let (status, body) = send(
        setup_test_app(pool.clone()),
        "POST",
        "/api/library/books",
        Some(token),
        Some(json!({
            "title": "Things Fall Apart",
            "author": "Chinua Achebe",
            "isbn": isbn,
            "total_copies": copies
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body
}

async fn issue(pool: &PgPool, token: &str, book_id: &str, borrower_id: Uuid) -> (StatusCode, Value) {
    send(
        setup_test_app(pool.clone()),
        "POST",
        "/api/library/loans",
        Some(token),
        Some(json!({ "book_id": book_id, "borrower_id": borrower_id, "due_date": DUE_DATE })),
    )
    .await
}

async fn return_loan(pool: &PgPool, token: &str, loan_id: &str) -> (StatusCode, Value) {
    send(
        setup_test_app(pool.clone()),
        "POST",
        &format!("/api/library/loans/{}/return", loan_id),
        Some(token),
        None,
    )
    .await
}

async fn book(pool: &PgPool, token: &str, book_id: &str) -> Value {
    let (status, body) = send(
        setup_test_app(pool.clone()),
        "GET",
        &format!("/api/library/books/{}", book_id),
        Some(token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body
}

#[sqlx::test(migrations = "./migrations")]
async fn test_loan_and_return_track_available_copies(pool: PgPool) {
    let admin = create_test_user(&pool, UserRole::Admin).await;
    let student = create_test_user(&pool, UserRole::Student).await;
    let token = login_as(&pool, &admin).await;

    let created = add_book(&pool, &token, 2).await;
    assert_eq!(created["available_copies"], 2);
    let book_id = created["id"].as_str().unwrap().to_string();

    let (status, loan) = issue(&pool, &token, &book_id, student.id).await;
    assert_eq!(status, StatusCode::CREATED, "{}", loan);
    assert!(loan["returned_at"].is_null());
    assert_eq!(book(&pool, &token, &book_id).await["available_copies"], 1);

    let loan_id = loan["id"].as_str().unwrap().to_string();
    let (status, returned) = return_loan(&pool, &token, &loan_id).await;
    assert_eq!(status, StatusCode::OK, "{}", returned);
    assert!(!returned["returned_at"].is_null());
    assert_eq!(returned["fine_cents"], 0);
    assert_eq!(book(&pool, &token, &book_id).await["available_copies"], 2);

    // returning twice must not put a phantom copy back on the shelf
    let (status, _) = return_loan(&pool, &token, &loan_id).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(book(&pool, &token, &book_id).await["available_copies"], 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_active_loans_are_capped_per_borrower(pool: PgPool) {
    let admin = create_test_user(&pool, UserRole::Admin).await;
    let student = create_test_user(&pool, UserRole::Student).await;
    let token = login_as(&pool, &admin).await;
    let limit = LibraryConfig::from_env().max_active_loans;

    for _ in 0..limit {
        let book_id = add_book(&pool, &token, 1).await["id"].as_str().unwrap().to_string();
        let (status, body) = issue(&pool, &token, &book_id, student.id).await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
    }

    let extra = add_book(&pool, &token, 1).await["id"].as_str().unwrap().to_string();
    let (status, _) = issue(&pool, &token, &extra, student.id).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(book(&pool, &token, &extra).await["available_copies"], 1);

    let student_token = login_as(&pool, &student).await;
    let (status, mine) = send(
        setup_test_app(pool.clone()),
        "GET",
        "/api/library/loans/me",
        Some(&student_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().unwrap().len() as i64, limit);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_no_loan_when_every_copy_is_out(pool: PgPool) {
    let admin = create_test_user(&pool, UserRole::Admin).await;
    let first = create_test_user(&pool, UserRole::Student).await;
    let second = create_test_user(&pool, UserRole::Student).await;
    let token = login_as(&pool, &admin).await;
    let book_id = add_book(&pool, &token, 1).await["id"].as_str().unwrap().to_string();

    let (status, _) = issue(&pool, &token, &book_id, first.id).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = issue(&pool, &token, &book_id, second.id).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_book_on_loan_cannot_be_deleted(pool: PgPool) {
    let admin = create_test_user(&pool, UserRole::Admin).await;
    let student = create_test_user(&pool, UserRole::Student).await;
    let token = login_as(&pool, &admin).await;
    let book_id = add_book(&pool, &token, 1).await["id"].as_str().unwrap().to_string();

    let (_, loan) = issue(&pool, &token, &book_id, student.id).await;
    let uri = format!("/api/library/books/{}", book_id);

    let (status, _) = send(setup_test_app(pool.clone()), "DELETE", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = return_loan(&pool, &token, loan["id"].as_str().unwrap()).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(setup_test_app(pool.clone()), "DELETE", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(setup_test_app(pool.clone()), "GET", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_students_cannot_issue_loans(pool: PgPool) {
    let admin = create_test_user(&pool, UserRole::Admin).await;
    let student = create_test_user(&pool, UserRole::Student).await;
    let admin_token = login_as(&pool, &admin).await;
    let book_id = add_book(&pool, &admin_token, 1).await["id"].as_str().unwrap().to_string();

    let student_token = login_as(&pool, &student).await;
    let (status, _) = issue(&pool, &student_token, &book_id, student.id).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
