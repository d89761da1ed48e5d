mod common;

use axum::http::StatusCode;
use campusly::modules::users::model::UserRole;
use chrono::{Duration, Utc};
use common::{create_test_class, create_test_user, generate_unique_email, login_as, send, setup_test_app};
use serde_json::{Value, json};
use sqlx::PgPool;
use uuid::Uuid;

async fn submit_application(pool: &PgPool, desired_class_id: Option<Uuid>) -> Value {
    let (status, body) = send(
        setup_test_app(pool.clone()),
        "POST",
        "/api/admissions",
        None,
        Some(json!({
            "applicant_first_name": "Tobi",
            "applicant_last_name": "Ade",
            "date_of_birth": "2015-04-02",
            "guardian_name": "Kemi Ade",
            "guardian_email": "kemi.ade@example.com",
            "guardian_phone": "+2348000000000",
            "desired_class_id": desired_class_id
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body
}

async fn post(pool: &PgPool, token: &str, uri: &str, body: Value) -> (StatusCode, Value) {
    send(setup_test_app(pool.clone()), "POST", uri, Some(token), Some(body)).await
}

#[sqlx::test(migrations = "./migrations")]
async fn test_full_pipeline_enrolls_student(pool: PgPool) {
    let admin = create_test_user(&pool, UserRole::Admin).await;
    let token = login_as(&pool, &admin).await;
    let class_id = create_test_class(&pool).await;

    let application = submit_application(&pool, Some(class_id)).await;
    assert_eq!(application["status"], "submitted");
    let id = application["id"].as_str().unwrap().to_string();

    let tomorrow = (Utc::now() + Duration::days(1)).date_naive().to_string();
    let (status, body) = post(
        &pool,
        &token,
        &format!("/api/admissions/{}/schedule-assessment", id),
        json!({ "assessment_date": tomorrow }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "assessment_scheduled");

    let (status, body) = post(
        &pool,
        &token,
        &format!("/api/admissions/{}/assessment", id),
        json!({ "score": 78, "notes": "Strong reader" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "assessed");
    assert_eq!(body["assessment_score"], 78);

    let student_email = generate_unique_email();
    let (status, body) = post(
        &pool,
        &token,
        &format!("/api/admissions/{}/accept", id),
        json!({
            "admission_number": "ADM-2025-001",
            "email": student_email,
            "password": "studentpass1"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["admission"]["status"], "accepted");
    assert!(body["admission"]["decided_at"].is_string());
    assert_eq!(body["student"]["email"], student_email);
    assert_eq!(body["student"]["class_id"], class_id.to_string());
    assert_eq!(body["admission"]["student_id"], body["student"]["id"]);

    // accepted is terminal
    let (status, _) = post(
        &pool,
        &token,
        &format!("/api/admissions/{}/reject", id),
        json!({ "reason": "Changed our minds" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_cannot_accept_without_assessment(pool: PgPool) {
    let admin = create_test_user(&pool, UserRole::Admin).await;
    let token = login_as(&pool, &admin).await;
    let application = submit_application(&pool, None).await;
    let id = application["id"].as_str().unwrap();

    let (status, body) = post(
        &pool,
        &token,
        &format!("/api/admissions/{}/accept", id),
        json!({
            "admission_number": "ADM-2025-002",
            "email": generate_unique_email(),
            "password": "studentpass1"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Cannot move application from submitted to accepted"
    );

    let students = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM students")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(students, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_failed_accept_rolls_back(pool: PgPool) {
    let admin = create_test_user(&pool, UserRole::Admin).await;
    let token = login_as(&pool, &admin).await;
    let application = submit_application(&pool, None).await;
    let id = application["id"].as_str().unwrap().to_string();

    sqlx::query("UPDATE admissions SET status = 'assessed' WHERE id = $1::uuid")
        .bind(&id)
        .execute(&pool)
        .await
        .unwrap();

    // the email belongs to an existing account
    let (status, _) = post(
        &pool,
        &token,
        &format!("/api/admissions/{}/accept", id),
        json!({
            "admission_number": "ADM-2025-003",
            "email": admin.email,
            "password": "studentpass1"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let stored = sqlx::query_scalar::<_, String>("SELECT status FROM admissions WHERE id = $1::uuid")
        .bind(&id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(stored, "assessed");

    let students = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE role = 'student'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(students, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_reject_and_filter_by_status(pool: PgPool) {
    let admin = create_test_user(&pool, UserRole::Admin).await;
    let token = login_as(&pool, &admin).await;
    let rejected = submit_application(&pool, None).await;
    submit_application(&pool, None).await;

    let (status, body) = post(
        &pool,
        &token,
        &format!("/api/admissions/{}/reject", rejected["id"].as_str().unwrap()),
        json!({ "reason": "No places left" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rejection_reason"], "No places left");

    let (status, body) = send(
        setup_test_app(pool.clone()),
        "GET",
        "/api/admissions?status=submitted",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["status"], "submitted");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_listing_applications_requires_admin(pool: PgPool) {
    let teacher = create_test_user(&pool, UserRole::Teacher).await;
    let token = login_as(&pool, &teacher).await;

    let (status, _) = send(
        setup_test_app(pool.clone()),
        "GET",
        "/api/admissions",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_score_out_of_range_is_unprocessable(pool: PgPool) {
    let admin = create_test_user(&pool, UserRole::Admin).await;
    let token = login_as(&pool, &admin).await;
    let application = submit_application(&pool, None).await;

    let (status, _) = post(
        &pool,
        &token,
        &format!("/api/admissions/{}/assessment", application["id"].as_str().unwrap()),
        json!({ "score": 140 }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}
