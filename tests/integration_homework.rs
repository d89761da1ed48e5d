mod common;

use axum::http::StatusCode;
use campusly::modules::users::model::UserRole;
use common::{
    create_test_class, create_test_student, create_test_subject, create_test_user, login_as,
    send, setup_test_app,
};
use serde_json::{Value, json};
use sqlx::PgPool;
use uuid::Uuid;

struct HomeworkFixture {
    teacher_token: String,
    class_id: Uuid,
    subject_id: Uuid,
}

async fn homework_fixture(pool: &PgPool) -> HomeworkFixture {
    let teacher = create_test_user(pool, UserRole::Teacher).await;
    let class_id = create_test_class(pool).await;
    let subject_id = create_test_subject(pool, class_id, Some(teacher.id)).await;
    HomeworkFixture {
        teacher_token: login_as(pool, &teacher).await,
        class_id,
        subject_id,
    }
}

async fn assign(pool: &PgPool, fx: &HomeworkFixture, due_date: &str) -> String {
    let (status, body) = send(
        setup_test_app(pool.clone()),
        "POST",
        "/api/homework",
        Some(&fx.teacher_token),
        Some(json!({
            "class_id": fx.class_id,
            "subject_id": fx.subject_id,
            "title": "Fractions worksheet",
            "due_date": due_date
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["id"].as_str().unwrap().to_string()
}

async fn submit(pool: &PgPool, token: &str, homework_id: &str, content: &str) -> (StatusCode, Value) {
    send(
        setup_test_app(pool.clone()),
        "POST",
        &format!("/api/homework/{}/submissions", homework_id),
        Some(token),
        Some(json!({ "content": content })),
    )
    .await
}

#[sqlx::test(migrations = "./migrations")]
async fn test_submission_after_due_date_is_late(pool: PgPool) {
    let fx = homework_fixture(&pool).await;
    let (student, _) = create_test_student(&pool, Some(fx.class_id)).await;
    let token = login_as(&pool, &student).await;

    let overdue = assign(&pool, &fx, "2020-01-15").await;
    let (status, body) = submit(&pool, &token, &overdue, "1/2 + 1/4 = 3/4").await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["status"], "late");

    let upcoming = assign(&pool, &fx, "2099-01-15").await;
    let (status, body) = submit(&pool, &token, &upcoming, "1/2 + 1/4 = 3/4").await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["status"], "submitted");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_graded_submission_cannot_be_replaced(pool: PgPool) {
    let fx = homework_fixture(&pool).await;
    let (student, _) = create_test_student(&pool, Some(fx.class_id)).await;
    let token = login_as(&pool, &student).await;
    let homework_id = assign(&pool, &fx, "2099-01-15").await;

    let (_, first) = submit(&pool, &token, &homework_id, "first draft").await;
    let (status, second) = submit(&pool, &token, &homework_id, "final answer").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(second["id"], first["id"], "resubmitting replaces the same row");
    assert_eq!(second["content"], "final answer");

    let (status, graded) = send(
        setup_test_app(pool.clone()),
        "POST",
        &format!("/api/homework/submissions/{}/grade", second["id"].as_str().unwrap()),
        Some(&fx.teacher_token),
        Some(json!({ "grade": "A", "feedback": "Well done" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", graded);
    assert_eq!(graded["status"], "graded");

    let (status, _) = submit(&pool, &token, &homework_id, "sneaky edit").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, submissions) = send(
        setup_test_app(pool.clone()),
        "GET",
        &format!("/api/homework/{}/submissions", homework_id),
        Some(&fx.teacher_token),
        None,
    )
    .await;
    let submissions = submissions.as_array().unwrap();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0]["content"], "final answer");
    assert_eq!(submissions[0]["grade"], "A");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_students_only_reach_their_own_class(pool: PgPool) {
    let fx = homework_fixture(&pool).await;
    let other_class = create_test_class(&pool).await;
    let (outsider, _) = create_test_student(&pool, Some(other_class)).await;
    let token = login_as(&pool, &outsider).await;
    let homework_id = assign(&pool, &fx, "2099-01-15").await;

    let (status, _) = submit(&pool, &token, &homework_id, "not my class").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        setup_test_app(pool.clone()),
        "GET",
        &format!("/api/homework/{}", homework_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // the class filter is ignored for students
    let (status, list) = send(
        setup_test_app(pool.clone()),
        "GET",
        &format!("/api/homework?class_id={}", fx.class_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["meta"]["total"], 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_subject_must_belong_to_class(pool: PgPool) {
    let fx = homework_fixture(&pool).await;
    let other_class = create_test_class(&pool).await;

    let (status, _) = send(
        setup_test_app(pool.clone()),
        "POST",
        "/api/homework",
        Some(&fx.teacher_token),
        Some(json!({
            "class_id": other_class,
            "subject_id": fx.subject_id,
            "title": "Mismatched",
            "due_date": "2099-01-15"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
