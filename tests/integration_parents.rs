mod common;

use axum::http::StatusCode;
use campusly::modules::users::model::UserRole;
use common::{
    create_test_class, create_test_student, create_test_user, generate_unique_email,
    login_as, send, setup_test_app,
};
use serde_json::{Value, json};
use sqlx::PgPool;
use uuid::Uuid;

const PARENT_PASSWORD: &str = "parentpass1";

/// Creates a parent through the API and returns the parent id with a login.
async fn create_parent(pool: &PgPool, admin_token: &str) -> (String, String) {
    let email = generate_unique_email();
    let (status, body) = send(
        setup_test_app(pool.clone()),
        "POST",
        "/api/parents",
        Some(admin_token),
        Some(json!({
            "first_name": "Amaka",
            "last_name": "Eze",
            "email": email,
            "password": PARENT_PASSWORD,
            "occupation": "Engineer"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);

    let (status, login) = send(
        setup_test_app(pool.clone()),
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": email, "password": PARENT_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", login);

    (
        body["id"].as_str().unwrap().to_string(),
        login["access_token"].as_str().unwrap().to_string(),
    )
}

async fn link(pool: &PgPool, admin_token: &str, parent_id: &str, student_id: Uuid) -> (StatusCode, Value) {
    send(
        setup_test_app(pool.clone()),
        "POST",
        &format!("/api/parents/{}/children", parent_id),
        Some(admin_token),
        Some(json!({ "student_id": student_id, "relationship": "mother" })),
    )
    .await
}

fn child_uris(student_id: Uuid) -> [String; 3] {
    [
        format!("/api/students/{}", student_id),
        format!("/api/fees/students/{}/invoices", student_id),
        format!("/api/attendance/students/{}/summary", student_id),
    ]
}

async fn admin_token(pool: &PgPool) -> String {
    let admin = create_test_user(pool, UserRole::Admin).await;
    login_as(pool, &admin).await
}

#[sqlx::test(migrations = "./migrations")]
async fn test_linked_parent_reaches_child_records(pool: PgPool) {
    let admin_token = admin_token(&pool).await;
    let class_id = create_test_class(&pool).await;
    let (_, student_id) = create_test_student(&pool, Some(class_id)).await;
    let (parent_id, parent_token) = create_parent(&pool, &admin_token).await;

    let (status, body) = link(&pool, &admin_token, &parent_id, student_id).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["children"][0]["relationship"], "mother");

    for uri in child_uris(student_id) {
        let (status, body) =
            send(setup_test_app(pool.clone()), "GET", &uri, Some(&parent_token), None).await;
        assert_eq!(status, StatusCode::OK, "{} {}", uri, body);
    }

    let (status, children) = send(
        setup_test_app(pool.clone()),
        "GET",
        "/api/parents/me/children",
        Some(&parent_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(children[0]["student_id"], student_id.to_string());
    assert_eq!(children[0]["class_id"], class_id.to_string());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_unlinked_parent_is_forbidden(pool: PgPool) {
    let admin_token = admin_token(&pool).await;
    let (_, own_child) = create_test_student(&pool, None).await;
    let (_, stranger) = create_test_student(&pool, None).await;
    let (parent_id, parent_token) = create_parent(&pool, &admin_token).await;
    link(&pool, &admin_token, &parent_id, own_child).await;

    for uri in child_uris(stranger) {
        let (status, _) =
            send(setup_test_app(pool.clone()), "GET", &uri, Some(&parent_token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{}", uri);
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn test_unlinking_revokes_access(pool: PgPool) {
    let admin_token = admin_token(&pool).await;
    let (_, student_id) = create_test_student(&pool, None).await;
    let (parent_id, parent_token) = create_parent(&pool, &admin_token).await;
    link(&pool, &admin_token, &parent_id, student_id).await;

    let (status, _) = link(&pool, &admin_token, &parent_id, student_id).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        setup_test_app(pool.clone()),
        "DELETE",
        &format!("/api/parents/{}/children/{}", parent_id, student_id),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        setup_test_app(pool.clone()),
        "GET",
        &format!("/api/students/{}", student_id),
        Some(&parent_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_my_children_is_for_parents_only(pool: PgPool) {
    let teacher = create_test_user(&pool, UserRole::Teacher).await;
    let token = login_as(&pool, &teacher).await;

    let (status, _) = send(
        setup_test_app(pool.clone()),
        "GET",
        "/api/parents/me/children",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
