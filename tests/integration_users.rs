mod common;

use axum::http::StatusCode;
use campusly::modules::users::model::UserRole;
use common::{PASSWORD, create_test_user, login_as, send, setup_test_app};
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "./migrations")]
async fn test_admin_cannot_deactivate_or_delete_self(pool: PgPool) {
    let admin = create_test_user(&pool, UserRole::Admin).await;
    let token = login_as(&pool, &admin).await;

    let (status, _) = send(
        setup_test_app(pool.clone()),
        "PATCH",
        &format!("/api/users/{}/status", admin.id),
        Some(&token),
        Some(json!({ "is_active": false })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        setup_test_app(pool.clone()),
        "DELETE",
        &format!("/api/users/{}", admin.id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, me) = send(
        setup_test_app(pool.clone()),
        "GET",
        "/api/users/profile",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["is_active"], true);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_deactivated_user_cannot_log_in(pool: PgPool) {
    let admin = create_test_user(&pool, UserRole::Admin).await;
    let teacher = create_test_user(&pool, UserRole::Teacher).await;
    let token = login_as(&pool, &admin).await;
    let status_uri = format!("/api/users/{}/status", teacher.id);

    let (status, body) = send(
        setup_test_app(pool.clone()),
        "PATCH",
        &status_uri,
        Some(&token),
        Some(json!({ "is_active": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["is_active"], false);

    let login = json!({ "email": teacher.email, "password": PASSWORD });
    let (status, _) = send(
        setup_test_app(pool.clone()),
        "POST",
        "/api/auth/login",
        None,
        Some(login.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        setup_test_app(pool.clone()),
        "PATCH",
        &status_uri,
        Some(&token),
        Some(json!({ "is_active": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) =
        send(setup_test_app(pool.clone()), "POST", "/api/auth/login", None, Some(login)).await;
    assert_eq!(status, StatusCode::OK);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_admin_creates_and_deletes_user(pool: PgPool) {
    let admin = create_test_user(&pool, UserRole::Admin).await;
    let token = login_as(&pool, &admin).await;

    let payload = json!({
        "first_name": "Ngozi",
        "last_name": "Okafor",
        "email": "Ngozi.Okafor@Example.com",
        "password": "longenough1",
        "role": "teacher"
    });
    let (status, created) = send(
        setup_test_app(pool.clone()),
        "POST",
        "/api/users",
        Some(&token),
        Some(payload.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", created);
    assert_eq!(created["email"], "ngozi.okafor@example.com");
    assert_eq!(created["is_verified"], true);

    let (status, _) =
        send(setup_test_app(pool.clone()), "POST", "/api/users", Some(&token), Some(payload)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let uri = format!("/api/users/{}", created["id"].as_str().unwrap());
    let (status, _) = send(setup_test_app(pool.clone()), "DELETE", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(setup_test_app(pool.clone()), "GET", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_change_password_checks_current(pool: PgPool) {
    let student = create_test_user(&pool, UserRole::Student).await;
    let token = login_as(&pool, &student).await;

    let (status, _) = send(
        setup_test_app(pool.clone()),
        "POST",
        "/api/users/profile/change-password",
        Some(&token),
        Some(json!({ "current_password": "not-my-password", "new_password": "brandnew123" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        setup_test_app(pool.clone()),
        "POST",
        "/api/users/profile/change-password",
        Some(&token),
        Some(json!({ "current_password": PASSWORD, "new_password": "brandnew123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        setup_test_app(pool.clone()),
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": student.email, "password": "brandnew123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}
