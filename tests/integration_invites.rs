mod common;

use axum::http::StatusCode;
use campusly::modules::users::model::UserRole;
use common::{PASSWORD, create_test_user, generate_unique_email, login_as, send, setup_test_app};
use serde_json::{Value, json};
use sqlx::PgPool;

async fn create_invite(pool: &PgPool, token: &str, body: Value) -> (StatusCode, Value) {
    send(
        setup_test_app(pool.clone()),
        "POST",
        "/api/invites",
        Some(token),
        Some(body),
    )
    .await
}

async fn register_with(pool: &PgPool, invite_token: &str) -> (StatusCode, Value) {
    send(
        setup_test_app(pool.clone()),
        "POST",
        "/api/auth/register/invite",
        None,
        Some(json!({
            "token": invite_token,
            "first_name": "Grace",
            "last_name": "Eze",
            "password": PASSWORD
        })),
    )
    .await
}

#[sqlx::test(migrations = "./migrations")]
async fn test_invite_lifecycle(pool: PgPool) {
    let admin = create_test_user(&pool, UserRole::Admin).await;
    let token = login_as(&pool, &admin).await;
    let email = generate_unique_email();

    let (status, body) =
        create_invite(&pool, &token, json!({ "email": email, "role": "teacher" })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["invite"]["status"], "pending");
    let invite_token = body["token"].as_str().unwrap().to_string();
    assert!(body["registration_url"].as_str().unwrap().contains(&invite_token));

    let (status, body) = send(
        setup_test_app(pool.clone()),
        "GET",
        &format!("/api/invites/validate?token={}", invite_token),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "active");
    assert_eq!(body["uses_left"], 1);
    assert_eq!(body["role"], "teacher");

    let (status, body) = register_with(&pool, &invite_token).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["email"], email);
    assert_eq!(body["user"]["role"], "teacher");
    assert_eq!(body["user"]["is_verified"], true);

    // single use
    let (status, _) = register_with(&pool, &invite_token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let stored = sqlx::query_scalar::<_, String>("SELECT status FROM invites WHERE email = $1")
        .bind(&email)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(stored, "used");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_revoked_invite_cannot_be_redeemed(pool: PgPool) {
    let admin = create_test_user(&pool, UserRole::Admin).await;
    let token = login_as(&pool, &admin).await;

    let (_, body) = create_invite(
        &pool,
        &token,
        json!({ "email": generate_unique_email(), "role": "admin" }),
    )
    .await;
    let invite_id = body["invite"]["id"].as_str().unwrap().to_string();
    let invite_token = body["token"].as_str().unwrap().to_string();

    let (status, body) = send(
        setup_test_app(pool.clone()),
        "POST",
        &format!("/api/invites/{}/revoke", invite_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "revoked");

    let (status, _) = register_with(&pool, &invite_token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // revoking twice is rejected
    let (status, _) = send(
        setup_test_app(pool.clone()),
        "POST",
        &format!("/api/invites/{}/revoke", invite_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_expired_invite_is_reported_and_persisted(pool: PgPool) {
    let admin = create_test_user(&pool, UserRole::Admin).await;
    let token = login_as(&pool, &admin).await;
    let email = generate_unique_email();

    let (_, body) =
        create_invite(&pool, &token, json!({ "email": email, "role": "teacher" })).await;
    let invite_token = body["token"].as_str().unwrap().to_string();

    sqlx::query("UPDATE invites SET expires_at = NOW() - INTERVAL '1 hour' WHERE email = $1")
        .bind(&email)
        .execute(&pool)
        .await
        .unwrap();

    let (status, body) = send(
        setup_test_app(pool.clone()),
        "GET",
        &format!("/api/invites/validate?token={}", invite_token),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "expired");

    let (status, _) = register_with(&pool, &invite_token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let stored = sqlx::query_scalar::<_, String>("SELECT status FROM invites WHERE email = $1")
        .bind(&email)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(stored, "expired");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_unknown_invite_token_is_not_found(pool: PgPool) {
    let (status, _) = send(
        setup_test_app(pool.clone()),
        "GET",
        "/api/invites/validate?token=deadbeef",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_teacher_cannot_create_invites(pool: PgPool) {
    let teacher = create_test_user(&pool, UserRole::Teacher).await;
    let token = login_as(&pool, &teacher).await;

    let (status, _) = create_invite(
        &pool,
        &token,
        json!({ "email": generate_unique_email(), "role": "teacher" }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
