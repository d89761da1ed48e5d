mod common;

use axum::http::StatusCode;
use campusly::modules::users::model::UserRole;
use common::{TestUser, create_test_user, login_as, send, setup_test_app};
use serde_json::{Value, json};
use sqlx::PgPool;
use uuid::Uuid;

async fn send_message(pool: &PgPool, token: &str, recipient: &TestUser) -> String {
    let (status, body) = send(
        setup_test_app(pool.clone()),
        "POST",
        "/api/messages",
        Some(token),
        Some(json!({
            "recipient_id": recipient.id,
            "subject": "Homework",
            "body": "Please check the reading list for next week."
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert!(body["read_at"].is_null());
    body["id"].as_str().unwrap().to_string()
}

async fn get(pool: &PgPool, token: &str, uri: &str) -> (StatusCode, Value) {
    send(setup_test_app(pool.clone()), "GET", uri, Some(token), None).await
}

async fn delete(pool: &PgPool, token: &str, id: &str) -> StatusCode {
    send(
        setup_test_app(pool.clone()),
        "DELETE",
        &format!("/api/messages/{}", id),
        Some(token),
        None,
    )
    .await
    .0
}

async fn row_exists(pool: &PgPool, id: &str) -> bool {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM messages WHERE id = $1::uuid)")
        .bind(id)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[sqlx::test(migrations = "./migrations")]
async fn test_reading_clears_unread_count(pool: PgPool) {
    let teacher = create_test_user(&pool, UserRole::Teacher).await;
    let parent = create_test_user(&pool, UserRole::Parent).await;
    let teacher_token = login_as(&pool, &teacher).await;
    let parent_token = login_as(&pool, &parent).await;

    let id = send_message(&pool, &teacher_token, &parent).await;

    let (_, count) = get(&pool, &parent_token, "/api/messages/unread-count").await;
    assert_eq!(count["unread"], 1);

    // the sender opening it does not mark it read
    let (status, body) = get(&pool, &teacher_token, &format!("/api/messages/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["read_at"].is_null());

    let (status, body) = get(&pool, &parent_token, &format!("/api/messages/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body["read_at"].is_null());

    let (_, count) = get(&pool, &parent_token, "/api/messages/unread-count").await;
    assert_eq!(count["unread"], 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_delete_hides_one_side_until_both_delete(pool: PgPool) {
    let teacher = create_test_user(&pool, UserRole::Teacher).await;
    let parent = create_test_user(&pool, UserRole::Parent).await;
    let teacher_token = login_as(&pool, &teacher).await;
    let parent_token = login_as(&pool, &parent).await;

    let id = send_message(&pool, &teacher_token, &parent).await;
    let uri = format!("/api/messages/{}", id);

    assert_eq!(delete(&pool, &teacher_token, &id).await, StatusCode::NO_CONTENT);

    let (status, _) = get(&pool, &teacher_token, &uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, sent) = get(&pool, &teacher_token, "/api/messages/sent").await;
    assert_eq!(sent["meta"]["total"], 0);

    // still in the recipient's inbox
    let (status, _) = get(&pool, &parent_token, &uri).await;
    assert_eq!(status, StatusCode::OK);
    let (_, inbox) = get(&pool, &parent_token, "/api/messages/inbox").await;
    assert_eq!(inbox["meta"]["total"], 1);
    assert!(row_exists(&pool, &id).await);

    // a second delete from the same side finds nothing
    assert_eq!(delete(&pool, &teacher_token, &id).await, StatusCode::NOT_FOUND);

    assert_eq!(delete(&pool, &parent_token, &id).await, StatusCode::NO_CONTENT);
    assert!(!row_exists(&pool, &id).await);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_third_party_sees_not_found(pool: PgPool) {
    let teacher = create_test_user(&pool, UserRole::Teacher).await;
    let parent = create_test_user(&pool, UserRole::Parent).await;
    let outsider = create_test_user(&pool, UserRole::Student).await;
    let teacher_token = login_as(&pool, &teacher).await;
    let outsider_token = login_as(&pool, &outsider).await;

    let id = send_message(&pool, &teacher_token, &parent).await;
    let uri = format!("/api/messages/{}", id);

    let (status, _) = get(&pool, &outsider_token, &uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        setup_test_app(pool.clone()),
        "POST",
        &format!("{}/read", uri),
        Some(&outsider_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert_eq!(delete(&pool, &outsider_token, &id).await, StatusCode::NOT_FOUND);
    assert!(row_exists(&pool, &id).await);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_cannot_message_self_or_unknown_user(pool: PgPool) {
    let teacher = create_test_user(&pool, UserRole::Teacher).await;
    let token = login_as(&pool, &teacher).await;

    for (recipient, expected) in [
        (teacher.id, StatusCode::BAD_REQUEST),
        (Uuid::new_v4(), StatusCode::NOT_FOUND),
    ] {
        let (status, _) = send(
            setup_test_app(pool.clone()),
            "POST",
            "/api/messages",
            Some(&token),
            Some(json!({ "recipient_id": recipient, "body": "hello" })),
        )
        .await;
        assert_eq!(status, expected);
    }
}
