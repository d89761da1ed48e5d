mod common;

use axum::http::StatusCode;
use campusly::modules::users::model::UserRole;
use common::{create_test_user, login_as, send, setup_test_app};
use serde_json::{Value, json};
use sqlx::PgPool;

async fn post(pool: &PgPool, token: &str, body: Value) -> (StatusCode, Value) {
    send(
        setup_test_app(pool.clone()),
        "POST",
        "/api/announcements",
        Some(token),
        Some(body),
    )
    .await
}

async fn announce(pool: &PgPool, token: &str, title: &str, body: Value) -> String {
    let mut payload = json!({ "title": title, "body": "Details inside." });
    if let (Some(payload), Some(extra)) = (payload.as_object_mut(), body.as_object()) {
        payload.extend(extra.clone());
    }
    let (status, created) = post(pool, token, payload).await;
    assert_eq!(status, StatusCode::CREATED, "{}", created);
    created["id"].as_str().unwrap().to_string()
}

async fn visible_titles(pool: &PgPool, token: &str) -> Vec<String> {
    let (status, body) = send(
        setup_test_app(pool.clone()),
        "GET",
        "/api/announcements",
        Some(token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let mut titles: Vec<String> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["title"].as_str().unwrap().to_string())
        .collect();
    titles.sort();
    titles
}

#[sqlx::test(migrations = "./migrations")]
async fn test_audience_and_window_filter_the_feed(pool: PgPool) {
    let admin = create_test_user(&pool, UserRole::Admin).await;
    let teacher = create_test_user(&pool, UserRole::Teacher).await;
    let parent = create_test_user(&pool, UserRole::Parent).await;
    let student = create_test_user(&pool, UserRole::Student).await;
    let teacher_token = login_as(&pool, &teacher).await;

    announce(&pool, &teacher_token, "everyone", json!({ "audience": "all" })).await;
    announce(&pool, &teacher_token, "parents", json!({ "audience": "parent" })).await;
    announce(
        &pool,
        &teacher_token,
        "scheduled",
        json!({ "audience": "all", "publish_at": "2099-01-01T08:00:00Z" }),
    )
    .await;
    announce(
        &pool,
        &teacher_token,
        "expired",
        json!({
            "audience": "all",
            "publish_at": "2020-01-01T08:00:00Z",
            "expires_at": "2020-02-01T08:00:00Z"
        }),
    )
    .await;

    let parent_token = login_as(&pool, &parent).await;
    assert_eq!(visible_titles(&pool, &parent_token).await, vec!["everyone", "parents"]);

    let student_token = login_as(&pool, &student).await;
    assert_eq!(visible_titles(&pool, &student_token).await, vec!["everyone"]);

    let admin_token = login_as(&pool, &admin).await;
    assert_eq!(
        visible_titles(&pool, &admin_token).await,
        vec!["everyone", "expired", "parents", "scheduled"]
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn test_hidden_announcement_is_not_found(pool: PgPool) {
    let teacher = create_test_user(&pool, UserRole::Teacher).await;
    let student = create_test_user(&pool, UserRole::Student).await;
    let teacher_token = login_as(&pool, &teacher).await;
    let student_token = login_as(&pool, &student).await;

    let for_parents = announce(&pool, &teacher_token, "parents", json!({ "audience": "parent" })).await;
    let scheduled = announce(
        &pool,
        &teacher_token,
        "scheduled",
        json!({ "audience": "student", "publish_at": "2099-01-01T08:00:00Z" }),
    )
    .await;

    for id in [&for_parents, &scheduled] {
        let (status, _) = send(
            setup_test_app(pool.clone()),
            "GET",
            &format!("/api/announcements/{}", id),
            Some(&student_token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn test_only_author_or_admin_may_edit(pool: PgPool) {
    let author = create_test_user(&pool, UserRole::Teacher).await;
    let colleague = create_test_user(&pool, UserRole::Teacher).await;
    let admin = create_test_user(&pool, UserRole::Admin).await;
    let author_token = login_as(&pool, &author).await;
    let id = announce(&pool, &author_token, "sports day", json!({ "audience": "all" })).await;
    let uri = format!("/api/announcements/{}", id);

    let colleague_token = login_as(&pool, &colleague).await;
    let (status, _) = send(
        setup_test_app(pool.clone()),
        "PUT",
        &uri,
        Some(&colleague_token),
        Some(json!({ "title": "cancelled" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin_token = login_as(&pool, &admin).await;
    let (status, body) = send(
        setup_test_app(pool.clone()),
        "PUT",
        &uri,
        Some(&admin_token),
        Some(json!({ "title": "sports day moved" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["title"], "sports day moved");

    let (status, _) =
        send(setup_test_app(pool.clone()), "DELETE", &uri, Some(&author_token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_students_cannot_post_and_window_must_be_ordered(pool: PgPool) {
    let student = create_test_user(&pool, UserRole::Student).await;
    let teacher = create_test_user(&pool, UserRole::Teacher).await;

    let student_token = login_as(&pool, &student).await;
    let (status, _) = post(
        &pool,
        &student_token,
        json!({ "title": "party", "body": "tonight", "audience": "all" }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let teacher_token = login_as(&pool, &teacher).await;
    let (status, _) = post(
        &pool,
        &teacher_token,
        json!({
            "title": "backwards",
            "body": "ends before it starts",
            "audience": "all",
            "publish_at": "2030-01-02T00:00:00Z",
            "expires_at": "2030-01-01T00:00:00Z"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}
