mod common;

use axum::http::StatusCode;
use campusly::modules::users::model::UserRole;
use common::{create_test_student, create_test_user, login_as, send, setup_test_app};
use serde_json::{Value, json};
use sqlx::PgPool;
use uuid::Uuid;

async fn create_route(pool: &PgPool, token: &str, name: &str, capacity: i32) -> String {
    let (status, body) = send(
        setup_test_app(pool.clone()),
        "POST",
        "/api/transport/routes",
        Some(token),
        Some(json!({
            "name": name,
            "vehicle_number": "KJA-123-XY",
            "driver_name": "Musa Bello",
            "driver_phone": "+2348000000000",
            "capacity": capacity,
            "fare_cents": 15_000
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["id"].as_str().unwrap().to_string()
}

async fn assign(pool: &PgPool, token: &str, route_id: &str, student_id: Uuid) -> (StatusCode, Value) {
    send(
        setup_test_app(pool.clone()),
        "POST",
        &format!("/api/transport/routes/{}/students", route_id),
        Some(token),
        Some(json!({ "student_id": student_id, "pickup_point": "Main gate" })),
    )
    .await
}

async fn assigned_count(pool: &PgPool, token: &str, route_id: &str) -> i64 {
    let (status, body) = send(
        setup_test_app(pool.clone()),
        "GET",
        &format!("/api/transport/routes/{}", route_id),
        Some(token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["assigned_count"].as_i64().unwrap()
}

#[sqlx::test(migrations = "./migrations")]
async fn test_full_route_rejects_new_riders(pool: PgPool) {
    let admin = create_test_user(&pool, UserRole::Admin).await;
    let token = login_as(&pool, &admin).await;
    let route = create_route(&pool, &token, "North loop", 1).await;
    let (_, first) = create_test_student(&pool, None).await;
    let (_, second) = create_test_student(&pool, None).await;

    let (status, body) = assign(&pool, &token, &route, first).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);

    let (status, _) = assign(&pool, &token, &route, second).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // re-assigning the current rider does not count against capacity
    let (status, _) = assign(&pool, &token, &route, first).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(assigned_count(&pool, &token, &route).await, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_reassignment_moves_student(pool: PgPool) {
    let admin = create_test_user(&pool, UserRole::Admin).await;
    let token = login_as(&pool, &admin).await;
    let north = create_route(&pool, &token, "North loop", 10).await;
    let south = create_route(&pool, &token, "South loop", 10).await;
    let (_, student_id) = create_test_student(&pool, None).await;

    let (status, _) = assign(&pool, &token, &north, student_id).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = assign(&pool, &token, &south, student_id).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["route_id"], south.as_str());

    assert_eq!(assigned_count(&pool, &token, &north).await, 0);
    assert_eq!(assigned_count(&pool, &token, &south).await, 1);

    let (status, riders) = send(
        setup_test_app(pool.clone()),
        "GET",
        &format!("/api/transport/routes/{}/students", south),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(riders[0]["student_id"], student_id.to_string());

    // the old route no longer holds the student
    let (status, _) = send(
        setup_test_app(pool.clone()),
        "DELETE",
        &format!("/api/transport/routes/{}/students/{}", north, student_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_capacity_cannot_drop_below_riders(pool: PgPool) {
    let admin = create_test_user(&pool, UserRole::Admin).await;
    let token = login_as(&pool, &admin).await;
    let route = create_route(&pool, &token, "East loop", 5).await;
    for _ in 0..2 {
        let (_, student_id) = create_test_student(&pool, None).await;
        let (status, _) = assign(&pool, &token, &route, student_id).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let uri = format!("/api/transport/routes/{}", route);
    let (status, _) = send(
        setup_test_app(pool.clone()),
        "PUT",
        &uri,
        Some(&token),
        Some(json!({ "capacity": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        setup_test_app(pool.clone()),
        "PUT",
        &uri,
        Some(&token),
        Some(json!({ "capacity": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["capacity"], 2);

    let (status, _) = send(setup_test_app(pool.clone()), "DELETE", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}
