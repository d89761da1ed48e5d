#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use campusly::campusly_config::RateLimitConfig;
use campusly::modules::users::model::UserRole;
use campusly::modules::users::service::{NewUser, UserService};
use campusly::router::init_router;
use campusly::state::AppState;
use campusly_core::hash_password;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

pub const PASSWORD: &str = "testpass123";

pub struct TestUser {
    pub id: Uuid,
    pub email: String,
}

pub fn generate_unique_email() -> String {
    format!("test_{}@example.com", Uuid::new_v4())
}

/// App with rate limiting and outgoing mail switched off.
pub fn setup_test_app(pool: PgPool) -> axum::Router {
    dotenvy::dotenv().ok();
    let mut state = AppState {
        rate_limit_config: RateLimitConfig::disabled(),
        ..AppState::from_env(pool)
    };
    state.email_config.enabled = false;
    init_router(state, None)
}

/// Inserts a verified, active user directly.
pub async fn create_test_user(pool: &PgPool, role: UserRole) -> TestUser {
    let email = generate_unique_email();
    let password_hash = hash_password(PASSWORD).unwrap();
    let user = UserService::insert_user(
        pool,
        NewUser {
            first_name: "Test",
            last_name: "User",
            email: &email,
            phone: None,
            password_hash: &password_hash,
            role,
            is_verified: true,
        },
    )
    .await
    .unwrap();
    TestUser { id: user.id, email }
}

pub async fn create_test_class(pool: &PgPool) -> Uuid {
    sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO classes (name, academic_year) VALUES ($1, '2025/2026') RETURNING id",
    )
    .bind(format!("Class {}", Uuid::new_v4()))
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn create_test_subject(pool: &PgPool, class_id: Uuid, teacher_id: Option<Uuid>) -> Uuid {
    let code = Uuid::new_v4().simple().to_string()[..10].to_uppercase();
    sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO subjects (name, code, class_id, teacher_id)
         VALUES ('Mathematics', $1, $2, $3) RETURNING id",
    )
    .bind(code)
    .bind(class_id)
    .bind(teacher_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

/// Creates a student account plus profile; returns the user and student id.
pub async fn create_test_student(pool: &PgPool, class_id: Option<Uuid>) -> (TestUser, Uuid) {
    let user = create_test_user(pool, UserRole::Student).await;
    let student_id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO students (user_id, admission_number, class_id) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(user.id)
    .bind(format!("ADM-{}", Uuid::new_v4()))
    .bind(class_id)
    .fetch_one(pool)
    .await
    .unwrap();
    (user, student_id)
}

pub async fn get_auth_token(app: axum::Router, email: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": email, "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    body["access_token"].as_str().unwrap().to_string()
}

pub async fn login_as(pool: &PgPool, user: &TestUser) -> String {
    get_auth_token(setup_test_app(pool.clone()), &user.email).await
}

/// Sends a request and returns the status with the parsed JSON body
/// (`Value::Null` for empty bodies).
pub async fn send(
    app: axum::Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}
