//! End-to-end tests for the auth HTTP surface.

use std::sync::Arc;

use axum_test::TestServer;
use serde_json::{json, Value};

use admitpath::api::{build_router, ApiState};
use admitpath::auth::{AuthService, TokenIssuer};
use admitpath::config::{AuthConfig, DatabaseConfig};
use admitpath::storage::{
    create_pool, migrations, AccountRepository, DbPool, SqlxAccountRepository,
};

async fn test_app() -> (TestServer, DbPool) {
    // A single connection keeps every query on the same in-memory database.
    let db_config = DatabaseConfig {
        url: "sqlite://:memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
        auto_migrate: false,
        ..Default::default()
    };
    let pool = create_pool(&db_config).await.unwrap();
    migrations::run_migrations(&pool).await.unwrap();

    let auth_config = AuthConfig {
        access_token_secret: "http-test-access-secret-0123456789-abc".to_string(),
        access_token_ttl_secs: 900,
        refresh_token_secret: "http-test-refresh-secret-0123456789-abc".to_string(),
        refresh_token_ttl_secs: 3600,
    };

    let repository = Arc::new(SqlxAccountRepository::new(pool.clone()));
    let auth_service = AuthService::new(repository, TokenIssuer::new(&auth_config));
    let server = TestServer::new(build_router(ApiState { auth_service })).unwrap();

    (server, pool)
}

async fn account_count(pool: &DbPool) -> i64 {
    let repository: &dyn AccountRepository = &SqlxAccountRepository::new(pool.clone());
    repository.count_accounts().await.unwrap()
}

fn signup_body(email: &str) -> Value {
    json!({
        "email": email,
        "password": "a-long-enough-password",
        "name": "Flow Tester",
    })
}

async fn signup(server: &TestServer, body: &Value) -> Value {
    let response = server.post("/auth/signup").json(body).await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<Value>()
}

async fn login(server: &TestServer, email: &str, password: &str) -> Value {
    let response =
        server.post("/auth/login").json(&json!({ "email": email, "password": password })).await;
    response.assert_status_ok();
    response.json::<Value>()
}

#[tokio::test]
async fn signup_login_me_round_trip() {
    let (server, _pool) = test_app().await;

    let created = signup(
        &server,
        &json!({
            "email": "student@example.com",
            "password": "a-long-enough-password",
            "name": "Sam Student",
            "schoolName": "Riverside High",
            "grade": 11,
        }),
    )
    .await;
    assert_eq!(created["user"]["email"], "student@example.com");
    assert_eq!(created["user"]["role"], "student");
    assert!(created["user"].get("passwordHash").is_none());

    let logged_in = login(&server, "student@example.com", "a-long-enough-password").await;
    let access_token = logged_in["accessToken"].as_str().unwrap();
    let refresh_token = logged_in["refreshToken"].as_str().unwrap();
    assert_ne!(access_token, refresh_token);

    let me = server.get("/auth/me").authorization_bearer(access_token).await;
    me.assert_status_ok();
    let body = me.json::<Value>();
    assert_eq!(body["user"]["email"], "student@example.com");
    assert_eq!(body["user"]["id"], created["user"]["id"]);
}

#[tokio::test]
async fn signup_with_invalid_payload_is_rejected() {
    let (server, pool) = test_app().await;

    let response = server
        .post("/auth/signup")
        .json(&json!({
            "email": "not-an-email",
            "password": "a-long-enough-password",
            "name": "Bad Email",
        }))
        .await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);

    let response = server
        .post("/auth/signup")
        .json(&json!({
            "email": "short-pw@example.com",
            "password": "short",
            "name": "Short Password",
        }))
        .await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);

    assert_eq!(account_count(&pool).await, 0);
}

#[tokio::test]
async fn duplicate_email_conflicts_without_creating_a_row() {
    let (server, pool) = test_app().await;

    signup(&server, &signup_body("dup@example.com")).await;
    assert_eq!(account_count(&pool).await, 1);

    let response = server.post("/auth/signup").json(&signup_body("dup@example.com")).await;
    response.assert_status(axum::http::StatusCode::CONFLICT);
    assert_eq!(account_count(&pool).await, 1);

    // The original credentials still work.
    login(&server, "dup@example.com", "a-long-enough-password").await;
}

#[tokio::test]
async fn failed_logins_are_indistinguishable() {
    let (server, _pool) = test_app().await;
    signup(&server, &signup_body("known@example.com")).await;

    let wrong_password = server
        .post("/auth/login")
        .json(&json!({ "email": "known@example.com", "password": "not-the-password" }))
        .await;
    let unknown_email = server
        .post("/auth/login")
        .json(&json!({ "email": "nobody@example.com", "password": "whatever-value" }))
        .await;

    wrong_password.assert_status(axum::http::StatusCode::UNAUTHORIZED);
    unknown_email.assert_status(axum::http::StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.json::<Value>(), unknown_email.json::<Value>());
}

#[tokio::test]
async fn consultant_approval_gate() {
    let (server, _pool) = test_app().await;

    let consultant = signup(
        &server,
        &json!({
            "email": "consultant@example.com",
            "password": "a-long-enough-password",
            "name": "Casey Consultant",
            "role": "consultant",
        }),
    )
    .await;
    assert_eq!(consultant["user"]["approvalState"], "pending");
    assert!(consultant["message"].as_str().unwrap().contains("approve"));
    let consultant_id = consultant["user"]["id"].as_str().unwrap().to_string();

    // Pending consultants are turned away at login with a 403, not a 401.
    let rejected = server
        .post("/auth/login")
        .json(&json!({
            "email": "consultant@example.com",
            "password": "a-long-enough-password",
        }))
        .await;
    rejected.assert_status(axum::http::StatusCode::FORBIDDEN);

    signup(
        &server,
        &json!({
            "email": "admin@example.com",
            "password": "a-long-enough-password",
            "name": "Avery Admin",
            "role": "admin",
        }),
    )
    .await;
    let admin = login(&server, "admin@example.com", "a-long-enough-password").await;
    let admin_token = admin["accessToken"].as_str().unwrap();

    let pending = server
        .get("/admin/consultants/pending")
        .authorization_bearer(admin_token)
        .await;
    pending.assert_status_ok();
    let body = pending.json::<Value>();
    assert_eq!(body["consultants"].as_array().unwrap().len(), 1);

    let approved = server
        .patch(&format!("/admin/consultants/{}/approval", consultant_id))
        .authorization_bearer(admin_token)
        .json(&json!({ "state": "approved" }))
        .await;
    approved.assert_status_ok();
    assert_eq!(approved.json::<Value>()["user"]["approvalState"], "approved");

    login(&server, "consultant@example.com", "a-long-enough-password").await;
}

#[tokio::test]
async fn admin_routes_reject_other_roles() {
    let (server, _pool) = test_app().await;

    signup(&server, &signup_body("student@example.com")).await;
    let student = login(&server, "student@example.com", "a-long-enough-password").await;
    let student_token = student["accessToken"].as_str().unwrap();

    let response = server
        .get("/admin/consultants/pending")
        .authorization_bearer(student_token)
        .await;
    response.assert_status(axum::http::StatusCode::FORBIDDEN);

    // Unauthenticated requests fail earlier with a 401.
    let response = server.get("/admin/consultants/pending").await;
    response.assert_status(axum::http::StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_rotation_invalidates_the_previous_token() {
    let (server, _pool) = test_app().await;

    signup(&server, &signup_body("rotate@example.com")).await;
    let logged_in = login(&server, "rotate@example.com", "a-long-enough-password").await;
    let first_refresh = logged_in["refreshToken"].as_str().unwrap();

    let rotated = server.post("/auth/refresh").authorization_bearer(first_refresh).await;
    rotated.assert_status_ok();
    let rotated_body = rotated.json::<Value>();
    let second_refresh = rotated_body["refreshToken"].as_str().unwrap();
    assert_ne!(first_refresh, second_refresh);

    // The first token was rotated out; replaying it fails.
    let replayed = server.post("/auth/refresh").authorization_bearer(first_refresh).await;
    replayed.assert_status(axum::http::StatusCode::UNAUTHORIZED);

    let again = server.post("/auth/refresh").authorization_bearer(second_refresh).await;
    again.assert_status_ok();
}

#[tokio::test]
async fn tokens_are_scoped_to_their_endpoint() {
    let (server, _pool) = test_app().await;

    signup(&server, &signup_body("scoped@example.com")).await;
    let logged_in = login(&server, "scoped@example.com", "a-long-enough-password").await;
    let access_token = logged_in["accessToken"].as_str().unwrap();
    let refresh_token = logged_in["refreshToken"].as_str().unwrap();

    // An access token is signed with the wrong secret for the refresh
    // endpoint, and vice versa.
    let response = server.post("/auth/refresh").authorization_bearer(access_token).await;
    response.assert_status(axum::http::StatusCode::UNAUTHORIZED);

    let response = server.get("/auth/me").authorization_bearer(refresh_token).await;
    response.assert_status(axum::http::StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_requires_a_valid_bearer_token() {
    let (server, _pool) = test_app().await;

    let response = server.get("/auth/me").await;
    response.assert_status(axum::http::StatusCode::UNAUTHORIZED);

    let response = server.get("/auth/me").authorization_bearer("not-a-jwt").await;
    response.assert_status(axum::http::StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_is_idempotent() {
    let (server, _pool) = test_app().await;

    signup(&server, &signup_body("idem@example.com")).await;
    let logged_in = login(&server, "idem@example.com", "a-long-enough-password").await;
    let access_token = logged_in["accessToken"].as_str().unwrap();

    let first = server.get("/auth/me").authorization_bearer(access_token).await;
    let second = server.get("/auth/me").authorization_bearer(access_token).await;
    first.assert_status_ok();
    second.assert_status_ok();
    assert_eq!(first.json::<Value>(), second.json::<Value>());
}
