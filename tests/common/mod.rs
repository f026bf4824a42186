#![allow(dead_code)]

use actix_http::Request;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{test, web, App};
use serde_json::{json, Value};
use sqlx::SqlitePool;

use videoflow_backend::config::Config;
use videoflow_backend::models::RegisterRequest;
use videoflow_backend::{handlers, services, AppState};

pub const TEST_SECRET: &str = "integration-test-secret";

pub fn test_config() -> Config {
    Config {
        jwt_secret: TEST_SECRET.to_string(),
        bcrypt_cost: 4,
        ..Config::default()
    }
}

pub async fn setup_test_app() -> (
    impl Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
    SqlitePool,
) {
    let db_pool = services::init_memory_pool().await.unwrap();
    let app_state = web::Data::new(AppState {
        db_pool: db_pool.clone(),
        config: test_config(),
    });

    let app = test::init_service(
        App::new()
            .app_data(app_state)
            .configure(handlers::configure_routes),
    )
    .await;

    (app, db_pool)
}

pub async fn read_json(resp: ServiceResponse) -> Value {
    let body = test::read_body(resp).await;
    serde_json::from_slice(&body).unwrap()
}

/// Registers `name` and returns the new user's id and bearer token.
pub async fn register_user<S>(app: &S, name: &str) -> (i64, String)
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(&RegisterRequest {
            email: format!("{}@example.com", name),
            username: name.to_string(),
            password: "password123".to_string(),
        })
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status().as_u16(), 201);

    let json = read_json(resp).await;
    let user_id = json["user"]["id"].as_i64().unwrap();
    let token = json["access_token"].as_str().unwrap().to_string();
    (user_id, token)
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

/// Creates a video from `body` and returns the stored record.
pub async fn create_video<S>(app: &S, token: &str, body: Value) -> Value
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let req = test::TestRequest::post()
        .uri("/api/videos")
        .insert_header(bearer(token))
        .set_json(&body)
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status().as_u16(), 201);
    read_json(resp).await
}

pub async fn create_titled<S>(app: &S, token: &str, title: &str, status: &str) -> i64
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let video = create_video(app, token, json!({ "title": title, "status": status })).await;
    video["id"].as_i64().unwrap()
}

pub async fn get_json<S>(app: &S, token: &str, uri: &str) -> (u16, Value)
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let req = test::TestRequest::get()
        .uri(uri)
        .insert_header(bearer(token))
        .to_request();
    let resp = test::call_service(app, req).await;
    let status = resp.status().as_u16();
    (status, read_json(resp).await)
}

pub async fn post_json<S>(app: &S, token: &str, uri: &str, body: Value) -> (u16, Value)
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let req = test::TestRequest::post()
        .uri(uri)
        .insert_header(bearer(token))
        .set_json(&body)
        .to_request();
    let resp = test::call_service(app, req).await;
    let status = resp.status().as_u16();
    (status, read_json(resp).await)
}

pub async fn video_count(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM videos")
        .fetch_one(pool)
        .await
        .unwrap()
}
