#![allow(dead_code)]

use std::time::Duration;

use actix_cors::Cors;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::middleware::Logger;
use actix_web::{test, web, App, Error};
use serde_json::{json, Value};

use tasklane::auth::{PasswordHasher, TokenCodec};
use tasklane::routes::{self, health};
use tasklane::AppState;

pub const TEST_SECRET: &[u8] = b"integration-test-secret";

/// State backed entirely by in-memory stores, with a cheap bcrypt cost.
pub fn memory_state() -> web::Data<AppState> {
    web::Data::new(AppState::in_memory(
        TokenCodec::new(TEST_SECRET, "tasklane"),
        PasswordHasher::new(4),
        Duration::from_secs(300),
    ))
}

/// The same app the binary serves, minus Postgres and Redis.
pub async fn init_app(
    state: web::Data<AppState>,
) -> impl Service<actix_http::Request, Response = ServiceResponse<impl MessageBody>, Error = Error> {
    let authenticator = state.authenticator.clone();
    test::init_service(
        App::new()
            .app_data(state)
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(health::health)
            .service(web::scope("/v1").configure(routes::config(authenticator))),
    )
    .await
}

/// Registers a user and returns `(token, user_id)`.
pub async fn register<S, B>(app: &S, name: &str, email: &str, password: &str) -> (String, i64)
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/v1/register")
        .set_json(json!({ "name": name, "email": email, "password": password }))
        .to_request();
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(status, 200, "Registration of {} failed. Body: {}", email, body);

    let token = body["token"].as_str().unwrap_or_default().to_string();
    let user_id = body["user"]["id"].as_i64().unwrap_or_default();
    (token, user_id)
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}
