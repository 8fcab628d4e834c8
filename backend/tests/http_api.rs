//! End-to-end HTTP tests over the in-memory repository.
//!
//! Exercises the full request pipeline: tracing middleware, bearer gate,
//! JSON extraction errors and the status mapping of repository outcomes.

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{App, test as actix_test, web};
use chrono::Duration;
use rstest::{fixture, rstest};
use serde_json::{Value, json};
use students::Trace;
use students::domain::TRACE_ID_HEADER;
use students::inbound::http::auth::TokenAuthority;
use students::inbound::http::error::json_error_handler;
use students::inbound::http::state::HttpState;
use students::inbound::http::students::configure;
use students::test_support::InMemoryStudentRepository;

const SECRET: &str = "integration-secret";

#[fixture]
fn state() -> web::Data<HttpState> {
    web::Data::new(HttpState::from_repository(
        Arc::new(InMemoryStudentRepository::default()),
        TokenAuthority::new(SECRET),
    ))
}

fn bearer(secret: &str, ttl: Duration) -> String {
    let token = TokenAuthority::new(secret)
        .issue("1", "ada@example.com", "Ada", ttl)
        .expect("issue token");
    format!("Bearer {token}")
}

fn app(
    state: web::Data<HttpState>,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(state)
        .app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .wrap(Trace)
        .configure(configure)
}

async fn json_body(response: actix_web::dev::ServiceResponse) -> Value {
    let body = actix_test::read_body(response).await;
    serde_json::from_slice(&body).expect("json body")
}

#[rstest]
#[actix_web::test]
async fn student_lifecycle_over_http(state: web::Data<HttpState>) {
    let app = actix_test::init_service(app(state)).await;
    let auth = bearer(SECRET, Duration::hours(1));

    let create = actix_test::TestRequest::post()
        .uri("/students")
        .set_json(json!({
            "rollno": "12345",
            "name": "John Doe",
            "class": "10",
            "password": "hunter2",
            "optional_subjects": ["Math", "History"]
        }))
        .to_request();
    let response = actix_test::call_service(&app, create).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert!(response.headers().contains_key(TRACE_ID_HEADER));
    let created = json_body(response).await;
    let id = created["id"].as_str().expect("string id").to_owned();
    assert!(created.get("password").is_none());

    let get = actix_test::TestRequest::get()
        .uri(&format!("/students/{id}"))
        .insert_header((AUTHORIZATION, auth.clone()))
        .to_request();
    let response = actix_test::call_service(&app, get).await;
    assert_eq!(response.status(), StatusCode::OK);
    let fetched = json_body(response).await;
    assert_eq!(fetched["optional_subjects"], json!(["Math", "History"]));

    let update = actix_test::TestRequest::put()
        .uri("/students")
        .insert_header((AUTHORIZATION, auth.clone()))
        .set_json(json!({ "id": id, "rollno": "12345", "name": "Jane Doe", "class": "10" }))
        .to_request();
    let response = actix_test::call_service(&app, update).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["name"], "Jane Doe");

    let list = actix_test::TestRequest::get()
        .uri("/students")
        .insert_header((AUTHORIZATION, auth.clone()))
        .to_request();
    let listed = json_body(actix_test::call_service(&app, list).await).await;
    assert_eq!(listed.as_array().map(Vec::len), Some(1));
    assert_eq!(listed[0]["name"], "Jane Doe");

    let delete = actix_test::TestRequest::delete()
        .uri(&format!("/students/{id}"))
        .insert_header((AUTHORIZATION, auth.clone()))
        .to_request();
    let response = actix_test::call_service(&app, delete).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let gone = actix_test::TestRequest::get()
        .uri(&format!("/students/{id}"))
        .insert_header((AUTHORIZATION, auth))
        .to_request();
    let response = actix_test::call_service(&app, gone).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["code"], "not_found");
}

#[rstest]
#[case(bearer("wrong-secret", Duration::hours(1)))]
#[case(bearer(SECRET, Duration::seconds(-30)))]
#[case("Bearer not.a.token".to_owned())]
#[actix_web::test]
async fn invalid_tokens_are_unauthorised(state: web::Data<HttpState>, #[case] auth: String) {
    let app = actix_test::init_service(app(state)).await;
    let request = actix_test::TestRequest::get()
        .uri("/students")
        .insert_header((AUTHORIZATION, auth))
        .to_request();
    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[rstest]
#[actix_web::test]
async fn malformed_ids_are_bad_requests(state: web::Data<HttpState>) {
    let app = actix_test::init_service(app(state)).await;
    let request = actix_test::TestRequest::delete()
        .uri("/students/abc")
        .insert_header((AUTHORIZATION, bearer(SECRET, Duration::hours(1))))
        .to_request();
    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["code"], "invalid_request");
}

#[rstest]
#[actix_web::test]
async fn missing_roll_numbers_are_internal_errors(state: web::Data<HttpState>) {
    let app = actix_test::init_service(app(state)).await;
    let request = actix_test::TestRequest::post()
        .uri("/students")
        .set_json(json!({ "name": "Nobody" }))
        .to_request();
    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let trace_id = response
        .headers()
        .get(TRACE_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
        .expect("trace id header");
    let body = json_body(response).await;
    assert_eq!(body["message"], "Internal server error");
    assert_eq!(body["traceId"], trace_id);
}

#[rstest]
#[actix_web::test]
async fn update_without_id_is_an_internal_error(state: web::Data<HttpState>) {
    let app = actix_test::init_service(app(state)).await;
    let request = actix_test::TestRequest::put()
        .uri("/students")
        .insert_header((AUTHORIZATION, bearer(SECRET, Duration::hours(1))))
        .set_json(json!({ "name": "Nobody" }))
        .to_request();
    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
