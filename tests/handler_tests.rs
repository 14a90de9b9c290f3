use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{TimeZone, Utc};
use std::sync::Arc;
use tower::ServiceExt;
use webcare::{
    routes::build_router,
    services::{Clock, ManualClock},
    test_utils::test_helpers,
    AppState,
};

async fn app() -> (Router, AppState, Arc<ManualClock>) {
    let pool = test_helpers::create_test_db().await.unwrap();
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2025, 4, 1, 9, 30, 0).unwrap(),
    ));
    let state = test_helpers::create_test_state(pool, clock.clone());
    (build_router(state.clone()), state, clock)
}

fn form_post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .expect("request to build")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request to build")
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body to be readable");
    String::from_utf8(bytes.to_vec()).expect("body to be utf-8")
}

fn location(response: &axum::response::Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .expect("redirect location")
        .to_str()
        .expect("ascii location")
        .to_string()
}

#[tokio::test]
async fn test_index_shows_registration_form() {
    let (app, _, _) = app().await;

    let response = app.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("X-Frame-Options").unwrap(),
        "DENY"
    );

    let html = body_text(response).await;
    assert!(html.contains("action=\"/register\""));
}

#[tokio::test]
async fn test_register_redirects_to_personal_page() {
    let (app, state, _) = app().await;

    let response = app
        .clone()
        .oneshot(form_post(
            "/register",
            "name=Alice&emergency_email=contact%40example.com&warning_interval_hours=12",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let target = location(&response);
    let token = target.strip_prefix("/u/").expect("personal link");
    let user = state
        .user_service
        .find_user_by_token(token)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.name, "Alice");
    assert_eq!(user.warning_interval_hours, 12);

    let page = app.oneshot(get(&target)).await.unwrap();
    assert_eq!(page.status(), StatusCode::OK);
    let html = body_text(page).await;
    assert!(html.contains("Hi Alice"));
    assert!(html.contains(&format!("http://localhost:5000/u/{}", token)));
    assert!(html.contains("Never"));
}

#[tokio::test]
async fn test_register_rejects_invalid_email() {
    let (app, state, _) = app().await;

    let response = app
        .oneshot(form_post("/register", "name=Alice&emergency_email=nope"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let html = body_text(response).await;
    assert!(html.contains("Invalid email address"));
    assert!(html.contains("value=\"Alice\""));

    assert!(state.user_service.list_users().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_register_blank_interval_uses_default() {
    let (app, state, _) = app().await;

    let response = app
        .oneshot(form_post(
            "/register",
            "name=Bob&emergency_email=bob%40example.com&warning_interval_hours=",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let users = state.user_service.list_users().await.unwrap();
    assert_eq!(users[0].warning_interval_hours, 48);
}

#[tokio::test]
async fn test_unknown_token_is_not_found() {
    let (app, _, _) = app().await;

    let response = app.clone().oneshot(get("/u/does-not-exist")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(form_post("/u/does-not-exist/checkin", ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_checkin_records_and_redirects() {
    let (app, state, clock) = app().await;
    let (id, token) = test_helpers::insert_test_user(
        &state.pool,
        "Carol",
        "carol@example.com",
        48,
        None,
        None,
    )
    .await
    .unwrap();

    let response = app
        .clone()
        .oneshot(form_post(&format!("/u/{}/checkin", token), ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/u/{}?checked_in=1", token));

    let user = state.user_service.find_user_by_id(id).await.unwrap().unwrap();
    assert_eq!(user.last_checkin, Some(clock.now()));

    let page = app
        .oneshot(get(&format!("/u/{}?checked_in=1", token)))
        .await
        .unwrap();
    let html = body_text(page).await;
    assert!(html.contains("Check-in recorded"));
    assert!(html.contains("2025-04-01 09:30 UTC"));
}

#[tokio::test]
async fn test_update_interval_falls_back_on_garbage() {
    let (app, state, _) = app().await;
    let (id, token) = test_helpers::insert_test_user(
        &state.pool,
        "Dave",
        "dave@example.com",
        12,
        None,
        None,
    )
    .await
    .unwrap();

    let response = app
        .clone()
        .oneshot(form_post(
            &format!("/u/{}/interval", token),
            "warning_interval_hours=24",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let user = state.user_service.find_user_by_id(id).await.unwrap().unwrap();
    assert_eq!(user.warning_interval_hours, 24);

    let response = app
        .oneshot(form_post(
            &format!("/u/{}/interval", token),
            "warning_interval_hours=soon",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let user = state.user_service.find_user_by_id(id).await.unwrap().unwrap();
    assert_eq!(user.warning_interval_hours, 48);
}

#[tokio::test]
async fn test_health() {
    let (app, _, _) = app().await;

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");
}
