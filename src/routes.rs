use crate::{handlers, AppState};
use axum::{
    body::Body,
    http::{HeaderValue, Request},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index_handler))
        .route("/register", post(handlers::register_handler))
        .route("/health", get(handlers::health_handler))
        .route("/u/{token}", get(handlers::user_page_handler))
        .route("/u/{token}/checkin", post(handlers::checkin_handler))
        .route("/u/{token}/interval", post(handlers::update_interval_handler))
        .layer(middleware::from_fn(add_security_headers))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn add_security_headers(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    headers.insert(
        "X-Content-Type-Options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        "Content-Security-Policy",
        HeaderValue::from_static(
            "default-src 'self'; style-src 'self' 'unsafe-inline'; frame-ancestors 'none';",
        ),
    );
    // Personal links carry the access token in the path
    headers.insert("Referrer-Policy", HeaderValue::from_static("no-referrer"));

    response
}
