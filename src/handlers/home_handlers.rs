use crate::error::AppError;
use crate::services::user_service::RegisterUserRequest;
use crate::AppState;
use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;

#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
struct IndexTemplate {
    error_message: String,
    name: String,
    emergency_email: String,
    warning_interval_hours: String,
    default_interval_hours: i64,
}

#[derive(Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub emergency_email: String,
    pub warning_interval_hours: Option<String>,
}

/// GET / - Landing page with the registration form
pub async fn index_handler(State(state): State<AppState>) -> impl IntoResponse {
    IndexTemplate {
        error_message: String::new(),
        name: String::new(),
        emergency_email: String::new(),
        warning_interval_hours: String::new(),
        default_interval_hours: state.user_service.default_interval_hours(),
    }
}

/// POST /register - Create a user and send them to their personal page
pub async fn register_handler(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> Response {
    let request = RegisterUserRequest {
        name: form.name.clone(),
        emergency_email: form.emergency_email.clone(),
        warning_interval_hours: form
            .warning_interval_hours
            .clone()
            .filter(|raw| !raw.trim().is_empty()),
    };

    match state.user_service.register_user(request).await {
        Ok(user) => Redirect::to(&format!("/u/{}", user.unique_user_token)).into_response(),
        Err(e) => match AppError::from(e) {
            AppError::Validation(message) => {
                let template = IndexTemplate {
                    error_message: message,
                    name: form.name,
                    emergency_email: form.emergency_email,
                    warning_interval_hours: form.warning_interval_hours.unwrap_or_default(),
                    default_interval_hours: state.user_service.default_interval_hours(),
                };
                (StatusCode::BAD_REQUEST, template).into_response()
            }
            other => other.into_response(),
        },
    }
}

/// GET /health - Liveness check that also touches the database
pub async fn health_handler(State(state): State<AppState>) -> Result<&'static str, AppError> {
    sqlx::query("SELECT 1").execute(&state.pool).await?;
    Ok("ok")
}
