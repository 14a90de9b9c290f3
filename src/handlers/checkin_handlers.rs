use crate::error::{AppError, Result};
use crate::models::User;
use crate::services::checkin_service::RECENT_CHECKINS_LIMIT;
use crate::AppState;
use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect},
    Form,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Template, WebTemplate)]
#[template(path = "user.html")]
struct UserTemplate {
    name: String,
    emergency_email: String,
    warning_interval_hours: i64,
    last_checkin: String,
    last_warning_sent: String,
    checkin_url: String,
    token: String,
    recent_checkins: Vec<String>,
    success_message: String,
}

#[derive(Deserialize)]
pub struct UserPageQuery {
    checked_in: Option<String>,
    updated: Option<String>,
}

#[derive(Deserialize)]
pub struct IntervalForm {
    #[serde(default)]
    pub warning_interval_hours: String,
}

fn format_timestamp(ts: Option<DateTime<Utc>>, empty: &str) -> String {
    ts.map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| empty.to_string())
}

async fn load_user(state: &AppState, token: &str) -> Result<User> {
    state
        .user_service
        .find_user_by_token(token)
        .await?
        .ok_or(AppError::UserNotFound)
}

/// GET /u/{token} - Personal check-in page
pub async fn user_page_handler(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Query(query): Query<UserPageQuery>,
) -> Result<impl IntoResponse> {
    let user = load_user(&state, &token).await?;

    let recent_checkins = state
        .checkin_service
        .recent_checkins(user.id, RECENT_CHECKINS_LIMIT)
        .await?
        .into_iter()
        .map(|c| format_timestamp(Some(c.checkin_time), ""))
        .collect();

    let success_message = if query.checked_in.is_some() {
        "Check-in recorded. Thanks for letting us know you're OK.".to_string()
    } else if query.updated.is_some() {
        "Warning interval updated.".to_string()
    } else {
        String::new()
    };

    Ok(UserTemplate {
        checkin_url: state.config.checkin_url(&user.unique_user_token),
        name: user.name,
        emergency_email: user.emergency_email,
        warning_interval_hours: user.warning_interval_hours,
        last_checkin: format_timestamp(user.last_checkin, "Never"),
        last_warning_sent: format_timestamp(user.last_warning_sent, "Never"),
        token: user.unique_user_token,
        recent_checkins,
        success_message,
    })
}

/// POST /u/{token}/checkin - Record a check-in
pub async fn checkin_handler(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Redirect> {
    let user = load_user(&state, &token).await?;
    state.checkin_service.check_in(user.id).await?;

    Ok(Redirect::to(&format!("/u/{}?checked_in=1", token)))
}

/// POST /u/{token}/interval - Change the warning interval
pub async fn update_interval_handler(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Form(form): Form<IntervalForm>,
) -> Result<Redirect> {
    let user = load_user(&state, &token).await?;
    let hours = state
        .user_service
        .update_warning_interval(user.id, &form.warning_interval_hours)
        .await?;
    tracing::info!(user_id = user.id, hours, "Warning interval updated");

    Ok(Redirect::to(&format!("/u/{}?updated=1", token)))
}
