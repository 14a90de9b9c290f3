use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Default inactivity threshold before a warning becomes eligible.
pub const DEFAULT_WARNING_INTERVAL_HOURS: i64 = 48;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub emergency_email: String,
    pub warning_interval_hours: i64,
    pub created_at: DateTime<Utc>,
    pub last_checkin: Option<DateTime<Utc>>,
    pub last_warning_sent: Option<DateTime<Utc>>,
    pub unique_user_token: String,
}

/// Parse a user-supplied warning interval.
///
/// Anything that is not a non-negative integer yields `default`.
pub fn parse_warning_interval(raw: &str, default: i64) -> i64 {
    match raw.trim().parse::<i64>() {
        Ok(hours) if hours >= 0 => hours,
        _ => default,
    }
}
