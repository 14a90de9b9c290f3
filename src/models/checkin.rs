use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One entry of a user's append-only check-in log.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CheckIn {
    pub id: i64,
    pub user_id: i64,
    pub checkin_time: DateTime<Utc>,
}
