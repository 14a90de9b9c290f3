use crate::models::checkin::CheckIn;
use crate::repositories::user_repository::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait CheckInRepository: Send + Sync {
    /// Append a check-in and move the owner's `last_checkin` to `checkin_time`.
    async fn create_checkin(
        &self,
        user_id: i64,
        checkin_time: DateTime<Utc>,
    ) -> RepositoryResult<CheckIn>;
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<CheckIn>>;
    /// Most recent first.
    async fn list_by_user(&self, user_id: i64, limit: i64) -> RepositoryResult<Vec<CheckIn>>;
}

pub struct SqliteCheckInRepository {
    pool: SqlitePool,
}

impl SqliteCheckInRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CheckInRepository for SqliteCheckInRepository {
    async fn create_checkin(
        &self,
        user_id: i64,
        checkin_time: DateTime<Utc>,
    ) -> RepositoryResult<CheckIn> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query("UPDATE users SET last_checkin = ? WHERE id = ?")
            .bind(checkin_time)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        if updated.rows_affected() == 0 {
            // Dropping the transaction rolls it back
            return Err(RepositoryError::NotFound);
        }

        let inserted = sqlx::query("INSERT INTO checkins (user_id, checkin_time) VALUES (?, ?)")
            .bind(user_id)
            .bind(checkin_time)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(CheckIn {
            id: inserted.last_insert_rowid(),
            user_id,
            checkin_time,
        })
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<CheckIn>> {
        let checkin = sqlx::query_as::<_, CheckIn>(
            "SELECT id, user_id, checkin_time FROM checkins WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(checkin)
    }

    async fn list_by_user(&self, user_id: i64, limit: i64) -> RepositoryResult<Vec<CheckIn>> {
        let checkins = sqlx::query_as::<_, CheckIn>(
            r#"
            SELECT id, user_id, checkin_time
            FROM checkins
            WHERE user_id = ?
            ORDER BY checkin_time DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(checkins)
    }
}
