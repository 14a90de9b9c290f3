use crate::models::user::User;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Record not found")]
    NotFound,
    #[error("Record already exists")]
    AlreadyExists,
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

const USER_COLUMNS: &str = r#"
    id,
    name,
    emergency_email,
    warning_interval_hours,
    created_at,
    last_checkin,
    last_warning_sent,
    unique_user_token
"#;

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait UserRepository: Send + Sync {
    async fn create_user(
        &self,
        name: &str,
        emergency_email: &str,
        warning_interval_hours: i64,
        token: &str,
        created_at: DateTime<Utc>,
    ) -> RepositoryResult<User>;
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<User>>;
    async fn find_by_token(&self, token: &str) -> RepositoryResult<Option<User>>;
    async fn list_all_users(&self) -> RepositoryResult<Vec<User>>;
    async fn update_warning_interval(&self, id: i64, hours: i64) -> RepositoryResult<()>;
    async fn update_last_warning_sent(
        &self,
        id: i64,
        sent_at: DateTime<Utc>,
    ) -> RepositoryResult<()>;
}

pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn create_user(
        &self,
        name: &str,
        emergency_email: &str,
        warning_interval_hours: i64,
        token: &str,
        created_at: DateTime<Utc>,
    ) -> RepositoryResult<User> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (name, emergency_email, warning_interval_hours, created_at, unique_user_token)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(name)
        .bind(emergency_email)
        .bind(warning_interval_hours)
        .bind(created_at)
        .bind(token)
        .execute(&self.pool)
        .await;

        match result {
            Ok(res) => {
                let id = res.last_insert_rowid();
                self.find_by_id(id).await?.ok_or(RepositoryError::NotFound)
            }
            Err(e) => {
                if e.to_string().contains("UNIQUE") {
                    Err(RepositoryError::AlreadyExists)
                } else {
                    Err(RepositoryError::Database(e))
                }
            }
        }
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = ?",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_token(&self, token: &str) -> RepositoryResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE unique_user_token = ?",
            USER_COLUMNS
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn list_all_users(&self) -> RepositoryResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users ORDER BY id",
            USER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn update_warning_interval(&self, id: i64, hours: i64) -> RepositoryResult<()> {
        let result = sqlx::query("UPDATE users SET warning_interval_hours = ? WHERE id = ?")
            .bind(hours)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn update_last_warning_sent(
        &self,
        id: i64,
        sent_at: DateTime<Utc>,
    ) -> RepositoryResult<()> {
        let result = sqlx::query("UPDATE users SET last_warning_sent = ? WHERE id = ?")
            .bind(sent_at)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_pool;
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_duplicate_token_is_rejected() {
        let repo = SqliteUserRepository::new(create_test_pool().await);
        let created_at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();

        repo.create_user("Alice", "a@example.com", 48, "same-token", created_at)
            .await
            .expect("first insert succeeds");

        let result = repo
            .create_user("Bob", "b@example.com", 48, "same-token", created_at)
            .await;
        assert!(matches!(result, Err(RepositoryError::AlreadyExists)));
    }

    #[tokio::test]
    async fn test_update_last_warning_sent_round_trips() {
        let repo = SqliteUserRepository::new(create_test_pool().await);
        let created_at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let user = repo
            .create_user("Alice", "a@example.com", 48, "token-a", created_at)
            .await
            .expect("insert succeeds");
        assert_eq!(user.created_at, created_at);

        let sent_at = Utc.with_ymd_and_hms(2025, 1, 3, 6, 15, 0).unwrap();
        repo.update_last_warning_sent(user.id, sent_at)
            .await
            .expect("update succeeds");

        let stored = repo
            .find_by_token("token-a")
            .await
            .expect("query succeeds")
            .expect("user exists");
        assert_eq!(stored.last_warning_sent, Some(sent_at));
    }

    #[tokio::test]
    async fn test_updates_on_missing_user_are_not_found() {
        let repo = SqliteUserRepository::new(create_test_pool().await);

        assert!(matches!(
            repo.update_last_warning_sent(404, Utc::now()).await,
            Err(RepositoryError::NotFound)
        ));
        assert!(matches!(
            repo.update_warning_interval(404, 12).await,
            Err(RepositoryError::NotFound)
        ));
    }
}
