pub mod test_helpers {
    use crate::config::AppConfig;
    use crate::repositories::{SqliteCheckInRepository, SqliteUserRepository};
    use crate::services::clock::Clock;
    use crate::services::email_service::{EmailError, EmailService};
    use crate::services::{CheckInService, UserService};
    use crate::AppState;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tempfile::NamedTempFile;

    /// Create a new in-memory SQLite database for testing
    pub async fn create_test_db() -> Result<SqlitePool, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await?;

        // Run migrations
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(pool)
    }

    /// Create a temporary file-based SQLite database for testing
    /// Useful when you need to test features that don't work with in-memory databases
    pub async fn create_test_db_file() -> Result<(SqlitePool, NamedTempFile), sqlx::Error> {
        let temp_file = NamedTempFile::new().map_err(sqlx::Error::Io)?;
        let db_path = temp_file
            .path()
            .to_str()
            .ok_or_else(|| sqlx::Error::Configuration("Invalid database path".into()))?;
        let database_url = format!("sqlite://{}", db_path);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(&database_url)
            .await?;

        // Run migrations
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok((pool, temp_file))
    }

    /// Insert a user row directly, bypassing validation
    pub async fn insert_test_user(
        pool: &SqlitePool,
        name: &str,
        emergency_email: &str,
        warning_interval_hours: i64,
        last_checkin: Option<DateTime<Utc>>,
        last_warning_sent: Option<DateTime<Utc>>,
    ) -> Result<(i64, String), sqlx::Error> {
        let token = format!("test-token-{}-{}", name, Utc::now().timestamp_nanos_opt().unwrap_or(0));
        let result = sqlx::query(
            r#"
            INSERT INTO users (name, emergency_email, warning_interval_hours, created_at,
                               last_checkin, last_warning_sent, unique_user_token)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(name)
        .bind(emergency_email)
        .bind(warning_interval_hours)
        .bind(Utc::now())
        .bind(last_checkin)
        .bind(last_warning_sent)
        .bind(&token)
        .execute(pool)
        .await?;

        Ok((result.last_insert_rowid(), token))
    }

    /// Config suitable for tests; nothing is read from the environment.
    pub fn test_config() -> AppConfig {
        AppConfig {
            database_url: ":memory:".to_string(),
            bind_addr: ([127, 0, 0, 1], 0).into(),
            base_url: "http://localhost:5000".to_string(),
            default_warning_interval_hours: 48,
            sweep_interval: Duration::from_secs(60),
        }
    }

    /// Wire the real services over `pool` with the given clock
    pub fn create_test_state(pool: SqlitePool, clock: Arc<dyn Clock>) -> AppState {
        let config = test_config();
        let user_repository = Arc::new(SqliteUserRepository::new(pool.clone()));
        let checkin_repository = Arc::new(SqliteCheckInRepository::new(pool.clone()));

        AppState {
            user_service: Arc::new(UserService::new(
                user_repository,
                clock.clone(),
                config.default_warning_interval_hours,
            )),
            checkin_service: Arc::new(CheckInService::new(checkin_repository, clock)),
            config: Arc::new(config),
            pool,
        }
    }

    /// Notifier that records every attempt and can be told to fail.
    #[derive(Default)]
    pub struct RecordingEmailService {
        sent: Mutex<Vec<(String, String)>>,
        attempts: AtomicUsize,
        fail_all: AtomicBool,
        fail_for: Mutex<HashSet<String>>,
    }

    impl RecordingEmailService {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing() -> Self {
            let service = Self::default();
            service.set_failing(true);
            service
        }

        pub fn set_failing(&self, failing: bool) {
            self.fail_all.store(failing, Ordering::SeqCst);
        }

        /// Fail only sends addressed to `email`.
        pub fn fail_for(&self, email: &str) {
            self.fail_for
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .insert(email.to_string());
        }

        /// Successful sends as `(to_email, user_name)`.
        pub fn sent(&self) -> Vec<(String, String)> {
            self.sent
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .clone()
        }

        pub fn attempts(&self) -> usize {
            self.attempts.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl EmailService for RecordingEmailService {
        async fn send_warning_email(
            &self,
            to_email: &str,
            user_name: &str,
        ) -> Result<(), EmailError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);

            let targeted = self
                .fail_for
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .contains(to_email);
            if targeted || self.fail_all.load(Ordering::SeqCst) {
                return Err(EmailError::SendFailed("simulated transport failure".to_string()));
            }

            self.sent
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .push((to_email.to_string(), user_name.to_string()));
            Ok(())
        }
    }
}

// Re-export commonly used test functions at module level for convenience
// Note: This is test-only code. Panic on error is acceptable in tests.
#[cfg(test)]
pub async fn create_test_pool() -> sqlx::SqlitePool {
    match test_helpers::create_test_db().await {
        Ok(pool) => pool,
        Err(e) => panic!("Failed to create test pool: {}", e),
    }
}
