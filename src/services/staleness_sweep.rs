//! Periodic staleness evaluation.
//!
//! Every sweep walks all users, decides per user whether a warning is due
//! and, when it is, notifies the emergency contact and persists the send
//! time. Users are processed independently: a failure for one is logged
//! and counted, never propagated.

use crate::models::user::User;
use crate::repositories::user_repository::{RepositoryError, UserRepository};
use crate::services::clock::Clock;
use crate::services::email_service::EmailService;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// Minimum spacing between two warnings for the same user.
///
/// Fixed, not derived from the user's warning interval.
pub const WARNING_COOLDOWN_HOURS: i64 = 24;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepDecision {
    /// No check-in on record; never warned.
    NeverCheckedIn,
    NotStale,
    /// Stale, but a warning went out less than 24 hours ago.
    CoolingDown,
    Notify,
}

#[derive(Debug, thiserror::Error)]
pub enum SweepError {
    #[error("Failed to list users: {0}")]
    ListUsers(#[from] RepositoryError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub evaluated: usize,
    pub notified: usize,
    pub never_checked_in: usize,
    pub not_stale: usize,
    pub cooling_down: usize,
    pub failed: usize,
}

/// Hours elapsed since the user's last check-in, if there is one.
pub fn hours_since_checkin(user: &User, now: DateTime<Utc>) -> Option<f64> {
    user.last_checkin
        .map(|last| (now - last).num_milliseconds() as f64 / MILLIS_PER_HOUR)
}

/// Decide what the sweep should do for `user` at `now`.
pub fn evaluate(user: &User, now: DateTime<Utc>) -> SweepDecision {
    let Some(hours) = hours_since_checkin(user, now) else {
        return SweepDecision::NeverCheckedIn;
    };

    if hours < user.warning_interval_hours as f64 {
        return SweepDecision::NotStale;
    }

    match user.last_warning_sent {
        Some(sent) if now - sent < Duration::hours(WARNING_COOLDOWN_HOURS) => {
            SweepDecision::CoolingDown
        }
        _ => SweepDecision::Notify,
    }
}

pub struct StalenessSweep {
    repository: Arc<dyn UserRepository>,
    notifier: Arc<dyn EmailService>,
    clock: Arc<dyn Clock>,
}

impl StalenessSweep {
    pub fn new(
        repository: Arc<dyn UserRepository>,
        notifier: Arc<dyn EmailService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            notifier,
            clock,
        }
    }

    /// Run one sweep over every user.
    ///
    /// `now` is read once so every user in the sweep is judged against the
    /// same instant, and that instant is what gets persisted on success.
    pub async fn run_once(&self) -> Result<SweepReport, SweepError> {
        let now = self.clock.now();
        let users = self.repository.list_all_users().await?;

        let mut report = SweepReport::default();
        for user in &users {
            report.evaluated += 1;
            match evaluate(user, now) {
                SweepDecision::NeverCheckedIn => report.never_checked_in += 1,
                SweepDecision::NotStale => report.not_stale += 1,
                SweepDecision::CoolingDown => {
                    tracing::debug!(user_id = user.id, "Stale but within warning cooldown");
                    report.cooling_down += 1;
                }
                SweepDecision::Notify => {
                    if self.notify(user, now).await {
                        report.notified += 1;
                    } else {
                        report.failed += 1;
                    }
                }
            }
        }

        Ok(report)
    }

    async fn notify(&self, user: &User, now: DateTime<Utc>) -> bool {
        let hours = hours_since_checkin(user, now).unwrap_or_default();
        tracing::info!(
            user_id = user.id,
            hours_since_checkin = hours,
            interval_hours = user.warning_interval_hours,
            "User is stale, sending warning"
        );

        if let Err(e) = self
            .notifier
            .send_warning_email(&user.emergency_email, &user.name)
            .await
        {
            // Leaving last_warning_sent untouched makes the next sweep retry
            tracing::warn!(user_id = user.id, "Failed to send warning email: {}", e);
            return false;
        }

        match self.repository.update_last_warning_sent(user.id, now).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(
                    user_id = user.id,
                    "Warning sent but failed to record send time: {}",
                    e
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::user_repository::MockUserRepository;
    use crate::services::clock::ManualClock;
    use crate::test_utils::test_helpers::RecordingEmailService;
    use chrono::TimeZone;
    use mockall::predicate::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn user(
        id: i64,
        interval: i64,
        checkin_hours_ago: Option<i64>,
        warned_hours_ago: Option<i64>,
    ) -> User {
        User {
            id,
            name: format!("user{}", id),
            emergency_email: format!("contact{}@example.com", id),
            warning_interval_hours: interval,
            created_at: now() - Duration::days(30),
            last_checkin: checkin_hours_ago.map(|h| now() - Duration::hours(h)),
            last_warning_sent: warned_hours_ago.map(|h| now() - Duration::hours(h)),
            unique_user_token: format!("token{}", id),
        }
    }

    #[test]
    fn test_never_checked_in_is_never_warned() {
        for interval in [0, 1, 48, 10_000] {
            assert_eq!(
                evaluate(&user(1, interval, None, None), now()),
                SweepDecision::NeverCheckedIn
            );
        }
    }

    #[test]
    fn test_not_stale_before_interval() {
        assert_eq!(
            evaluate(&user(1, 10, Some(5), None), now()),
            SweepDecision::NotStale
        );
        assert_eq!(
            evaluate(&user(1, 48, Some(47), Some(1000)), now()),
            SweepDecision::NotStale
        );
    }

    #[test]
    fn test_stale_at_exact_interval() {
        assert_eq!(
            evaluate(&user(1, 48, Some(48), None), now()),
            SweepDecision::Notify
        );
    }

    #[test]
    fn test_fractional_hours_are_not_rounded() {
        let mut u = user(1, 48, None, None);
        u.last_checkin = Some(now() - Duration::hours(48) + Duration::minutes(1));
        assert_eq!(evaluate(&u, now()), SweepDecision::NotStale);
    }

    #[test]
    fn test_cooldown_window() {
        assert_eq!(
            evaluate(&user(1, 48, Some(100), Some(23)), now()),
            SweepDecision::CoolingDown
        );
        assert_eq!(
            evaluate(&user(1, 48, Some(100), Some(24)), now()),
            SweepDecision::Notify
        );
        assert_eq!(
            evaluate(&user(1, 48, Some(100), Some(25)), now()),
            SweepDecision::Notify
        );
    }

    #[test]
    fn test_cooldown_is_independent_of_interval() {
        // A one-hour interval still waits a full day between warnings
        assert_eq!(
            evaluate(&user(1, 1, Some(5), Some(2)), now()),
            SweepDecision::CoolingDown
        );
    }

    #[test]
    fn test_future_checkin_is_not_stale() {
        let mut u = user(1, 0, None, None);
        u.last_checkin = Some(now() + Duration::minutes(5));
        assert_eq!(evaluate(&u, now()), SweepDecision::NotStale);
    }

    #[tokio::test]
    async fn test_run_once_notifies_and_records() {
        let mut mock_repo = MockUserRepository::new();
        let users = vec![
            user(1, 48, Some(50), None),
            user(2, 10, Some(5), None),
            user(3, 48, None, None),
        ];
        mock_repo
            .expect_list_all_users()
            .times(1)
            .returning(move || {
                let users = users.clone();
                Box::pin(async move { Ok(users) })
            });
        mock_repo
            .expect_update_last_warning_sent()
            .with(eq(1), eq(now()))
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(()) }));

        let notifier = Arc::new(RecordingEmailService::new());
        let sweep = StalenessSweep::new(
            Arc::new(mock_repo),
            notifier.clone(),
            Arc::new(ManualClock::new(now())),
        );

        let report = sweep.run_once().await.expect("sweep should succeed");

        assert_eq!(report.evaluated, 3);
        assert_eq!(report.notified, 1);
        assert_eq!(report.not_stale, 1);
        assert_eq!(report.never_checked_in, 1);
        assert_eq!(
            notifier.sent(),
            vec![("contact1@example.com".to_string(), "user1".to_string())]
        );
    }

    #[tokio::test]
    async fn test_run_once_failed_send_is_not_recorded() {
        let mut mock_repo = MockUserRepository::new();
        let users = vec![user(1, 48, Some(50), None)];
        mock_repo
            .expect_list_all_users()
            .times(1)
            .returning(move || {
                let users = users.clone();
                Box::pin(async move { Ok(users) })
            });
        mock_repo.expect_update_last_warning_sent().times(0);

        let notifier = Arc::new(RecordingEmailService::failing());
        let sweep = StalenessSweep::new(
            Arc::new(mock_repo),
            notifier.clone(),
            Arc::new(ManualClock::new(now())),
        );

        let report = sweep.run_once().await.expect("sweep should succeed");

        assert_eq!(report.failed, 1);
        assert_eq!(report.notified, 0);
        assert_eq!(notifier.attempts(), 1);
    }

    #[tokio::test]
    async fn test_run_once_persist_failure_does_not_stop_sweep() {
        let mut mock_repo = MockUserRepository::new();
        let users = vec![user(1, 48, Some(50), None), user(2, 48, Some(50), None)];
        mock_repo
            .expect_list_all_users()
            .times(1)
            .returning(move || {
                let users = users.clone();
                Box::pin(async move { Ok(users) })
            });
        mock_repo
            .expect_update_last_warning_sent()
            .with(eq(1), always())
            .times(1)
            .returning(|_, _| Box::pin(async { Err(RepositoryError::NotFound) }));
        mock_repo
            .expect_update_last_warning_sent()
            .with(eq(2), always())
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(()) }));

        let notifier = Arc::new(RecordingEmailService::new());
        let sweep = StalenessSweep::new(
            Arc::new(mock_repo),
            notifier.clone(),
            Arc::new(ManualClock::new(now())),
        );

        let report = sweep.run_once().await.expect("sweep should succeed");

        assert_eq!(report.failed, 1);
        assert_eq!(report.notified, 1);
        assert_eq!(notifier.attempts(), 2);
    }

    #[tokio::test]
    async fn test_run_once_list_failure_is_reported() {
        let mut mock_repo = MockUserRepository::new();
        mock_repo
            .expect_list_all_users()
            .times(1)
            .returning(|| Box::pin(async { Err(RepositoryError::Database(sqlx::Error::PoolClosed)) }));

        let sweep = StalenessSweep::new(
            Arc::new(mock_repo),
            Arc::new(RecordingEmailService::new()),
            Arc::new(ManualClock::new(now())),
        );

        assert!(matches!(
            sweep.run_once().await,
            Err(SweepError::ListUsers(_))
        ));
    }
}
