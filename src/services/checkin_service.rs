use crate::models::checkin::CheckIn;
use crate::repositories::checkin_repository::CheckInRepository;
use crate::repositories::user_repository::RepositoryError;
use crate::services::clock::Clock;
use std::sync::Arc;

/// Number of check-ins shown on a user's page.
pub const RECENT_CHECKINS_LIMIT: i64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum CheckInServiceError {
    #[error("User not found")]
    UserNotFound,
    #[error("Repository error: {0}")]
    RepositoryError(#[from] RepositoryError),
}

pub struct CheckInService {
    repository: Arc<dyn CheckInRepository>,
    clock: Arc<dyn Clock>,
}

impl CheckInService {
    pub fn new(repository: Arc<dyn CheckInRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Record that the user is alive right now.
    pub async fn check_in(&self, user_id: i64) -> Result<CheckIn, CheckInServiceError> {
        match self.repository.create_checkin(user_id, self.clock.now()).await {
            Ok(checkin) => {
                tracing::info!(user_id, checkin_id = checkin.id, "User checked in");
                Ok(checkin)
            }
            Err(RepositoryError::NotFound) => Err(CheckInServiceError::UserNotFound),
            Err(e) => Err(CheckInServiceError::RepositoryError(e)),
        }
    }

    pub async fn recent_checkins(
        &self,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<CheckIn>, CheckInServiceError> {
        Ok(self.repository.list_by_user(user_id, limit).await?)
    }

    pub async fn find_checkin(&self, id: i64) -> Result<Option<CheckIn>, CheckInServiceError> {
        Ok(self.repository.find_by_id(id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::checkin_repository::MockCheckInRepository;
    use crate::services::clock::ManualClock;
    use chrono::{TimeZone, Utc};
    use mockall::predicate::*;

    #[tokio::test]
    async fn test_check_in_stamps_with_clock() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let mut mock_repo = MockCheckInRepository::new();
        mock_repo
            .expect_create_checkin()
            .with(eq(7), eq(now))
            .times(1)
            .returning(|user_id, checkin_time| {
                Box::pin(async move {
                    Ok(CheckIn {
                        id: 1,
                        user_id,
                        checkin_time,
                    })
                })
            });

        let service = CheckInService::new(Arc::new(mock_repo), Arc::new(ManualClock::new(now)));

        let checkin = service.check_in(7).await.expect("check-in should succeed");
        assert_eq!(checkin.checkin_time, now);
    }

    #[tokio::test]
    async fn test_check_in_unknown_user() {
        let mut mock_repo = MockCheckInRepository::new();
        mock_repo
            .expect_create_checkin()
            .times(1)
            .returning(|_, _| Box::pin(async { Err(RepositoryError::NotFound) }));

        let service = CheckInService::new(
            Arc::new(mock_repo),
            Arc::new(ManualClock::new(Utc::now())),
        );

        let result = service.check_in(42).await;
        assert!(matches!(result, Err(CheckInServiceError::UserNotFound)));
    }
}
