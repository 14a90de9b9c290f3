use crate::models::user::{parse_warning_interval, User};
use crate::repositories::user_repository::{RepositoryError, UserRepository};
use crate::services::clock::Clock;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::RngCore;
use std::sync::Arc;

/// Token generation is retried this many times on a (vanishingly rare) collision.
const TOKEN_ATTEMPTS: usize = 3;

#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    #[error("Name is required")]
    MissingName,
    #[error("Invalid email address")]
    InvalidEmail,
    #[error("User not found")]
    UserNotFound,
    #[error("Could not allocate a unique access token")]
    TokenCollision,
    #[error("Repository error: {0}")]
    RepositoryError(#[from] RepositoryError),
}

pub struct RegisterUserRequest {
    pub name: String,
    pub emergency_email: String,
    /// Raw form input; malformed values fall back to the default interval.
    pub warning_interval_hours: Option<String>,
}

pub struct UserService {
    repository: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
    default_interval_hours: i64,
}

impl UserService {
    pub fn new(
        repository: Arc<dyn UserRepository>,
        clock: Arc<dyn Clock>,
        default_interval_hours: i64,
    ) -> Self {
        Self {
            repository,
            clock,
            default_interval_hours,
        }
    }

    pub fn default_interval_hours(&self) -> i64 {
        self.default_interval_hours
    }

    pub async fn register_user(&self, request: RegisterUserRequest) -> Result<User, UserServiceError> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(UserServiceError::MissingName);
        }

        let emergency_email = request.emergency_email.trim();
        self.validate_email(emergency_email)?;

        let interval = request
            .warning_interval_hours
            .as_deref()
            .map(|raw| parse_warning_interval(raw, self.default_interval_hours))
            .unwrap_or(self.default_interval_hours);

        for _ in 0..TOKEN_ATTEMPTS {
            let token = Self::generate_token();
            match self
                .repository
                .create_user(name, emergency_email, interval, &token, self.clock.now())
                .await
            {
                Ok(user) => {
                    tracing::info!(user_id = user.id, "Registered new user");
                    return Ok(user);
                }
                Err(RepositoryError::AlreadyExists) => {
                    tracing::warn!("Access token collision, regenerating");
                    continue;
                }
                Err(e) => return Err(UserServiceError::RepositoryError(e)),
            }
        }

        Err(UserServiceError::TokenCollision)
    }

    pub async fn find_user_by_token(&self, token: &str) -> Result<Option<User>, UserServiceError> {
        Ok(self.repository.find_by_token(token).await?)
    }

    pub async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, UserServiceError> {
        Ok(self.repository.find_by_id(id).await?)
    }

    pub async fn list_users(&self) -> Result<Vec<User>, UserServiceError> {
        Ok(self.repository.list_all_users().await?)
    }

    /// Store a new interval parsed from raw input and return the value stored.
    pub async fn update_warning_interval(
        &self,
        user_id: i64,
        raw_hours: &str,
    ) -> Result<i64, UserServiceError> {
        let hours = parse_warning_interval(raw_hours, self.default_interval_hours);

        match self.repository.update_warning_interval(user_id, hours).await {
            Ok(()) => Ok(hours),
            Err(RepositoryError::NotFound) => Err(UserServiceError::UserNotFound),
            Err(e) => Err(UserServiceError::RepositoryError(e)),
        }
    }

    fn validate_email(&self, email: &str) -> Result<(), UserServiceError> {
        if !email.contains('@') || email.len() > 255 || email.len() <= 3 {
            return Err(UserServiceError::InvalidEmail);
        }
        Ok(())
    }

    fn generate_token() -> String {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }
}
