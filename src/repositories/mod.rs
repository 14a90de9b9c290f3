pub mod checkin_repository;
pub mod user_repository;

pub use checkin_repository::{CheckInRepository, SqliteCheckInRepository};
pub use user_repository::{RepositoryError, SqliteUserRepository, UserRepository};
