pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;

// Make test_utils available for both unit tests and integration tests
pub mod test_utils;

use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::AppConfig>,
    pub user_service: Arc<services::user_service::UserService>,
    pub checkin_service: Arc<services::checkin_service::CheckInService>,
    pub pool: sqlx::SqlitePool,
}
