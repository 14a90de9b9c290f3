use std::env;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use tracing::warn;

use crate::models::user::{parse_warning_interval, DEFAULT_WARNING_INTERVAL_HOURS};
use crate::services::sweep_scheduler::DEFAULT_SWEEP_INTERVAL_SECS;

const DEFAULT_DATABASE_URL: &str = "sqlite://data/webcare.db?mode=rwc";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 5000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid HOST: {0}")]
    InvalidHost(String),
    #[error("Invalid PORT: {0}")]
    InvalidPort(String),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub base_url: String,
    pub default_warning_interval_hours: i64,
    pub sweep_interval: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());

        let host = env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
        let host = host
            .parse::<IpAddr>()
            .map_err(|_| ConfigError::InvalidHost(host.clone()))?;

        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw.clone()))?,
            Err(_) => DEFAULT_PORT,
        };

        let base_url = env::var("BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| format!("http://localhost:{}", port));

        Ok(AppConfig {
            database_url,
            bind_addr: SocketAddr::from((host, port)),
            base_url,
            default_warning_interval_hours: default_warning_interval_from_env(),
            sweep_interval: sweep_interval_from_env(),
        })
    }

    /// Personal check-in link for a user token.
    pub fn checkin_url(&self, token: &str) -> String {
        format!("{}/u/{}", self.base_url, token)
    }
}

fn default_warning_interval_from_env() -> i64 {
    match env::var("DEFAULT_WARNING_INTERVAL_HOURS") {
        Ok(raw) => {
            let hours = parse_warning_interval(&raw, DEFAULT_WARNING_INTERVAL_HOURS);
            if raw.trim() != hours.to_string() {
                warn!(
                    "DEFAULT_WARNING_INTERVAL_HOURS={:?} is not a non-negative integer; using {}",
                    raw, hours
                );
            }
            hours
        }
        Err(_) => DEFAULT_WARNING_INTERVAL_HOURS,
    }
}

fn sweep_interval_from_env() -> Duration {
    let secs = match env::var("SWEEP_INTERVAL_SECS") {
        Ok(raw) => match raw.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => secs,
            _ => {
                warn!(
                    "SWEEP_INTERVAL_SECS={:?} is invalid; using {}",
                    raw, DEFAULT_SWEEP_INTERVAL_SECS
                );
                DEFAULT_SWEEP_INTERVAL_SECS
            }
        },
        Err(_) => DEFAULT_SWEEP_INTERVAL_SECS,
    };
    Duration::from_secs(secs)
}
