pub mod checkin;
pub mod user;

pub use checkin::CheckIn;
pub use user::{parse_warning_interval, User, DEFAULT_WARNING_INTERVAL_HOURS};
