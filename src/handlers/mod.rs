pub mod checkin_handlers;
pub mod home_handlers;

pub use checkin_handlers::{checkin_handler, update_interval_handler, user_page_handler};
pub use home_handlers::{health_handler, index_handler, register_handler};
