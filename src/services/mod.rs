pub mod checkin_service;
pub mod clock;
pub mod email_service;
pub mod staleness_sweep;
pub mod sweep_scheduler;
pub mod user_service;

pub use checkin_service::{CheckInService, CheckInServiceError};
pub use clock::{Clock, ManualClock, SystemClock};
pub use email_service::{
    create_email_service, EmailError, EmailService, LoggingEmailService, SmtpEmailService,
};
pub use staleness_sweep::{evaluate, StalenessSweep, SweepDecision, SweepError, SweepReport};
pub use sweep_scheduler::{SweepHandle, SweepScheduler};
pub use user_service::{RegisterUserRequest, UserService, UserServiceError};
