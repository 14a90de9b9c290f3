use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials, AsyncSmtpTransport,
    AsyncTransport, Message, Tokio1Executor,
};
use std::env;

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("Failed to build email message: {0}")]
    MessageBuild(String),
    #[error("Failed to send email: {0}")]
    SendFailed(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Outbound notification transport.
///
/// Implementations report every expected failure (bad address, network,
/// authentication) as an `EmailError` rather than panicking.
#[async_trait]
pub trait EmailService: Send + Sync {
    async fn send_warning_email(&self, to_email: &str, user_name: &str)
        -> Result<(), EmailError>;
}

pub fn warning_subject(user_name: &str) -> String {
    format!("[Urgent] {} has not checked in", user_name)
}

pub fn warning_body(user_name: &str) -> String {
    format!(
        r#"
Dear emergency contact,

Hello, this is {}.

I have not checked in for several days. Please check on me.

If you see this message, please get in touch with me as soon as possible to make sure I am safe.

---
This email was sent automatically by WebCare
"#,
        user_name
    )
}

/// Writes warnings to the log instead of sending them.
pub struct LoggingEmailService;

impl LoggingEmailService {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LoggingEmailService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmailService for LoggingEmailService {
    async fn send_warning_email(
        &self,
        to_email: &str,
        user_name: &str,
    ) -> Result<(), EmailError> {
        tracing::info!("📧 [LOG EMAIL] Warning email to: {}", to_email);
        tracing::info!("   Subject: {}", warning_subject(user_name));
        tracing::info!("   Body: {}", warning_body(user_name).trim());
        tracing::info!("   ---");
        Ok(())
    }
}

pub struct SmtpEmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_email: String,
    from_name: String,
}

impl SmtpEmailService {
    pub fn new() -> Result<Self, EmailError> {
        let smtp_host = env::var("SMTP_HOST")
            .map_err(|_| EmailError::ConfigError("SMTP_HOST not set".to_string()))?;
        let smtp_port = env::var("SMTP_PORT")
            .unwrap_or_else(|_| "465".to_string())
            .parse::<u16>()
            .map_err(|_| EmailError::ConfigError("Invalid SMTP_PORT".to_string()))?;
        let smtp_username = env::var("SMTP_USERNAME")
            .map_err(|_| EmailError::ConfigError("SMTP_USERNAME not set".to_string()))?;
        let smtp_password = env::var("SMTP_PASSWORD")
            .map_err(|_| EmailError::ConfigError("SMTP_PASSWORD not set".to_string()))?;
        let from_email = env::var("SMTP_FROM_EMAIL").unwrap_or_else(|_| smtp_username.clone());
        let from_name = env::var("SMTP_FROM_NAME").unwrap_or_else(|_| "WebCare".to_string());

        let encryption = env::var("SMTP_ENCRYPTION").unwrap_or_else(|_| "tls".to_string());

        let credentials = Credentials::new(smtp_username, smtp_password);

        let mailer = match encryption.to_lowercase().as_str() {
            "tls" => AsyncSmtpTransport::<Tokio1Executor>::relay(&smtp_host)
                .map_err(|e| EmailError::ConfigError(format!("SMTP relay error: {}", e)))?
                .port(smtp_port)
                .credentials(credentials)
                .build(),
            "starttls" => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp_host)
                .map_err(|e| EmailError::ConfigError(format!("SMTP starttls error: {}", e)))?
                .port(smtp_port)
                .credentials(credentials)
                .build(),
            "none" => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&smtp_host)
                .port(smtp_port)
                .credentials(credentials)
                .build(),
            _ => {
                return Err(EmailError::ConfigError(format!(
                    "Invalid SMTP_ENCRYPTION value: {}. Use 'tls', 'starttls', or 'none'",
                    encryption
                )))
            }
        };

        Ok(Self {
            mailer,
            from_email,
            from_name,
        })
    }
}

#[async_trait]
impl EmailService for SmtpEmailService {
    async fn send_warning_email(
        &self,
        to_email: &str,
        user_name: &str,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                format!("{} <{}>", self.from_name, self.from_email)
                    .parse()
                    .map_err(|e| {
                        EmailError::MessageBuild(format!("Invalid from address: {}", e))
                    })?,
            )
            .to(to_email
                .parse()
                .map_err(|e| EmailError::MessageBuild(format!("Invalid to address: {}", e)))?)
            .subject(warning_subject(user_name))
            .header(ContentType::TEXT_PLAIN)
            .body(warning_body(user_name))
            .map_err(|e| EmailError::MessageBuild(e.to_string()))?;

        self.mailer
            .send(email)
            .await
            .map_err(|e| EmailError::SendFailed(e.to_string()))?;

        Ok(())
    }
}

pub fn create_email_service() -> Box<dyn EmailService> {
    if env::var("SMTP_HOST").is_ok() {
        match SmtpEmailService::new() {
            Ok(service) => {
                tracing::info!("Using SMTP email service");
                Box::new(service)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to initialize SMTP email service: {}. Falling back to logging service",
                    e
                );
                Box::new(LoggingEmailService::new())
            }
        }
    } else {
        tracing::info!(
            "SMTP not configured. Using logging email service (warnings will be written to the log)"
        );
        Box::new(LoggingEmailService::new())
    }
}
