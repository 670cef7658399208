/// Email delivery for activation and password reset links
use crate::config::EmailSettings;
use async_trait::async_trait;
use chrono::Duration;
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

pub const ACTIVATION_SUBJECT: &str = "Account Activation";
pub const RESET_SUBJECT: &str = "Reset password";

#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("invalid email address: {0}")]
    InvalidAddress(String),

    #[error("failed to build email message: {0}")]
    Build(String),

    #[error("failed to configure SMTP transport: {0}")]
    Config(String),

    #[error("failed to send email: {0}")]
    Transport(String),
}

/// Outbound email collaborator
#[async_trait]
pub trait EmailNotifier: Send + Sync {
    async fn send(
        &self,
        from: &str,
        to: &str,
        body: &str,
        subject: &str,
    ) -> Result<(), NotifierError>;
}

/// Async SMTP notifier (or no-op)
#[derive(Clone)]
pub struct SmtpNotifier {
    transport: Option<Arc<AsyncSmtpTransport<Tokio1Executor>>>,
}

impl SmtpNotifier {
    /// Build the notifier from configuration
    ///
    /// If SMTP host is empty, operates in no-op mode (logs only).
    pub fn new(config: &EmailSettings) -> Result<Self, NotifierError> {
        let transport = if config.smtp_host.trim().is_empty() {
            warn!("SMTP host not configured; email notifier will operate in no-op mode");
            None
        } else {
            let builder = if config.use_starttls {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            } else {
                AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            }
            .map_err(|e| NotifierError::Config(e.to_string()))?
            .port(config.smtp_port);

            let builder = if let (Some(username), Some(password)) =
                (&config.smtp_username, &config.smtp_password)
            {
                builder.credentials(Credentials::new(username.to_string(), password.to_string()))
            } else {
                builder
            };

            Some(Arc::new(builder.build()))
        };

        Ok(Self { transport })
    }

    /// Check if SMTP transport is enabled
    pub fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }
}

#[async_trait]
impl EmailNotifier for SmtpNotifier {
    async fn send(
        &self,
        from: &str,
        to: &str,
        body: &str,
        subject: &str,
    ) -> Result<(), NotifierError> {
        let Some(transport) = &self.transport else {
            info!(
                subject,
                recipient = %mask_email(to),
                "Email notifier running in no-op mode; skipping actual send"
            );
            return Ok(());
        };

        let from = from
            .parse::<Mailbox>()
            .map_err(|e| NotifierError::InvalidAddress(format!("{}: {}", from, e)))?;
        let to_mailbox = to
            .parse::<Mailbox>()
            .map_err(|e| NotifierError::InvalidAddress(e.to_string()))?;

        let email = Message::builder()
            .from(from)
            .to(to_mailbox)
            .subject(subject)
            .header(header::ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| NotifierError::Build(e.to_string()))?;

        transport
            .send(email)
            .await
            .map_err(|e| NotifierError::Transport(e.to_string()))?;
        info!(subject, "email sent successfully");
        Ok(())
    }
}

/// Builds account links and hands emails to the notifier without waiting
#[derive(Clone)]
pub struct Mailer {
    notifier: Arc<dyn EmailNotifier>,
    from: String,
    base_url: String,
    reset_ttl: Duration,
}

impl Mailer {
    pub fn new(notifier: Arc<dyn EmailNotifier>, from: impl Into<String>, base_url: &str) -> Self {
        Self {
            notifier,
            from: from.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            reset_ttl: Duration::hours(1),
        }
    }

    /// Reset link lifetime quoted in the reset email
    pub fn with_reset_ttl(mut self, reset_ttl: Duration) -> Self {
        self.reset_ttl = reset_ttl;
        self
    }

    /// `{base}/activate/{account_id}/{token}`
    pub fn activation_link(&self, account_id: Uuid, token: &str) -> String {
        format!("{}/activate/{}/{}", self.base_url, account_id, token)
    }

    /// `{base}/reset/{account_id}/{timestamp}/{token}`
    pub fn reset_link(&self, account_id: Uuid, encoded_timestamp: &str, token: &str) -> String {
        format!(
            "{}/reset/{}/{}/{}",
            self.base_url, account_id, encoded_timestamp, token
        )
    }

    pub fn send_activation(&self, to: &str, link: &str) {
        let body = format!("click the link to activate your account {}", link);
        self.dispatch(to, ACTIVATION_SUBJECT, body);
    }

    pub fn send_password_reset(&self, to: &str, link: &str) {
        let body = self.reset_body(link);
        self.dispatch(to, RESET_SUBJECT, body);
    }

    fn reset_body(&self, link: &str) -> String {
        format!(
            "click the link to reset your password {}\n\nThis link will expire in {}.",
            link,
            describe_window(self.reset_ttl)
        )
    }

    /// Spawn the send; failures are logged and never reach the caller
    fn dispatch(&self, to: &str, subject: &'static str, body: String) {
        let notifier = self.notifier.clone();
        let from = self.from.clone();
        let to = to.to_string();

        tokio::spawn(async move {
            if let Err(e) = notifier.send(&from, &to, &body, subject).await {
                error!(
                    subject,
                    recipient = %mask_email(&to),
                    error = %e,
                    "Failed to deliver email"
                );
            }
        });
    }
}

/// "1 hour", "30 minutes", "90 seconds"
fn describe_window(window: Duration) -> String {
    let secs = window.num_seconds();
    let (count, unit) = if secs % 3600 == 0 {
        (secs / 3600, "hour")
    } else if secs % 60 == 0 {
        (secs / 60, "minute")
    } else {
        (secs, "second")
    };
    if count == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", count, unit)
    }
}

/// Mask email for logging
pub(crate) fn mask_email(email: &str) -> String {
    if let Some(at_pos) = email.find('@') {
        let local = &email[..at_pos];
        let domain = &email[at_pos..];
        match local.chars().next() {
            Some(first) if local.chars().count() > 2 => format!("{}***{}", first, domain),
            _ => format!("**{}", domain),
        }
    } else {
        "***@***".to_string()
    }
}
