//! SMTP mail transport.
//!
//! [`MailTransport`] is the seam the dispatcher sends through; tests
//! inject fakes, production wires [`SmtpMailer`] on top of the `lettre`
//! async SMTP transport.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::MailConfig;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for a single mail send attempt.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    /// SMTP transport-level failure (authentication, connection,
    /// timeout, ...). Any of these counts as one failed attempt.
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// A sender or recipient address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled, or the configuration
    /// is unusable (no recipients, no credentials).
    #[error("Email build error: {0}")]
    Build(String),
}

// ---------------------------------------------------------------------------
// MailTransport
// ---------------------------------------------------------------------------

/// One blocking-from-the-caller's-view send of a composed message.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, title: &str, body: &str) -> Result<(), MailError>;
}

// ---------------------------------------------------------------------------
// SmtpMailer
// ---------------------------------------------------------------------------

/// Production [`MailTransport`] speaking SMTP via `lettre`.
pub struct SmtpMailer {
    config: MailConfig,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    /// Build the mailer from immutable configuration.
    ///
    /// STARTTLS is used when `use_tls` is set; otherwise a plaintext
    /// connection (local relay setups). Credentials are attached when
    /// both username and password are present.
    pub fn new(config: MailConfig) -> Result<Self, MailError> {
        if !config.has_credentials() {
            tracing::warn!("Mail credentials not configured; sends will likely be rejected");
        }
        if config.to_emails.is_empty() {
            tracing::warn!("Mail recipient list is empty; alerts have nowhere to go");
        }

        let mut builder = if config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        };
        builder = builder.port(config.port);

        if config.has_credentials() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            config,
        })
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, title: &str, body: &str) -> Result<(), MailError> {
        if self.config.to_emails.is_empty() {
            return Err(MailError::Build("no recipients configured".to_string()));
        }

        let mut builder = Message::builder()
            .from(self.config.sender().parse()?)
            .subject(title)
            .header(ContentType::TEXT_PLAIN);
        for to in &self.config.to_emails {
            builder = builder.to(to.parse()?);
        }

        let email = builder
            .body(body.to_string())
            .map_err(|e| MailError::Build(e.to_string()))?;

        self.transport.send(email).await?;

        tracing::info!(
            title,
            recipients = self.config.to_emails.len(),
            "Alert email sent"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn config(to: Vec<String>) -> MailConfig {
        MailConfig {
            host: "smtp.example.com".into(),
            port: 587,
            username: "ops@example.com".into(),
            password: "pw".into(),
            use_tls: false,
            from_email: String::new(),
            to_emails: to,
        }
    }

    #[tokio::test]
    async fn send_without_recipients_is_a_build_error() {
        let mailer = SmtpMailer::new(config(vec![])).expect("mailer should build");
        let err = mailer.send("t", "b").await.unwrap_err();
        assert!(matches!(err, MailError::Build(_)));
    }

    #[tokio::test]
    async fn send_with_invalid_recipient_is_an_address_error() {
        let mailer =
            SmtpMailer::new(config(vec!["not-an-address".into()])).expect("mailer should build");
        let err = mailer.send("t", "b").await.unwrap_err();
        assert!(matches!(err, MailError::Address(_)));
    }

    #[test]
    fn mail_error_display_build() {
        let err = MailError::Build("missing body".to_string());
        assert_eq!(err.to_string(), "Email build error: missing body");
    }
}
