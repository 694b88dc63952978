//! Transport seam and the SMTP implementation

use std::time::Duration;

use async_trait::async_trait;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{SmtpTransport, Transport};

use super::message::{build_message, DeliveryError, OutgoingMail};
use crate::config::{InlineLogo, SenderConfig, SmtpConfig};

const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Delivery capability consumed by the campaign pipeline.
///
/// One call is one attempt; callers never retry.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Build and deliver a single message
    async fn deliver(&self, mail: &OutgoingMail) -> Result<(), DeliveryError>;

    /// Transport name for logs
    fn name(&self) -> &str;
}

/// SMTP delivery through lettre.
///
/// Implicit TLS when configured as secure, otherwise STARTTLS when the server
/// offers it and plain SMTP when it does not. Authenticates only when both
/// username and password are set.
pub struct SmtpMailer {
    transport: SmtpTransport,
    inline_logo: Option<InlineLogo>,
    host: String,
}

/// Install the ring provider as the process-wide rustls default.
/// Later calls, or a provider installed elsewhere, leave things as they are.
fn ensure_crypto_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig, sender: &SenderConfig) -> Result<Self, DeliveryError> {
        ensure_crypto_provider();

        let builder = if config.secure {
            SmtpTransport::relay(&config.host)
                .map_err(|e| DeliveryError::Transport(format!("SMTP relay error: {e}")))?
        } else {
            let tls = TlsParameters::new(config.host.clone())
                .map_err(|e| DeliveryError::Transport(format!("TLS setup failed: {e}")))?;
            SmtpTransport::builder_dangerous(&config.host).tls(Tls::Opportunistic(tls))
        };

        let mut builder = builder.port(config.port).timeout(Some(SMTP_TIMEOUT));
        if let Some((username, password)) = config.credentials() {
            builder = builder.credentials(Credentials::new(username.to_string(), password.to_string()));
        }

        tracing::info!(
            host = %config.host,
            port = config.port,
            implicit_tls = config.secure,
            authenticated = config.credentials().is_some(),
            "SMTP transport configured"
        );

        Ok(Self {
            transport: builder.build(),
            inline_logo: sender.inline_logo.clone(),
            host: config.host.clone(),
        })
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn deliver(&self, mail: &OutgoingMail) -> Result<(), DeliveryError> {
        let message = build_message(mail, self.inline_logo.as_ref())?;
        let transport = self.transport.clone();

        tokio::task::spawn_blocking(move || transport.send(&message))
            .await
            .map_err(|e| DeliveryError::Task(e.to_string()))?
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        tracing::debug!(to = %mail.to, host = %self.host, "SMTP accepted message");
        Ok(())
    }

    fn name(&self) -> &str {
        "smtp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn smtp(secure: bool) -> SmtpConfig {
        SmtpConfig {
            host: "smtp.test.com".into(),
            port: if secure { 465 } else { 587 },
            username: Some("user".into()),
            password: Some("pass".into()),
            secure,
        }
    }

    fn sender() -> SenderConfig {
        SenderConfig {
            from: "user@test.com".into(),
            reply_to: None,
            inline_logo: None,
        }
    }

    #[test]
    fn test_mailer_builds_for_starttls() {
        let mailer = SmtpMailer::new(&smtp(false), &sender()).unwrap();
        assert_eq!(mailer.name(), "smtp");
    }

    #[test]
    fn test_mailer_builds_for_implicit_tls() {
        assert!(SmtpMailer::new(&smtp(true), &sender()).is_ok());
    }

    #[tokio::test]
    async fn test_invalid_address_fails_before_connecting() {
        let mailer = SmtpMailer::new(&smtp(false), &sender()).unwrap();
        let mail = OutgoingMail {
            from: "user@test.com".into(),
            to: "nope".into(),
            subject: "s".into(),
            body: "b".into(),
            reply_to: None,
            is_html: false,
        };
        let err = mailer.deliver(&mail).await.unwrap_err();
        assert!(matches!(err, DeliveryError::InvalidAddress { .. }));
    }
}
