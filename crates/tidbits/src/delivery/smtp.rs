//! Email sender using authenticated SMTP (Gmail by default).

use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{info, warn};

use super::{DeliveryResult, Email, Transport};
use crate::config::{SmtpConfig, ENV_GMAIL_APP_PASSWORD, ENV_GMAIL_USERNAME};
use crate::error::{Result, TidbitsError};

/// Port on which the relay speaks implicit TLS instead of STARTTLS.
const SMTPS_PORT: u16 = 465;

/// Sends multipart (plain + HTML) email over an encrypted SMTP session.
pub struct SmtpMailer {
    from: Mailbox,
    to: Mailbox,
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    /// Create a mailer, validating addresses and credentials.
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        if config.username.trim().is_empty() {
            return Err(TidbitsError::missing(ENV_GMAIL_USERNAME));
        }
        if config.password.trim().is_empty() {
            return Err(TidbitsError::missing(ENV_GMAIL_APP_PASSWORD));
        }

        let from: Mailbox = config
            .from_email
            .parse()
            .map_err(|e| TidbitsError::Config(format!("Invalid from email address: {e}")))?;

        let to: Mailbox = config
            .to_email
            .parse()
            .map_err(|e| TidbitsError::Config(format!("Invalid to email address: {e}")))?;

        let creds = Credentials::new(config.username.clone(), config.password.clone());

        // Implicit TLS on 465, STARTTLS everywhere else
        let builder = if config.port == SMTPS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
        }
        .map_err(|e| TidbitsError::Config(format!("Failed to create SMTP transport: {e}")))?;

        let mailer = builder.port(config.port).credentials(creds).build();

        Ok(Self { from, to, mailer })
    }

    /// Build the multipart message for `email`.
    pub(crate) fn build_message(&self, email: &Email) -> Result<Message> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(email.subject.as_str())
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(email.text.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(email.html.clone()),
                    ),
            )?;
        Ok(message)
    }
}

#[async_trait]
impl Transport for SmtpMailer {
    fn name(&self) -> &'static str {
        "smtp"
    }

    async fn deliver(&self, email: &Email) -> Result<DeliveryResult> {
        let message = self.build_message(email)?;

        match self.mailer.send(message).await {
            Ok(_) => {
                info!(
                    to = %self.to,
                    subject = %email.subject,
                    "Email sent successfully"
                );
                Ok(DeliveryResult::delivered())
            }
            Err(e) => {
                warn!(transport = "smtp", error = %e, "Failed to send email via SMTP");
                Ok(DeliveryResult::failed(format!(
                    "Failed to send email via SMTP: {e}"
                )))
            }
        }
    }
}
