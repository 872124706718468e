//! Delivery transports.
//!
//! One [`Transport`] implementation per delivery mechanism, chosen from
//! configuration at startup:
//!
//! - [`WebhookTransport`] posts the raw Markdown to an IFTTT-style webhook
//! - [`SendGridTransport`] submits the HTML email through SendGrid
//! - [`SmtpMailer`] sends a plain + HTML multipart message over SMTP
//!
//! Transports make exactly one attempt. Network and provider failures come
//! back as a failed [`DeliveryResult`]; only configuration problems and
//! unexpected faults are returned as errors.

pub mod sendgrid;
pub mod smtp;
pub mod webhook;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::config::DeliveryConfig;
use crate::error::Result;
use crate::render::render_email_html;

pub use sendgrid::SendGridTransport;
pub use smtp::SmtpMailer;
pub use webhook::WebhookTransport;

/// A rendered tidbits email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub subject: String,
    /// Plain-text body (the Markdown produced by the model).
    pub text: String,
    /// Styled HTML body.
    pub html: String,
}

impl Email {
    /// Build an email from model Markdown.
    #[must_use]
    pub fn from_markdown(subject: impl Into<String>, markdown: impl Into<String>) -> Self {
        let subject = subject.into();
        let text = markdown.into();
        let html = render_email_html(&subject, &text);
        Self {
            subject,
            text,
            html,
        }
    }
}

/// Outcome of a single delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryResult {
    pub success: bool,
    /// Diagnostic detail, mostly for failures.
    pub message: Option<String>,
}

impl DeliveryResult {
    #[must_use]
    pub const fn delivered() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

/// Trait for delivery transports (webhook, SendGrid, SMTP).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Get the name of this transport.
    fn name(&self) -> &'static str;

    /// Attempt to deliver `email` once.
    async fn deliver(&self, email: &Email) -> Result<DeliveryResult>;
}

/// Build the transport matching `config`.
///
/// Credentials and addresses are validated here, so a bad configuration
/// fails before anything touches the network.
pub fn build_transport(config: &DeliveryConfig) -> Result<Arc<dyn Transport>> {
    let transport: Arc<dyn Transport> = match config {
        DeliveryConfig::Webhook(c) => Arc::new(WebhookTransport::new(c.url.clone())?),
        DeliveryConfig::SendGrid(c) => Arc::new(SendGridTransport::new(c.clone())?),
        DeliveryConfig::Smtp(c) => Arc::new(SmtpMailer::new(c)?),
    };

    info!(transport = transport.name(), "Delivery transport configured");
    Ok(transport)
}
