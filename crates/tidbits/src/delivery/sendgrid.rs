//! SendGrid transactional email transport.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::{DeliveryResult, Email, Transport};
use crate::config::{SendGridConfig, ENV_FROM_EMAIL, ENV_SENDGRID_API_KEY, ENV_TO_EMAIL};
use crate::error::{Result, TidbitsError};

/// Path of the v3 send endpoint, relative to the API base URL.
const SEND_PATH: &str = "/v3/mail/send";

/// Sends the HTML email through SendGrid's v3 mail API.
///
/// SendGrid answers 202 Accepted once a message is queued for delivery;
/// any other status is a failed delivery.
pub struct SendGridTransport {
    config: SendGridConfig,
    client: reqwest::Client,
}

impl SendGridTransport {
    /// Create a transport, rejecting blank credentials up front.
    pub fn new(config: SendGridConfig) -> Result<Self> {
        for (value, var) in [
            (&config.api_key, ENV_SENDGRID_API_KEY),
            (&config.from_email, ENV_FROM_EMAIL),
            (&config.to_email, ENV_TO_EMAIL),
        ] {
            if value.trim().is_empty() {
                return Err(TidbitsError::missing(var));
            }
        }

        Ok(Self {
            config,
            client: reqwest::Client::new(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}{SEND_PATH}", self.config.api_url.trim_end_matches('/'))
    }

    fn build_payload<'a>(&'a self, email: &'a Email) -> SendGridPayload<'a> {
        SendGridPayload {
            personalizations: vec![Personalization {
                to: vec![Address {
                    email: &self.config.to_email,
                }],
            }],
            from: Address {
                email: &self.config.from_email,
            },
            subject: &email.subject,
            content: vec![Content {
                content_type: "text/html",
                value: &email.html,
            }],
        }
    }
}

#[async_trait]
impl Transport for SendGridTransport {
    fn name(&self) -> &'static str {
        "sendgrid"
    }

    async fn deliver(&self, email: &Email) -> Result<DeliveryResult> {
        let payload = self.build_payload(email);

        debug!(transport = "sendgrid", to = %self.config.to_email, "Submitting email");

        let response = match self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(transport = "sendgrid", error = %e, "SendGrid request failed");
                return Ok(DeliveryResult::failed(format!("SendGrid request failed: {e}")));
            }
        };

        let status = response.status();
        if status == reqwest::StatusCode::ACCEPTED {
            info!(
                to = %self.config.to_email,
                subject = %email.subject,
                "Email accepted by SendGrid"
            );
            return Ok(DeliveryResult::delivered());
        }

        let body = response.text().await.unwrap_or_default();
        warn!(
            transport = "sendgrid",
            status = %status,
            body = %body,
            "SendGrid rejected email"
        );
        Ok(DeliveryResult::failed(format!(
            "SendGrid returned {status}: {body}"
        )))
    }
}

// =============================================================================
// SendGrid API types
// =============================================================================

#[derive(Debug, Serialize)]
struct SendGridPayload<'a> {
    personalizations: Vec<Personalization<'a>>,
    from: Address<'a>,
    subject: &'a str,
    content: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Personalization<'a> {
    to: Vec<Address<'a>>,
}

#[derive(Debug, Serialize)]
struct Address<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    content_type: &'a str,
    value: &'a str,
}
