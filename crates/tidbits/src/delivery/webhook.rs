//! IFTTT-style webhook transport.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

use super::{DeliveryResult, Email, Transport};
use crate::config::ENV_IFTTT_WEBHOOK_URL;
use crate::error::{Result, TidbitsError};

/// Posts the raw tidbits text to a webhook.
///
/// The body is `{"value1": "", "value2": <text>}`, the shape IFTTT's Maker
/// webhooks expect. Only HTTP 200 counts as delivered.
pub struct WebhookTransport {
    url: reqwest::Url,
    client: reqwest::Client,
}

impl WebhookTransport {
    /// Create a webhook transport for `url`.
    pub fn new(url: impl AsRef<str>) -> Result<Self> {
        let raw = url.as_ref().trim();
        if raw.is_empty() {
            return Err(TidbitsError::missing(ENV_IFTTT_WEBHOOK_URL));
        }
        let url = reqwest::Url::parse(raw).map_err(|e| {
            TidbitsError::Config(format!("{ENV_IFTTT_WEBHOOK_URL} is not a valid URL: {e}"))
        })?;

        Ok(Self {
            url,
            client: reqwest::Client::new(),
        })
    }
}

#[async_trait]
impl Transport for WebhookTransport {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn deliver(&self, email: &Email) -> Result<DeliveryResult> {
        let payload = WebhookPayload {
            value1: "",
            value2: &email.text,
        };

        debug!(transport = "webhook", host = ?self.url.host_str(), "Posting tidbits");

        let response = match self
            .client
            .post(self.url.clone())
            .json(&payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(transport = "webhook", error = %e, "Webhook request failed");
                return Ok(DeliveryResult::failed(format!("Webhook request failed: {e}")));
            }
        };

        let status = response.status();
        if status == reqwest::StatusCode::OK {
            debug!(transport = "webhook", "Webhook accepted tidbits");
            return Ok(DeliveryResult::delivered());
        }

        let body = response.text().await.unwrap_or_default();
        warn!(
            transport = "webhook",
            status = %status,
            body = %body,
            "Webhook returned non-200 status"
        );
        Ok(DeliveryResult::failed(format!(
            "Webhook returned {status}: {body}"
        )))
    }
}

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    value1: &'a str,
    value2: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn email() -> Email {
        Email::from_markdown("Daily Tidbits", "## Tool X\nexplained")
    }

    #[tokio::test]
    async fn test_posts_raw_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/trigger/tidbits"))
            .and(body_json(json!({ "value1": "", "value2": "## Tool X\nexplained" })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let transport = WebhookTransport::new(format!("{}/trigger/tidbits", server.uri())).unwrap();
        let result = transport.deliver(&email()).await.unwrap();

        assert_eq!(result, DeliveryResult::delivered());
    }

    #[tokio::test]
    async fn test_non_200_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let transport = WebhookTransport::new(server.uri()).unwrap();
        let result = transport.deliver(&email()).await.unwrap();

        assert!(!result.success);
        assert!(result.message.unwrap().contains("202"));
    }

    #[tokio::test]
    async fn test_server_error_reports_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("applet disabled"))
            .mount(&server)
            .await;

        let transport = WebhookTransport::new(server.uri()).unwrap();
        let result = transport.deliver(&email()).await.unwrap();

        assert!(!result.success);
        assert!(result.message.unwrap().contains("applet disabled"));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_failure_not_error() {
        let transport = WebhookTransport::new("http://127.0.0.1:1/trigger").unwrap();
        let result = transport.deliver(&email()).await.unwrap();

        assert!(!result.success);
    }

    #[test]
    fn test_missing_url_is_config_error() {
        assert!(matches!(
            WebhookTransport::new("  "),
            Err(TidbitsError::Config(_))
        ));
        assert!(matches!(
            WebhookTransport::new("not a url"),
            Err(TidbitsError::Config(_))
        ));
    }
}
