//! Configuration for the tidbits pipeline.
//!
//! Everything is read once at startup, from the process environment or from
//! any key lookup (tests pass a map). Components receive the resulting
//! structs and never touch the environment themselves.

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, TidbitsError};
use crate::generator::{DEFAULT_LLM_PROGRAM, DEFAULT_MODEL};
use crate::source::{SourceUrl, BUILTIN_SOURCES};

/// Delivery transport to use (`webhook`, `sendgrid`, `smtp`).
pub const ENV_TRANSPORT: &str = "TIDBITS_TRANSPORT";
/// Model identifier passed to the generation CLI.
pub const ENV_MODEL: &str = "TIDBITS_MODEL";
/// Generation CLI program.
pub const ENV_LLM_BIN: &str = "TIDBITS_LLM_BIN";
/// Comma-separated source URLs replacing the built-in list.
pub const ENV_SOURCES: &str = "TIDBITS_SOURCES";

/// IFTTT webhook URL.
pub const ENV_IFTTT_WEBHOOK_URL: &str = "IFTTT_WEBHOOK_URL";
/// SendGrid API key.
pub const ENV_SENDGRID_API_KEY: &str = "SENDGRID_API_KEY";
/// SendGrid API base URL.
pub const ENV_SENDGRID_API_URL: &str = "SENDGRID_API_URL";
/// Sender address.
pub const ENV_FROM_EMAIL: &str = "TIDBITS_FROM_EMAIL";
/// Recipient address.
pub const ENV_TO_EMAIL: &str = "TIDBITS_TO_EMAIL";
/// Gmail address used to log in to SMTP.
pub const ENV_GMAIL_USERNAME: &str = "GMAIL_USERNAME";
/// Gmail app password (not the account password).
pub const ENV_GMAIL_APP_PASSWORD: &str = "GMAIL_APP_PASSWORD";
/// SMTP relay host override.
pub const ENV_SMTP_HOST: &str = "SMTP_HOST";
/// SMTP relay port override.
pub const ENV_SMTP_PORT: &str = "SMTP_PORT";

/// Default SendGrid API base URL.
pub const DEFAULT_SENDGRID_API_URL: &str = "https://api.sendgrid.com";
/// Default Gmail SMTP host.
pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
/// Default Gmail SMTP port (STARTTLS).
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// Available delivery transports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum TransportKind {
    /// IFTTT-style JSON webhook
    Webhook,
    /// SendGrid transactional email API
    Sendgrid,
    /// Authenticated SMTP submission
    #[default]
    Smtp,
}

impl TransportKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Webhook => "webhook",
            Self::Sendgrid => "sendgrid",
            Self::Smtp => "smtp",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportKind {
    type Err = TidbitsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "webhook" | "ifttt" => Ok(Self::Webhook),
            "sendgrid" | "api" => Ok(Self::Sendgrid),
            "smtp" | "gmail" => Ok(Self::Smtp),
            other => Err(TidbitsError::Config(format!(
                "unknown transport '{other}' (expected webhook, sendgrid or smtp)"
            ))),
        }
    }
}

/// Run-independent settings.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Generation CLI program.
    pub llm_program: String,
    /// Model identifier for the CLI.
    pub model: String,
    /// Candidate source documents (never empty).
    pub sources: Vec<SourceUrl>,
    /// Transport used in live mode.
    pub transport: TransportKind,
}

impl AppConfig {
    /// Create configuration from environment variables.
    ///
    /// # Optional Environment Variables
    /// - `TIDBITS_LLM_BIN`: generation CLI (default: `llm`)
    /// - `TIDBITS_MODEL`: model identifier (default: `gemini-2.0-flash-exp`)
    /// - `TIDBITS_SOURCES`: comma-separated source URLs (default: built-in list)
    /// - `TIDBITS_TRANSPORT`: `webhook`, `sendgrid` or `smtp` (default: `smtp`)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(env_lookup)
    }

    /// Create configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| non_empty(lookup(key));

        let sources = match get(ENV_SOURCES) {
            Some(raw) => {
                let sources: Vec<SourceUrl> = raw
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(SourceUrl::from)
                    .collect();
                if sources.is_empty() {
                    return Err(TidbitsError::Config(format!(
                        "{ENV_SOURCES} contains no source URLs"
                    )));
                }
                sources
            }
            None => BUILTIN_SOURCES.iter().copied().map(SourceUrl::from).collect(),
        };

        let transport = get(ENV_TRANSPORT)
            .map(|v| v.parse::<TransportKind>())
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            llm_program: get(ENV_LLM_BIN).unwrap_or_else(|| DEFAULT_LLM_PROGRAM.to_string()),
            model: get(ENV_MODEL).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            sources,
            transport,
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm_program: DEFAULT_LLM_PROGRAM.to_string(),
            model: DEFAULT_MODEL.to_string(),
            sources: BUILTIN_SOURCES.iter().copied().map(SourceUrl::from).collect(),
            transport: TransportKind::default(),
        }
    }
}

/// Webhook transport credentials.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub url: String,
}

/// SendGrid transport credentials.
#[derive(Clone)]
pub struct SendGridConfig {
    pub api_key: String,
    pub api_url: String,
    pub from_email: String,
    pub to_email: String,
}

impl fmt::Debug for SendGridConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SendGridConfig")
            .field("api_key", &"<redacted>")
            .field("api_url", &self.api_url)
            .field("from_email", &self.from_email)
            .field("to_email", &self.to_email)
            .finish()
    }
}

/// SMTP transport credentials.
#[derive(Clone)]
pub struct SmtpConfig {
    /// SMTP server hostname.
    pub host: String,
    /// SMTP server port.
    pub port: u16,
    /// SMTP username (Gmail address).
    pub username: String,
    /// SMTP password (Gmail app password).
    pub password: String,
    /// Sender address (defaults to the username).
    pub from_email: String,
    /// Recipient address.
    pub to_email: String,
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("from_email", &self.from_email)
            .field("to_email", &self.to_email)
            .finish()
    }
}

/// Validated credentials for exactly one transport.
#[derive(Debug, Clone)]
pub enum DeliveryConfig {
    Webhook(WebhookConfig),
    SendGrid(SendGridConfig),
    Smtp(SmtpConfig),
}

impl DeliveryConfig {
    /// Load credentials for `kind` from environment variables.
    ///
    /// # Required Environment Variables
    /// - webhook: `IFTTT_WEBHOOK_URL`
    /// - sendgrid: `SENDGRID_API_KEY`, `TIDBITS_FROM_EMAIL`, `TIDBITS_TO_EMAIL`
    /// - smtp: `GMAIL_USERNAME`, `GMAIL_APP_PASSWORD`, `TIDBITS_TO_EMAIL`
    pub fn from_env(kind: TransportKind) -> Result<Self> {
        Self::from_lookup(kind, env_lookup)
    }

    /// Load credentials for `kind` from an arbitrary key lookup.
    pub fn from_lookup<F>(kind: TransportKind, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| non_empty(lookup(key));
        let require = |key: &str| get(key).ok_or_else(|| TidbitsError::missing(key));

        match kind {
            TransportKind::Webhook => Ok(Self::Webhook(WebhookConfig {
                url: require(ENV_IFTTT_WEBHOOK_URL)?,
            })),
            TransportKind::Sendgrid => Ok(Self::SendGrid(SendGridConfig {
                api_key: require(ENV_SENDGRID_API_KEY)?,
                api_url: get(ENV_SENDGRID_API_URL)
                    .unwrap_or_else(|| DEFAULT_SENDGRID_API_URL.to_string()),
                from_email: require(ENV_FROM_EMAIL)?,
                to_email: require(ENV_TO_EMAIL)?,
            })),
            TransportKind::Smtp => {
                let username = require(ENV_GMAIL_USERNAME)?;
                let password = require(ENV_GMAIL_APP_PASSWORD)?;
                let to_email = require(ENV_TO_EMAIL)?;
                let port = match get(ENV_SMTP_PORT) {
                    Some(raw) => raw.parse().map_err(|_| {
                        TidbitsError::Config(format!("{ENV_SMTP_PORT} is not a valid port: {raw}"))
                    })?,
                    None => DEFAULT_SMTP_PORT,
                };

                Ok(Self::Smtp(SmtpConfig {
                    host: get(ENV_SMTP_HOST).unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
                    port,
                    from_email: get(ENV_FROM_EMAIL).unwrap_or_else(|| username.clone()),
                    username,
                    password,
                    to_email,
                }))
            }
        }
    }

    /// Transport these credentials belong to.
    #[must_use]
    pub const fn kind(&self) -> TransportKind {
        match self {
            Self::Webhook(_) => TransportKind::Webhook,
            Self::SendGrid(_) => TransportKind::Sendgrid,
            Self::Smtp(_) => TransportKind::Smtp,
        }
    }
}

/// Key lookup backed by the process environment.
pub fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
