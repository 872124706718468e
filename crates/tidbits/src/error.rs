//! Error types for the tidbits pipeline.

use thiserror::Error;

/// Errors raised by tidbits components.
///
/// `Generation` is an expected failure mode: the generator recovers from it
/// locally and the run ends in a failed terminal state. Transports report
/// provider and network failures as a failed `DeliveryResult` instead of an
/// error. Everything else reaching the orchestrator is treated as an
/// unexpected fault and returned to the caller.
#[derive(Debug, Error)]
pub enum TidbitsError {
    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// External text generation failed
    #[error("Generation failed: {0}")]
    Generation(String),

    /// Email message could not be built
    #[error("Email build error: {0}")]
    Email(#[from] lettre::error::Error),

    /// Prompt template failed to compile
    #[error("Template error: {0}")]
    Template(#[from] handlebars::TemplateError),

    /// Prompt template failed to render
    #[error("Template render error: {0}")]
    Render(#[from] handlebars::RenderError),
}

impl TidbitsError {
    /// Shorthand for a missing environment variable.
    pub(crate) fn missing(var: &str) -> Self {
        Self::Config(format!("{var} environment variable not set"))
    }
}

/// Result alias used across the crate.
pub type Result<T, E = TidbitsError> = std::result::Result<T, E>;
