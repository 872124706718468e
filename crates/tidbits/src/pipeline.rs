//! Run orchestrator.
//!
//! A run moves INIT → GENERATING → one terminal state:
//! - `Delivered`: content generated and accepted by the transport
//! - `Skipped`: content generated in test mode, nothing sent
//! - `Failed`: no content, or the transport reported a failed delivery
//!
//! Expected failures end the run in `Failed` with a logged diagnostic.
//! Anything else is logged and returned to the caller so the scheduler that
//! launched the process sees a failed run.

use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use tracing::{error, info};

use crate::config::{AppConfig, DeliveryConfig, TransportKind};
use crate::delivery::{build_transport, Email, Transport};
use crate::error::Result;
use crate::generator::{ContentGenerator, GeneratedContent, LlmCli, TextGenerator};
use crate::render::email_subject;
use crate::seed::SelectionSeed;
use crate::source::{SourceSelector, SourceUrl};

/// Whether a run delivers what it generates.
///
/// Live mode owns its transport, so a live run without one cannot exist.
#[derive(Clone)]
pub enum RunMode {
    /// Generate only; never deliver.
    Test,
    /// Generate, then deliver through the transport.
    Live(Arc<dyn Transport>),
}

impl RunMode {
    /// Resolve the mode for a run.
    ///
    /// A dry run never reads credentials. A live run loads and validates the
    /// credentials for `kind` and builds its transport, so missing settings
    /// fail here, before any generation or network traffic.
    pub fn from_lookup<F>(kind: TransportKind, dry_run: bool, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if dry_run {
            return Ok(Self::Test);
        }
        let delivery = DeliveryConfig::from_lookup(kind, lookup)?;
        Ok(Self::Live(build_transport(&delivery)?))
    }

    #[must_use]
    pub const fn is_live(&self) -> bool {
        matches!(self, Self::Live(_))
    }
}

impl fmt::Debug for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Test => f.write_str("Test"),
            Self::Live(transport) => f.debug_tuple("Live").field(&transport.name()).finish(),
        }
    }
}

/// Why a run ended in `Failed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    ContentGenerationFailed,
    DeliveryFailed(Option<String>),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ContentGenerationFailed => f.write_str("content generation failed"),
            Self::DeliveryFailed(Some(detail)) => write!(f, "delivery failed: {detail}"),
            Self::DeliveryFailed(None) => f.write_str("delivery failed"),
        }
    }
}

/// Terminal state of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    Delivered,
    Skipped,
    Failed(FailureReason),
}

impl RunState {
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// What happened in one run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub state: RunState,
    pub source: SourceUrl,
    pub seed: SelectionSeed,
    pub content: Option<GeneratedContent>,
}

/// Selects a source, generates tidbits, and delivers them.
pub struct Publisher {
    selector: SourceSelector,
    generator: ContentGenerator,
    mode: RunMode,
}

impl Publisher {
    #[must_use]
    pub fn new(selector: SourceSelector, generator: ContentGenerator, mode: RunMode) -> Self {
        Self {
            selector,
            generator,
            mode,
        }
    }

    /// Wire a publisher around the `llm` CLI described by `config`.
    pub fn from_config(config: &AppConfig, mode: RunMode) -> Result<Self> {
        let backend = Arc::new(LlmCli::new(&config.llm_program, &config.model));
        Self::with_backend(config, mode, backend)
    }

    /// Wire a publisher for `config` with an explicit generation backend.
    pub fn with_backend(
        config: &AppConfig,
        mode: RunMode,
        backend: Arc<dyn TextGenerator>,
    ) -> Result<Self> {
        Ok(Self::new(
            SourceSelector::new(config.sources.clone()),
            ContentGenerator::new(backend)?,
            mode,
        ))
    }

    /// Wire a publisher for one scheduled run.
    ///
    /// The mode is resolved from `lookup` first; the generator is only
    /// attached once live credentials are known to be usable.
    pub fn for_run<F>(
        config: &AppConfig,
        dry_run: bool,
        lookup: F,
        backend: Arc<dyn TextGenerator>,
    ) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mode = RunMode::from_lookup(config.transport, dry_run, lookup)?;
        Self::with_backend(config, mode, backend)
    }

    #[must_use]
    pub fn mode(&self) -> &RunMode {
        &self.mode
    }

    /// Draw a source and seed for a fresh run.
    #[must_use]
    pub fn draw(&self) -> (SourceUrl, SelectionSeed) {
        let mut rng = rand::thread_rng();
        let source = self.selector.choose(&mut rng).clone();
        (source, SelectionSeed::generate(&mut rng))
    }

    /// Prompt that a run with this draw would send to the model.
    pub fn prompt_for(&self, source: &SourceUrl, seed: &SelectionSeed) -> Result<String> {
        self.generator.prompt(source, seed)
    }

    /// Run the pipeline once with a random draw.
    pub async fn run(&self) -> Result<RunReport> {
        let (source, seed) = self.draw();
        self.run_with(source, seed).await
    }

    /// Run the pipeline once with a fixed draw.
    pub async fn run_with(&self, source: SourceUrl, seed: SelectionSeed) -> Result<RunReport> {
        info!(
            source = %source,
            seed = %seed,
            live = self.mode.is_live(),
            "Extracting and analyzing tidbits"
        );

        match self.execute(&source, &seed).await {
            Ok((state, content)) => Ok(RunReport {
                state,
                source,
                seed,
                content,
            }),
            Err(e) => {
                error!(source = %source, error = %e, "Error running tidbit pipeline");
                Err(e)
            }
        }
    }

    async fn execute(
        &self,
        source: &SourceUrl,
        seed: &SelectionSeed,
    ) -> Result<(RunState, Option<GeneratedContent>)> {
        let Some(content) = self.generator.generate(source, seed).await else {
            error!(source = %source, "Failed to generate content");
            return Ok((
                RunState::Failed(FailureReason::ContentGenerationFailed),
                None,
            ));
        };

        let transport = match &self.mode {
            RunMode::Test => {
                info!(
                    chars = content.as_str().len(),
                    "Test mode, skipping delivery"
                );
                return Ok((RunState::Skipped, Some(content)));
            }
            RunMode::Live(transport) => transport,
        };

        let email = Email::from_markdown(email_subject(Utc::now()), content.as_str());
        let result = transport.deliver(&email).await?;

        let state = if result.success {
            info!(transport = transport.name(), "Successfully sent today's tidbits");
            RunState::Delivered
        } else {
            error!(
                transport = transport.name(),
                detail = result.message.as_deref().unwrap_or("none"),
                "Failed to send tidbits"
            );
            RunState::Failed(FailureReason::DeliveryFailed(result.message))
        };

        Ok((state, Some(content)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::{DeliveryResult, MockTransport};
    use crate::error::TidbitsError;
    use crate::generator::MockTextGenerator;

    const TOOL_X: &str = "## Tool X\nA tool that does X.";

    fn generator_returning(output: Result<String>) -> ContentGenerator {
        let mut backend = MockTextGenerator::new();
        let mut output = Some(output);
        backend
            .expect_generate()
            .times(1)
            .returning(move |_| output.take().unwrap_or_else(|| Ok(String::new())));
        ContentGenerator::new(Arc::new(backend)).unwrap()
    }

    fn transport_expecting(times: usize, result: DeliveryResult) -> MockTransport {
        let mut transport = MockTransport::new();
        transport.expect_name().return_const("mock");
        transport
            .expect_deliver()
            .times(times)
            .returning(move |_| Ok(result.clone()));
        transport
    }

    fn publisher(generator: ContentGenerator, mode: RunMode) -> Publisher {
        Publisher::new(SourceSelector::new(vec!["URL_A".into()]), generator, mode)
    }

    fn fixed_seed() -> SelectionSeed {
        SelectionSeed::new([12, 57, 90]).unwrap()
    }

    #[tokio::test]
    async fn test_generation_failure_never_delivers() {
        let generator =
            generator_returning(Err(TidbitsError::Generation("exit code 1".to_string())));
        let transport = transport_expecting(0, DeliveryResult::delivered());
        let publisher = publisher(generator, RunMode::Live(Arc::new(transport)));

        let report = publisher.run_with("URL_A".into(), fixed_seed()).await.unwrap();

        assert_eq!(
            report.state,
            RunState::Failed(FailureReason::ContentGenerationFailed)
        );
        assert!(report.content.is_none());
    }

    #[tokio::test]
    async fn test_test_mode_skips_delivery() {
        let publisher = publisher(generator_returning(Ok(TOOL_X.to_string())), RunMode::Test);

        let report = publisher.run_with("URL_A".into(), fixed_seed()).await.unwrap();

        assert_eq!(report.state, RunState::Skipped);
        assert_eq!(report.content.unwrap().as_str(), TOOL_X);
    }

    #[tokio::test]
    async fn test_live_mode_delivers_once_with_rendered_html() {
        let mut transport = MockTransport::new();
        transport.expect_name().return_const("mock");
        transport
            .expect_deliver()
            .withf(|email| {
                email.html.contains("<h2>Tool X</h2>")
                    && email.text == TOOL_X
                    && email.subject.starts_with("Daily Tidbits: ")
            })
            .times(1)
            .returning(|_| Ok(DeliveryResult::delivered()));

        let publisher = publisher(
            generator_returning(Ok(TOOL_X.to_string())),
            RunMode::Live(Arc::new(transport)),
        );

        let report = publisher.run_with("URL_A".into(), fixed_seed()).await.unwrap();
        assert_eq!(report.state, RunState::Delivered);
    }

    #[tokio::test]
    async fn test_rejected_delivery_is_failed_state() {
        let transport = transport_expecting(1, DeliveryResult::failed("Webhook returned 500"));
        let publisher = publisher(
            generator_returning(Ok(TOOL_X.to_string())),
            RunMode::Live(Arc::new(transport)),
        );

        let report = publisher.run_with("URL_A".into(), fixed_seed()).await.unwrap();

        assert_eq!(
            report.state,
            RunState::Failed(FailureReason::DeliveryFailed(Some(
                "Webhook returned 500".to_string()
            )))
        );
        assert!(report.state.is_failure());
    }

    #[tokio::test]
    async fn test_unexpected_transport_error_propagates() {
        let mut transport = MockTransport::new();
        transport.expect_name().return_const("mock");
        transport
            .expect_deliver()
            .times(1)
            .returning(|_| Err(TidbitsError::Config("Invalid to email address".to_string())));

        let publisher = publisher(
            generator_returning(Ok(TOOL_X.to_string())),
            RunMode::Live(Arc::new(transport)),
        );

        let err = publisher
            .run_with("URL_A".into(), fixed_seed())
            .await
            .unwrap_err();
        assert!(matches!(err, TidbitsError::Config(_)));
    }

    #[tokio::test]
    async fn test_run_draws_from_selector() {
        let publisher = publisher(generator_returning(Ok(TOOL_X.to_string())), RunMode::Test);

        let report = publisher.run().await.unwrap();

        assert_eq!(report.source.as_str(), "URL_A");
        assert!(report.seed.positions().iter().all(|p| (1..=100).contains(p)));
    }

    #[test]
    fn test_failure_reason_messages() {
        assert_eq!(
            FailureReason::ContentGenerationFailed.to_string(),
            "content generation failed"
        );
        assert_eq!(
            FailureReason::DeliveryFailed(Some("401".into())).to_string(),
            "delivery failed: 401"
        );
    }

    #[test]
    fn test_dry_run_mode_needs_no_credentials() {
        let mode = RunMode::from_lookup(TransportKind::Smtp, true, |_| None).unwrap();
        assert!(!mode.is_live());
    }

    #[test]
    fn test_live_mode_requires_credentials() {
        let err = RunMode::from_lookup(TransportKind::Webhook, false, |_| None).unwrap_err();
        assert!(matches!(err, TidbitsError::Config(_)));
        assert!(err.to_string().contains("IFTTT_WEBHOOK_URL"));
    }

    #[test]
    fn test_live_mode_builds_configured_transport() {
        let mode = RunMode::from_lookup(TransportKind::Webhook, false, |key| {
            (key == "IFTTT_WEBHOOK_URL")
                .then(|| "https://maker.ifttt.com/trigger/tidbits".to_string())
        })
        .unwrap();
        assert_eq!(format!("{mode:?}"), "Live(\"webhook\")");
    }

    #[test]
    fn test_run_mode_debug_names_transport() {
        let transport = transport_expecting(0, DeliveryResult::delivered());
        let mode = RunMode::Live(Arc::new(transport));

        assert!(mode.is_live());
        assert_eq!(format!("{mode:?}"), "Live(\"mock\")");
        assert_eq!(format!("{:?}", RunMode::Test), "Test");
    }
}
