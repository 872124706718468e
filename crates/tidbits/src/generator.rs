//! Content generation through an external LLM CLI.
//!
//! The model call is an injected [`TextGenerator`] so the pipeline can run
//! against a deterministic stub. The production implementation, [`LlmCli`],
//! shells out to the `llm` tool and captures its stdout.

use async_trait::async_trait;
use std::fmt;
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::{Result, TidbitsError};
use crate::prompt::PromptBuilder;
use crate::seed::SelectionSeed;
use crate::source::SourceUrl;

/// Default generation CLI.
pub const DEFAULT_LLM_PROGRAM: &str = "llm";

/// Default model identifier passed to the CLI.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";

/// Text produced by the model; never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedContent(String);

impl GeneratedContent {
    /// Wrap model output, rejecting blank text.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            None
        } else {
            Some(Self(text))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for GeneratedContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Capability that turns a prompt into text.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate text for `prompt`, failing with [`TidbitsError::Generation`].
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Runs `<program> -m <model> -- <prompt>` and returns stdout.
#[derive(Debug, Clone)]
pub struct LlmCli {
    program: String,
    model: String,
}

impl LlmCli {
    #[must_use]
    pub fn new(program: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            model: model.into(),
        }
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Build the CLI arguments. The prompt is always the final positional
    /// argument, after `--`.
    #[must_use]
    pub fn build_args(&self, prompt: &str) -> Vec<String> {
        vec![
            "-m".to_string(),
            self.model.clone(),
            "--".to_string(),
            prompt.to_string(),
        ]
    }
}

impl Default for LlmCli {
    fn default() -> Self {
        Self::new(DEFAULT_LLM_PROGRAM, DEFAULT_MODEL)
    }
}

#[async_trait]
impl TextGenerator for LlmCli {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let args = self.build_args(prompt);

        debug!(
            cli = %self.program,
            model = %self.model,
            prompt_len = prompt.len(),
            "Executing LLM CLI"
        );

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                TidbitsError::Generation(format!(
                    "Failed to spawn CLI process '{}': {e}",
                    self.program
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(
                exit_code = ?output.status.code(),
                stderr = %stderr.trim(),
                "LLM CLI process failed"
            );
            return Err(TidbitsError::Generation(format!(
                "CLI process failed with exit code {}: {}",
                output.status.code().unwrap_or(-1),
                stderr.trim()
            )));
        }

        String::from_utf8(output.stdout)
            .map_err(|e| TidbitsError::Generation(format!("CLI output is not valid UTF-8: {e}")))
    }
}

/// Builds the prompt for a draw and asks the backend to answer it.
pub struct ContentGenerator {
    prompts: PromptBuilder,
    backend: Arc<dyn TextGenerator>,
}

impl ContentGenerator {
    pub fn new(backend: Arc<dyn TextGenerator>) -> Result<Self> {
        Ok(Self {
            prompts: PromptBuilder::new()?,
            backend,
        })
    }

    /// Render the prompt without calling the model.
    pub fn prompt(&self, source: &SourceUrl, seed: &SelectionSeed) -> Result<String> {
        self.prompts.build(source, seed)
    }

    /// Generate tidbits for `source` and `seed`.
    ///
    /// Every failure is logged and collapsed to `None`; callers only see
    /// whether content exists.
    pub async fn generate(
        &self,
        source: &SourceUrl,
        seed: &SelectionSeed,
    ) -> Option<GeneratedContent> {
        let prompt = match self.prompt(source, seed) {
            Ok(prompt) => prompt,
            Err(e) => {
                warn!(error = %e, "Failed to render prompt");
                return None;
            }
        };

        info!(source = %source, seed = %seed, "Generating tidbits");

        match self.backend.generate(&prompt).await {
            Ok(text) => {
                let content = GeneratedContent::new(text);
                if content.is_none() {
                    warn!(source = %source, "Generator returned empty output");
                }
                content
            }
            Err(e) => {
                warn!(source = %source, error = %e, "Error running LLM tool");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draw() -> (SourceUrl, SelectionSeed) {
        (
            SourceUrl::from("URL_A"),
            SelectionSeed::new([12, 57, 90]).unwrap(),
        )
    }

    #[test]
    fn test_build_args_prompt_is_last() {
        let cli = LlmCli::default();
        let args = cli.build_args("-starts with a dash");

        assert_eq!(
            args,
            vec!["-m", DEFAULT_MODEL, "--", "-starts with a dash"]
        );
    }

    #[test]
    fn test_generated_content_rejects_blank() {
        assert!(GeneratedContent::new("").is_none());
        assert!(GeneratedContent::new("  \n\t").is_none());
        assert_eq!(
            GeneratedContent::new("## Tool X").unwrap().as_str(),
            "## Tool X"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_llm_cli_captures_stdout() {
        // `echo` stands in for the model and prints its arguments back.
        let cli = LlmCli::new("echo", "test-model");
        let output = cli.generate("hello tidbits").await.unwrap();

        assert_eq!(output.trim(), "-m test-model -- hello tidbits");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_llm_cli_nonzero_exit_is_generation_failure() {
        let cli = LlmCli::new("false", "test-model");
        let err = cli.generate("anything").await.unwrap_err();

        assert!(matches!(err, TidbitsError::Generation(_)));
        assert!(err.to_string().contains("exit code 1"));
    }

    #[tokio::test]
    async fn test_llm_cli_missing_program_is_generation_failure() {
        let cli = LlmCli::new("definitely-not-an-installed-llm-cli", "m");
        let err = cli.generate("anything").await.unwrap_err();

        assert!(matches!(err, TidbitsError::Generation(_)));
    }

    #[tokio::test]
    async fn test_content_generator_passes_prompt_to_backend() {
        let mut backend = MockTextGenerator::new();
        backend
            .expect_generate()
            .withf(|prompt| prompt.contains("URL_A") && prompt.contains("[12, 57, 90]"))
            .times(1)
            .returning(|_| Ok("## Tool X\nexplained".to_string()));

        let generator = ContentGenerator::new(Arc::new(backend)).unwrap();
        let (source, seed) = draw();

        let content = generator.generate(&source, &seed).await.unwrap();
        assert_eq!(content.as_str(), "## Tool X\nexplained");
    }

    #[tokio::test]
    async fn test_content_generator_failure_is_absent() {
        let mut backend = MockTextGenerator::new();
        backend
            .expect_generate()
            .times(1)
            .returning(|_| Err(TidbitsError::Generation("model unavailable".into())));

        let generator = ContentGenerator::new(Arc::new(backend)).unwrap();
        let (source, seed) = draw();

        assert!(generator.generate(&source, &seed).await.is_none());
    }

    #[tokio::test]
    async fn test_content_generator_blank_output_is_absent() {
        let mut backend = MockTextGenerator::new();
        backend
            .expect_generate()
            .times(1)
            .returning(|_| Ok("\n\n".to_string()));

        let generator = ContentGenerator::new(Arc::new(backend)).unwrap();
        let (source, seed) = draw();

        assert!(generator.generate(&source, &seed).await.is_none());
    }
}
