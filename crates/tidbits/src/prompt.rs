//! Prompt template for tidbit generation.

use handlebars::Handlebars;
use serde::Serialize;

use crate::error::Result;
use crate::seed::SelectionSeed;
use crate::source::SourceUrl;

const TIDBITS_TEMPLATE_NAME: &str = "tidbits";

/// Renders the generation prompt for a source and seed.
pub struct PromptBuilder {
    handlebars: Handlebars<'static>,
}

#[derive(Serialize)]
struct PromptData<'a> {
    url: &'a str,
    positions: String,
}

impl PromptBuilder {
    /// Create a builder with the embedded template.
    pub fn new() -> Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        // Plain text prompt, not HTML
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars.register_template_string(TIDBITS_TEMPLATE_NAME, TIDBITS_TEMPLATE)?;
        Ok(Self { handlebars })
    }

    /// Render the prompt.
    pub fn build(&self, source: &SourceUrl, seed: &SelectionSeed) -> Result<String> {
        let data = PromptData {
            url: source.as_str(),
            positions: seed.to_string(),
        };
        Ok(self.handlebars.render(TIDBITS_TEMPLATE_NAME, &data)?)
    }
}

const TIDBITS_TEMPLATE: &str = r"Go to this URL and read the content: {{url}}

You are a helpful assistant that extracts and explains interesting tools and commands from a README-style list.

To ensure random selection:
1. Divide the tools/commands in the document into roughly 100 segments.
2. Pick the three tools/commands closest to these positions: {{positions}}
3. If a position points at a tool you already picked, or at one very similar to it, take the next different tool in the list instead. Prefer tools from different sections.

For each tool/command, provide:
- A clear explanation of what it does
- A practical example of how to use it
- Any important considerations or warnings

Format the response as a friendly email to a developer or sysadmin, written in Markdown:
- Start with a short greeting
- Use one `##` heading per tool, named after the tool
- Put commands and examples in fenced code blocks, and short commands in inline code
- End with a brief sign-off

Keep the explanations concise but informative. Output only the email body.";
