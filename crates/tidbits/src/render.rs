//! Email rendering: Markdown from the model to a styled HTML body.

use chrono::{DateTime, Utc};
use pulldown_cmark::{html, Options, Parser};

/// Subject line for a tidbits email sent at `at`.
#[must_use]
pub fn email_subject(at: DateTime<Utc>) -> String {
    format!("Daily Tidbits: {}", at.format("%B %d, %Y"))
}

/// Convert Markdown to an HTML fragment.
///
/// Text without Markdown syntax comes back unchanged inside a single `<p>`.
#[must_use]
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(markdown, options);
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Render Markdown into a complete HTML email document.
#[must_use]
pub fn render_email_html(subject: &str, markdown: &str) -> String {
    let body = markdown_to_html(markdown);

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>
        body {{
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, 'Helvetica Neue', sans-serif;
            line-height: 1.6;
            color: #1f2937;
            background-color: #f9fafb;
            margin: 0;
            padding: 20px;
        }}
        .container {{
            max-width: 700px;
            margin: 0 auto;
            background: #ffffff;
            border: 1px solid #e5e7eb;
            border-radius: 8px;
            padding: 24px 28px;
        }}
        h1, h2, h3 {{
            color: #111827;
            line-height: 1.3;
        }}
        h2 {{
            margin-top: 28px;
            padding-bottom: 6px;
            border-bottom: 1px solid #e5e7eb;
        }}
        code {{
            font-family: SFMono-Regular, Menlo, Consolas, 'Liberation Mono', monospace;
            font-size: 0.9em;
            background: #f3f4f6;
            border-radius: 4px;
            padding: 2px 5px;
        }}
        pre {{
            background: #111827;
            color: #e5e7eb;
            border-radius: 6px;
            padding: 14px 16px;
            overflow-x: auto;
        }}
        pre code {{
            background: none;
            color: inherit;
            padding: 0;
        }}
        blockquote {{
            border-left: 3px solid #2563eb;
            margin: 0;
            padding: 4px 16px;
            color: #4b5563;
        }}
        a {{
            color: #2563eb;
        }}
        table {{
            border-collapse: collapse;
        }}
        th, td {{
            border: 1px solid #e5e7eb;
            padding: 6px 10px;
        }}
    </style>
</head>
<body>
    <div class="container">
{body}    </div>
</body>
</html>"#,
        title = html_escape(subject),
        body = body,
    )
}

/// Simple HTML escaping for text placed outside the rendered Markdown.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
