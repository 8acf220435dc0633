pub mod gemini;
pub mod pending;

use anyhow::Result;
use async_trait::async_trait;

/// Shown when the request fails for any reason.
pub const FAILURE_MESSAGE: &str = "Failed to generate AI summary. Please check your connection.";
/// Shown when the model answers with no text.
pub const EMPTY_MESSAGE: &str = "Summary unavailable.";
pub const DEFAULT_MAX_POSTS: usize = 10;

/// Text in, text out. Implementations own transport and credentials.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, prompt: &str) -> Result<String>;
}

/// Stand-in used when no API key is configured; every request fails.
pub struct Unconfigured;

#[async_trait]
impl Summarizer for Unconfigured {
    async fn summarize(&self, _prompt: &str) -> Result<String> {
        anyhow::bail!("no summary API key configured")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryOutcome {
    Summary(String),
    Failed,
}

impl SummaryOutcome {
    pub fn message(&self) -> &str {
        match self {
            SummaryOutcome::Summary(text) => text,
            SummaryOutcome::Failed => FAILURE_MESSAGE,
        }
    }
}

pub fn build_prompt(label: &str, contents: &[String]) -> String {
    format!(
        "Review the following social media stream for the \"{}\" group. Give me a 3-sentence summary of the main narratives and sentiment. \n{}",
        label,
        contents.join("\n")
    )
}

/// Summarize at most `max_posts` contents under `label`.
///
/// Returns `None` without calling the summarizer when there is nothing to
/// summarize.
pub async fn generate(
    summarizer: &dyn Summarizer,
    label: &str,
    contents: &[String],
    max_posts: usize,
) -> Option<SummaryOutcome> {
    if contents.is_empty() {
        return None;
    }
    let capped = &contents[..contents.len().min(max_posts)];
    let prompt = build_prompt(label, capped);

    let outcome = match summarizer.summarize(&prompt).await {
        Ok(text) if text.trim().is_empty() => SummaryOutcome::Summary(EMPTY_MESSAGE.to_string()),
        Ok(text) => SummaryOutcome::Summary(text.trim().to_string()),
        Err(e) => {
            tracing::error!(label, error = %format!("{:#}", e), "failed to generate summary");
            SummaryOutcome::Failed
        }
    };
    Some(outcome)
}
