use async_trait::async_trait;
use eyre::{Result, bail};
use log::{debug, warn};

use crate::config::Config;

const SUMMARY_INSTRUCTIONS: &str = "Please provide a comprehensive summary of the following YouTube video transcript.
Focus on the main points, key insights, and important information discussed in the video.
Make the summary clear, concise, and well-structured with bullet points for key topics.";

pub const NO_SUMMARY_FALLBACK: &str = "Failed to generate summary.";

/// A generative-text service that completes a single prompt
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Returns `Ok(None)` when the service answered without any text
    async fn generate(&self, prompt: &str) -> Result<Option<String>>;
}

/// Result of asking the generator for a summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryOutcome {
    Generated(String),
    Failed(String),
}

/// Embed the transcript verbatim after the fixed summary instructions
pub fn build_prompt(transcript_text: &str) -> String {
    format!("{SUMMARY_INSTRUCTIONS}\n\nTranscript:\n{transcript_text}\n")
}

/// Summarize transcript text with one call to the generator
pub async fn generate_summary<G>(generator: &G, transcript_text: &str) -> SummaryOutcome
where
    G: TextGenerator + ?Sized,
{
    if transcript_text.trim().is_empty() {
        return SummaryOutcome::Failed("Cannot summarize an empty transcript.".to_string());
    }

    let prompt = build_prompt(transcript_text);
    debug!("Requesting summary for {} chars of transcript", transcript_text.len());

    match generator.generate(&prompt).await {
        Ok(Some(text)) if !text.is_empty() => SummaryOutcome::Generated(text),
        Ok(_) => {
            warn!("Generator returned no text");
            SummaryOutcome::Failed(NO_SUMMARY_FALLBACK.to_string())
        }
        Err(e) => {
            warn!("Summary generation failed: {e:#}");
            SummaryOutcome::Failed(format!("Error generating summary: {e:#}"))
        }
    }
}

/// Google Gemini `generateContent` client
#[derive(Debug, Clone)]
pub struct Gemini {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    api_base: String,
}

impl Gemini {
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl TextGenerator for Gemini {
    async fn generate(&self, prompt: &str) -> Result<Option<String>> {
        let Some(api_key) = self.api_key.as_deref() else {
            bail!("GOOGLE_API_KEY environment variable not set (required for Gemini summarization)");
        };

        debug!("Summarizing via Gemini API with model {}", self.model);

        let url = format!("{}/v1beta/models/{}:generateContent", self.api_base, self.model);
        let body = serde_json::json!({
            "contents": [
                {
                    "parts": [
                        { "text": prompt }
                    ]
                }
            ]
        });

        let resp = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!("Gemini API returned {status}: {body}");
        }

        let json: serde_json::Value = resp.json().await?;
        Ok(extract_gemini_text(&json))
    }
}

fn extract_gemini_text(json: &serde_json::Value) -> Option<String> {
    let parts = json
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())?;

    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text")?.as_str())
        .collect();

    if text.is_empty() { None } else { Some(text) }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Records every prompt and replies with a canned answer
    struct Recorder {
        reply: std::result::Result<Option<&'static str>, &'static str>,
        prompts: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn new(reply: std::result::Result<Option<&'static str>, &'static str>) -> Self {
            Self {
                reply,
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TextGenerator for Recorder {
        async fn generate(&self, prompt: &str) -> Result<Option<String>> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match self.reply {
                Ok(text) => Ok(text.map(str::to_string)),
                Err(msg) => Err(eyre::eyre!("{msg}")),
            }
        }
    }

    #[test]
    fn test_build_prompt_appends_transcript() {
        let prompt = build_prompt("Never gonna give");
        assert!(prompt.starts_with("Please provide a comprehensive summary"));
        assert!(prompt.contains("bullet points"));
        assert!(prompt.ends_with("Transcript:\nNever gonna give\n"));
    }

    #[tokio::test]
    async fn test_generate_summary_single_request_unmodified() {
        let generator = Recorder::new(Ok(Some("  * point one\n* point two  ")));
        let outcome = generate_summary(&generator, "Never gonna give").await;
        assert_eq!(
            outcome,
            SummaryOutcome::Generated("  * point one\n* point two  ".to_string())
        );
        let prompts = generator.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Never gonna give"));
    }

    #[tokio::test]
    async fn test_generate_summary_no_text_fallback() {
        let generator = Recorder::new(Ok(None));
        let outcome = generate_summary(&generator, "some words").await;
        assert_eq!(outcome, SummaryOutcome::Failed(NO_SUMMARY_FALLBACK.to_string()));
    }

    #[tokio::test]
    async fn test_generate_summary_empty_text_fallback() {
        let generator = Recorder::new(Ok(Some("")));
        let outcome = generate_summary(&generator, "some words").await;
        assert_eq!(outcome, SummaryOutcome::Failed(NO_SUMMARY_FALLBACK.to_string()));
    }

    #[tokio::test]
    async fn test_generate_summary_call_failure() {
        let generator = Recorder::new(Err("quota exceeded"));
        let outcome = generate_summary(&generator, "some words").await;
        assert_eq!(
            outcome,
            SummaryOutcome::Failed("Error generating summary: quota exceeded".to_string())
        );
    }

    #[tokio::test]
    async fn test_generate_summary_skips_empty_transcript() {
        let generator = Recorder::new(Ok(Some("unused")));
        let outcome = generate_summary(&generator, "   ").await;
        assert!(matches!(outcome, SummaryOutcome::Failed(_)));
        assert!(generator.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_gemini_without_key_fails_at_call() {
        let gemini = Gemini::new(reqwest::Client::new(), &Config::default());
        let err = gemini.generate("hello").await.unwrap_err();
        assert!(err.to_string().contains("GOOGLE_API_KEY"));
    }

    #[test]
    fn test_extract_gemini_text() {
        let json = serde_json::json!({
            "candidates": [
                {
                    "content": {
                        "role": "model",
                        "parts": [
                            { "text": "Here is " },
                            { "text": "the summary." }
                        ]
                    }
                }
            ]
        });
        assert_eq!(extract_gemini_text(&json).as_deref(), Some("Here is the summary."));
    }

    #[test]
    fn test_extract_gemini_text_empty() {
        assert!(extract_gemini_text(&serde_json::json!({ "candidates": [] })).is_none());
        assert!(extract_gemini_text(&serde_json::json!({})).is_none());
    }
}
