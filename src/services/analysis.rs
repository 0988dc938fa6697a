// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Journal analysis: prompt construction, provider call and tolerant parsing
//! of the generated response.

use crate::error::AppError;
use crate::models::{AnalysisEntry, AnalysisResult};
use crate::services::gemini::TextGenerator;
use std::sync::Arc;

/// Characters of raw provider text kept in a degraded summary.
const DEGRADED_SUMMARY_CHARS: usize = 200;
const UNKNOWN_SENTIMENT: &str = "unknown";
const UNPARSEABLE_INSIGHT: &str = "Could not parse structured insights";
const UNEXPECTED_FORMAT_INSIGHT: &str = "Generated response was not in the expected format";

/// Orchestrates analysis requests against a [`TextGenerator`].
#[derive(Clone)]
pub struct AnalysisService {
    generator: Arc<dyn TextGenerator>,
}

impl AnalysisService {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Analyze a batch of entries.
    ///
    /// Empty input is rejected before any provider call. Provider transport
    /// failures propagate; malformed provider output yields a degraded result.
    pub async fn analyze(&self, entries: &[AnalysisEntry]) -> Result<AnalysisResult, AppError> {
        if entries.is_empty() {
            return Err(AppError::Analysis(
                "entries must be a non-empty list".to_string(),
            ));
        }

        let prompt = build_prompt(entries);
        let text = self.generator.generate(&prompt).await?;
        let result = parse_analysis(&text);

        tracing::info!(
            entries = entries.len(),
            sentiment = %result.sentiment,
            insights = result.insights.len(),
            "Journal analysis complete"
        );
        Ok(result)
    }
}

/// Render entries into the fixed analysis prompt.
pub fn build_prompt(entries: &[AnalysisEntry]) -> String {
    let journal_content = entries
        .iter()
        .map(|entry| {
            let date = entry
                .written_at()
                .map(|at| at.format("%-m/%-d/%Y").to_string())
                .unwrap_or_else(|| "Unknown date".to_string());
            format!("Date: {}\nEntry: {}", date, entry.content)
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        r#"Analyze the following journal entries and provide:
1. A brief summary of the overall themes
2. Three key insights about the person based on their writing
3. The general sentiment (positive, negative, or neutral)

Journal entries:
{journal_content}

Format your response as JSON with the following structure:
{{
  "summary": "overall summary",
  "insights": ["insight 1", "insight 2", "insight 3"],
  "sentiment": "positive/negative/neutral"
}}
"#
    )
}

/// Parse provider text into an [`AnalysisResult`]. Never fails.
///
/// Candidates are tried in order: a ```` ```json ```` fenced block, any fenced
/// block, then the first balanced `{...}` in the text.
pub fn parse_analysis(text: &str) -> AnalysisResult {
    let candidates = [
        fenced_block(text, "```json"),
        fenced_block(text, "```"),
        balanced_object(text),
    ];

    let mut found_candidate = false;
    for candidate in candidates.into_iter().flatten() {
        found_candidate = true;
        match serde_json::from_str::<AnalysisResult>(candidate) {
            Ok(result) => return result,
            Err(e) => tracing::debug!(error = %e, "Analysis candidate is not valid JSON"),
        }
    }

    if found_candidate {
        tracing::warn!("Failed to parse analysis response as JSON");
    } else {
        tracing::warn!("Analysis response contained no JSON");
    }

    degraded(
        text,
        if found_candidate {
            UNPARSEABLE_INSIGHT
        } else {
            UNEXPECTED_FORMAT_INSIGHT
        },
    )
}

fn degraded(text: &str, insight: &str) -> AnalysisResult {
    let head: String = text.chars().take(DEGRADED_SUMMARY_CHARS).collect();
    AnalysisResult {
        summary: format!("{head}..."),
        insights: vec![insight.to_string()],
        sentiment: UNKNOWN_SENTIMENT.to_string(),
    }
}

/// Body of the first block opened by `opener` followed by a newline.
fn fenced_block<'a>(text: &'a str, opener: &str) -> Option<&'a str> {
    let start = text.find(&format!("{opener}\n"))? + opener.len() + 1;
    let rest = &text[start..];
    let end = rest.find("\n```")?;
    Some(&rest[..end])
}

/// First brace-balanced object, skipping braces inside JSON strings.
fn balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::analysis::EntryInstant;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CannedGenerator {
        reply: Result<String, String>,
        calls: AtomicUsize,
    }

    impl CannedGenerator {
        fn replying(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.to_string()),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl TextGenerator for CannedGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone().map_err(AppError::Generation)
        }
    }

    fn entry(content: &str, seconds: i64) -> AnalysisEntry {
        AnalysisEntry {
            content: content.to_string(),
            created_at: Some(EntryInstant::Timestamp {
                seconds,
                nanoseconds: 0,
            }),
            timestamp: None,
        }
    }

    #[test]
    fn fenced_json_is_parsed() {
        let text = "Here you go:\n```json\n{\"summary\":\"calm\",\"insights\":[\"a\",\"b\",\"c\"],\"sentiment\":\"positive\"}\n```\n";
        let result = parse_analysis(text);

        assert_eq!(result.summary, "calm");
        assert_eq!(result.insights, vec!["a", "b", "c"]);
        assert_eq!(result.sentiment, "positive");
    }

    #[test]
    fn generic_fence_and_bare_object_are_parsed() {
        let fenced = "```\n{\"summary\":\"s\",\"insights\":[],\"sentiment\":\"neutral\"}\n```";
        assert_eq!(parse_analysis(fenced).sentiment, "neutral");

        let bare = "Sure! {\"summary\":\"a {braced} note\",\"insights\":[\"x\"],\"sentiment\":\"negative\"} hope that helps";
        let result = parse_analysis(bare);
        assert_eq!(result.summary, "a {braced} note");
        assert_eq!(result.sentiment, "negative");
    }

    #[test]
    fn text_without_json_degrades() {
        let text = "x".repeat(250);
        let result = parse_analysis(&text);

        assert_eq!(result.sentiment, "unknown");
        assert_eq!(result.summary, format!("{}...", "x".repeat(200)));
        assert_eq!(result.insights, vec![UNEXPECTED_FORMAT_INSIGHT]);
    }

    #[test]
    fn malformed_json_degrades_with_parse_insight() {
        let result = parse_analysis("```json\n{\"summary\": oops}\n```");

        assert_eq!(result.sentiment, "unknown");
        assert_eq!(result.insights, vec![UNPARSEABLE_INSIGHT]);
        assert!(result.summary.ends_with("..."));
    }

    #[test]
    fn prompt_lists_each_entry_with_its_date() {
        let prompt = build_prompt(&[entry("first", 1_700_000_000), entry("second", 1_700_086_400)]);

        assert!(prompt.contains("Date: 11/14/2023\nEntry: first\n\nDate: 11/15/2023\nEntry: second"));
        assert!(prompt.contains("\"sentiment\": \"positive/negative/neutral\""));
    }

    #[tokio::test]
    async fn empty_input_is_rejected_without_calling_provider() {
        let generator = CannedGenerator::replying("{}");
        let service = AnalysisService::new(generator.clone());

        let err = service.analyze(&[]).await.unwrap_err();
        assert!(matches!(err, AppError::Analysis(_)));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn provider_failure_propagates() {
        let generator = Arc::new(CannedGenerator {
            reply: Err("timeout".to_string()),
            calls: AtomicUsize::new(0),
        });
        let service = AnalysisService::new(generator);

        let err = service.analyze(&[entry("x", 0)]).await.unwrap_err();
        assert!(matches!(err, AppError::Generation(_)));
    }
}
