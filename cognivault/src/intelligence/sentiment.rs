use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;

use crate::error::Result;
use crate::llm::prompts::sentiment_prompt;
use crate::llm::{CompletionOptions, LlmProvider};
use crate::models::{Chunk, Sentiment, SentimentLabel};

/// Maximum characters of chunk text used when a chunk has no summary.
pub const SENTIMENT_TEXT_LIMIT: usize = 1000;

const POSITIVE_WORDS: &[&str] = &[
    "good",
    "great",
    "excellent",
    "amazing",
    "wonderful",
    "positive",
    "success",
    "achievement",
    "learn",
    "understand",
    "insight",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bad",
    "difficult",
    "problem",
    "challenge",
    "stress",
    "confusion",
    "error",
    "fail",
    "hard",
];

/// Classifies the emotional tone of a piece of text.
#[async_trait]
pub trait SentimentOracle: Send + Sync {
    async fn classify(&self, text: &str) -> Result<Sentiment>;
}

/// Text a chunk is classified on: its summary when present, otherwise the
/// first [`SENTIMENT_TEXT_LIMIT`] characters of its text.
pub fn sentiment_input(chunk: &Chunk) -> Option<String> {
    if let Some(summary) = chunk.summary.as_deref().filter(|s| !s.trim().is_empty()) {
        return Some(summary.to_string());
    }
    chunk
        .text
        .as_deref()
        .filter(|t| !t.is_empty())
        .map(|t| t.chars().take(SENTIMENT_TEXT_LIMIT).collect())
}

/// Keyword-count classifier used when no LLM is configured.
///
/// Each keyword counts once no matter how often it occurs, and matches as a
/// substring ("learning" counts as "learn").
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordSentimentClassifier;

impl KeywordSentimentClassifier {
    pub fn classify_text(text: &str) -> Sentiment {
        let lower = text.to_lowercase();
        let positive = POSITIVE_WORDS.iter().filter(|w| lower.contains(*w)).count();
        let negative = NEGATIVE_WORDS.iter().filter(|w| lower.contains(*w)).count();

        if positive > negative {
            Sentiment::new(
                SentimentLabel::Positive,
                (0.5 + positive as f32 * 0.1).min(0.9),
            )
        } else if negative > positive {
            Sentiment::new(
                SentimentLabel::Negative,
                (0.5 - negative as f32 * 0.1).max(0.1),
            )
        } else {
            Sentiment::neutral()
        }
    }
}

#[async_trait]
impl SentimentOracle for KeywordSentimentClassifier {
    async fn classify(&self, text: &str) -> Result<Sentiment> {
        Ok(Self::classify_text(text))
    }
}

#[derive(Debug, Deserialize)]
struct LlmSentiment {
    label: Option<String>,
    score: Option<serde_json::Value>,
}

/// Asks the LLM for a `{"label", "score"}` object.
///
/// Unparseable replies classify as neutral; transport failures are
/// returned as errors for the caller to replace.
pub struct LlmSentimentClassifier {
    llm: LlmProvider,
}

impl LlmSentimentClassifier {
    pub fn new(llm: LlmProvider) -> Self {
        Self { llm }
    }

    fn parse_reply(reply: &str) -> Sentiment {
        static JSON_OBJECT: OnceLock<Option<Regex>> = OnceLock::new();
        let Some(pattern) = JSON_OBJECT.get_or_init(|| Regex::new(r"(?s)\{.*\}").ok()) else {
            return Sentiment::neutral();
        };

        let Some(found) = pattern.find(reply) else {
            tracing::debug!("Sentiment reply contained no JSON object");
            return Sentiment::neutral();
        };

        match serde_json::from_str::<LlmSentiment>(found.as_str()) {
            Ok(parsed) => {
                let label = parsed
                    .label
                    .as_deref()
                    .map(SentimentLabel::parse_lenient)
                    .unwrap_or(SentimentLabel::Neutral);
                let score = parsed
                    .score
                    .as_ref()
                    .and_then(score_from_json)
                    .unwrap_or(0.5);
                Sentiment::new(label, score)
            }
            Err(e) => {
                tracing::debug!(error = %e, "Sentiment reply was not valid JSON");
                Sentiment::neutral()
            }
        }
    }
}

fn score_from_json(value: &serde_json::Value) -> Option<f32> {
    match value {
        serde_json::Value::Number(n) => n.as_f64().map(|f| f as f32),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[async_trait]
impl SentimentOracle for LlmSentimentClassifier {
    async fn classify(&self, text: &str) -> Result<Sentiment> {
        let options = CompletionOptions {
            temperature: Some(0.0),
            max_tokens: Some(100),
        };
        let reply = self.llm.complete(&sentiment_prompt(text), Some(&options)).await?;
        Ok(Self::parse_reply(reply.trim()))
    }
}
