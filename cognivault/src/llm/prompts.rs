//! Prompt templates for LLM-backed timeline features
//!
//! Plain `format!()` interpolation; callers truncate their inputs.

/// Maximum characters of chunk content sent for sentiment classification.
pub const SENTIMENT_CONTENT_LIMIT: usize = 500;

/// Maximum characters of the topic spikes JSON embedded in the insights prompt.
pub const INSIGHTS_SPIKES_LIMIT: usize = 500;

/// Generate a prompt asking for a `{"label", "score"}` sentiment object
///
/// # Arguments
/// * `content` - Text to classify; only the first [`SENTIMENT_CONTENT_LIMIT`]
///   characters are included
///
/// # Example
/// ```
/// use cognivault::llm::prompts::sentiment_prompt;
///
/// let prompt = sentiment_prompt("I finally understand recursion");
/// assert!(prompt.contains("recursion"));
/// ```
pub fn sentiment_prompt(content: &str) -> String {
    let content: String = content.chars().take(SENTIMENT_CONTENT_LIMIT).collect();
    format!(
        r#"Analyze the sentiment of this text. Return ONLY a JSON object with this exact structure:
{{
  "label": "positive|negative|neutral",
  "score": 0.0-1.0
}}

Text: {content}"#
    )
}

/// Aggregate numbers the insights prompt is built from.
#[derive(Debug, Clone, Default)]
pub struct TimelineDigest {
    pub event_count: usize,
    pub topic_spikes_json: String,
    pub emotion_point_count: usize,
    pub topic_count: usize,
    pub new_branch_count: usize,
}

/// Generate a prompt asking for 2-3 short observations about a user's timeline
pub fn insights_prompt(digest: &TimelineDigest) -> String {
    let spikes: String = digest
        .topic_spikes_json
        .chars()
        .take(INSIGHTS_SPIKES_LIMIT)
        .collect();
    format!(
        r#"Analyze this user's learning timeline data and provide 2-3 insightful observations about their learning evolution. Be concise and encouraging.

Events: {events} total learning events
Topic Spikes: {spikes}
Emotion Trend: {emotions} sentiment data points
Knowledge Evolution: {topics} topics, {branches} new branches

Provide insights in a friendly, encouraging tone. Focus on:
- Learning patterns
- Topic evolution
- Emotional journey
- Knowledge growth

Return ONLY the insights text, no JSON or formatting."#,
        events = digest.event_count,
        emotions = digest.emotion_point_count,
        topics = digest.topic_count,
        branches = digest.new_branch_count,
    )
}
