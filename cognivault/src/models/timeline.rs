use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One distinct normalized tag in a user's knowledge graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicNode {
    /// `topic_<index>`; only stable within a single build.
    pub id: String,
    pub label: String,
    /// Number of chunks carrying the topic.
    pub count: usize,
    pub first_seen: DateTime<Utc>,
}

/// Co-occurrence between two topics. Only emitted once per unordered pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub weight: usize,
}

/// A topic that first appeared after the early part of the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBranch {
    pub topic: String,
    pub date: DateTime<Utc>,
    pub related_topics: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeEvolution {
    pub nodes: Vec<TopicNode>,
    pub edges: Vec<TopicEdge>,
    pub new_branches: Vec<NewBranch>,
}

impl KnowledgeEvolution {
    pub fn empty() -> Self {
        Self::default()
    }
}

/// A chunk that diverged from everything before it and introduced a new tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchTrigger {
    pub date: DateTime<Utc>,
    pub trigger: String,
    pub led_to: Vec<String>,
}

/// Chronological view of a single chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub chunk_id: String,
    pub file_id: String,
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
    pub tags: Vec<String>,
    pub summary: String,
    pub text_snippet: String,
}

/// `YYYY-MM` -> normalized tag -> number of chunks.
pub type TopicSpikes = BTreeMap<String, BTreeMap<String, u32>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    /// Lenient parse of an oracle label; anything unknown is neutral.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "positive" => SentimentLabel::Positive,
            "negative" => SentimentLabel::Negative,
            _ => SentimentLabel::Neutral,
        }
    }
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SentimentLabel::Positive => write!(f, "positive"),
            SentimentLabel::Negative => write!(f, "negative"),
            SentimentLabel::Neutral => write!(f, "neutral"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    pub label: SentimentLabel,
    /// In `[0, 1]`.
    pub score: f32,
}

impl Sentiment {
    pub fn new(label: SentimentLabel, score: f32) -> Self {
        Self {
            label,
            score: score.clamp(0.0, 1.0),
        }
    }

    pub fn neutral() -> Self {
        Self::new(SentimentLabel::Neutral, 0.5)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionPoint {
    pub date: DateTime<Utc>,
    pub sentiment: SentimentLabel,
    pub score: f32,
}
