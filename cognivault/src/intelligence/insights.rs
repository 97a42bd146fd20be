use std::collections::BTreeMap;

use crate::llm::prompts::{insights_prompt, TimelineDigest};
use crate::llm::LlmProvider;
use crate::models::{EmotionPoint, KnowledgeEvolution, TimelineEvent, TopicSpikes};

const EMPTY_TIMELINE_MESSAGE: &str = "Start uploading content to see your learning journey unfold!";
const LLM_FAILURE_MESSAGE: &str =
    "Your learning journey shows continuous growth. Keep exploring new topics!";

/// Everything the insight text is derived from.
pub struct TimelineSnapshot<'a> {
    pub events: &'a [TimelineEvent],
    pub topic_spikes: &'a TopicSpikes,
    pub emotion_trend: &'a [EmotionPoint],
    pub knowledge_evolution: &'a KnowledgeEvolution,
}

/// Produces a short narrative about a user's timeline, with the LLM when
/// one is configured and a templated summary otherwise.
pub struct InsightGenerator {
    llm: LlmProvider,
}

impl InsightGenerator {
    pub fn new(llm: LlmProvider) -> Self {
        Self { llm }
    }

    pub async fn generate(&self, snapshot: &TimelineSnapshot<'_>) -> String {
        if !self.llm.is_available() {
            return template_insight(snapshot.events.len(), snapshot.topic_spikes);
        }

        let digest = TimelineDigest {
            event_count: snapshot.events.len(),
            topic_spikes_json: serde_json::to_string(snapshot.topic_spikes).unwrap_or_default(),
            emotion_point_count: snapshot.emotion_trend.len(),
            topic_count: snapshot.knowledge_evolution.nodes.len(),
            new_branch_count: snapshot.knowledge_evolution.new_branches.len(),
        };

        match self.llm.complete(&insights_prompt(&digest), None).await {
            Ok(reply) => {
                tracing::debug!(reply_len = reply.len(), "Generated LLM insights");
                reply.trim().to_string()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Insight generation failed, using fallback");
                if snapshot.events.is_empty() {
                    EMPTY_TIMELINE_MESSAGE.to_string()
                } else {
                    LLM_FAILURE_MESSAGE.to_string()
                }
            }
        }
    }
}

/// Up to `limit` topics by total count across all months; ties broken
/// alphabetically.
pub fn top_topics(spikes: &TopicSpikes, limit: usize) -> Vec<String> {
    let mut totals: BTreeMap<&str, u32> = BTreeMap::new();
    for counts in spikes.values() {
        for (topic, count) in counts {
            *totals.entry(topic.as_str()).or_insert(0) += count;
        }
    }

    let mut ranked: Vec<(&str, u32)> = totals.into_iter().collect();
    // BTreeMap iteration is alphabetical and the sort is stable.
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
        .into_iter()
        .take(limit)
        .map(|(topic, _)| topic.to_string())
        .collect()
}

fn template_insight(event_count: usize, spikes: &TopicSpikes) -> String {
    if event_count == 0 {
        return EMPTY_TIMELINE_MESSAGE.to_string();
    }

    let topics = top_topics(spikes, 3);
    if topics.is_empty() {
        format!("You've created {event_count} learning events. Keep exploring!")
    } else {
        format!(
            "You've created {event_count} learning events. Your top topics are: {}. Keep exploring!",
            topics.join(", ")
        )
    }
}
