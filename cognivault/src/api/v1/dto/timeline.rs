//! Timeline response DTOs for the v1 API.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models;

/// One chunk as shown on the timeline.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEventResponse {
    pub chunk_id: String,
    /// `"direct_input"` when the chunk did not come from a file.
    pub file_id: String,
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
    /// Tags exactly as ingested.
    pub tags: Vec<String>,
    pub summary: String,
    /// First two lines of text, at most 200 characters.
    pub text_snippet: String,
}

impl From<models::TimelineEvent> for TimelineEventResponse {
    fn from(event: models::TimelineEvent) -> Self {
        Self {
            chunk_id: event.chunk_id,
            file_id: event.file_id,
            user_id: event.user_id,
            timestamp: event.timestamp,
            tags: event.tags,
            summary: event.summary,
            text_snippet: event.text_snippet,
        }
    }
}

/// Month (`YYYY-MM`) → topic → chunk count.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(transparent)]
#[schema(value_type = Object)]
pub struct TopicSpikesResponse(pub models::TopicSpikes);

#[derive(Debug, Clone, Copy, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabelDto {
    Positive,
    Negative,
    Neutral,
}

impl From<models::SentimentLabel> for SentimentLabelDto {
    fn from(label: models::SentimentLabel) -> Self {
        match label {
            models::SentimentLabel::Positive => Self::Positive,
            models::SentimentLabel::Negative => Self::Negative,
            models::SentimentLabel::Neutral => Self::Neutral,
        }
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmotionPointResponse {
    pub date: DateTime<Utc>,
    pub sentiment: SentimentLabelDto,
    /// In `[0, 1]`; 0.5 is neutral.
    pub score: f32,
}

impl From<models::EmotionPoint> for EmotionPointResponse {
    fn from(point: models::EmotionPoint) -> Self {
        Self {
            date: point.date,
            sentiment: point.sentiment.into(),
            score: point.score,
        }
    }
}

/// Node kind marker; always `"topic"`.
#[derive(Debug, Clone, Copy, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TopicNodeType {
    Topic,
}

/// Edge kind marker; always `"related"`.
#[derive(Debug, Clone, Copy, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TopicEdgeType {
    Related,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopicNodeResponse {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub node_type: TopicNodeType,
    pub count: usize,
    pub first_seen: DateTime<Utc>,
}

impl From<models::TopicNode> for TopicNodeResponse {
    fn from(node: models::TopicNode) -> Self {
        Self {
            id: node.id,
            label: node.label,
            node_type: TopicNodeType::Topic,
            count: node.count,
            first_seen: node.first_seen,
        }
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopicEdgeResponse {
    pub id: String,
    pub source: String,
    pub target: String,
    /// Number of chunks carrying both topics.
    pub weight: usize,
    #[serde(rename = "type")]
    pub edge_type: TopicEdgeType,
}

impl From<models::TopicEdge> for TopicEdgeResponse {
    fn from(edge: models::TopicEdge) -> Self {
        Self {
            id: edge.id,
            source: edge.source,
            target: edge.target,
            weight: edge.weight,
            edge_type: TopicEdgeType::Related,
        }
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewBranchResponse {
    pub topic: String,
    pub date: DateTime<Utc>,
    pub related_topics: Vec<String>,
}

impl From<models::NewBranch> for NewBranchResponse {
    fn from(branch: models::NewBranch) -> Self {
        Self {
            topic: branch.topic,
            date: branch.date,
            related_topics: branch.related_topics,
        }
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeEvolutionResponse {
    pub nodes: Vec<TopicNodeResponse>,
    pub edges: Vec<TopicEdgeResponse>,
    pub new_branches: Vec<NewBranchResponse>,
}

impl From<models::KnowledgeEvolution> for KnowledgeEvolutionResponse {
    fn from(evolution: models::KnowledgeEvolution) -> Self {
        Self {
            nodes: evolution.nodes.into_iter().map(Into::into).collect(),
            edges: evolution.edges.into_iter().map(Into::into).collect(),
            new_branches: evolution.new_branches.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BranchTriggerResponse {
    pub date: DateTime<Utc>,
    pub trigger: String,
    pub led_to: Vec<String>,
}

impl From<models::BranchTrigger> for BranchTriggerResponse {
    fn from(trigger: models::BranchTrigger) -> Self {
        Self {
            date: trigger.date,
            trigger: trigger.trigger,
            led_to: trigger.led_to,
        }
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct InsightsResponse {
    pub insights: String,
}
