use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::config::TopicGraphConfig;
use crate::models::{Chunk, KnowledgeEvolution, NewBranch, TopicEdge, TopicNode};

/// Builds the topic co-occurrence graph and new-branch list for one user's
/// chunks.
///
/// Co-occurrence is accumulated in a single pass over the chunks, keyed by
/// the unordered topic-index pair, so the cost is O(C·k²) for C chunks with
/// k tags each. A chunk carrying hundreds of tags dominates the run time.
/// Edges are emitted in `(i, j)` index order.
pub struct TopicGraphBuilder {
    config: TopicGraphConfig,
}

struct TopicStats {
    label: String,
    /// Positions (in input order) of chunks carrying the topic.
    chunks: Vec<usize>,
    first_seen: DateTime<Utc>,
}

impl TopicGraphBuilder {
    pub fn new(config: TopicGraphConfig) -> Self {
        Self { config }
    }

    /// `chunks` must be ordered by `created_at` ascending.
    pub fn build(&self, chunks: &[Chunk]) -> KnowledgeEvolution {
        if chunks.is_empty() {
            return KnowledgeEvolution::empty();
        }

        let chunk_tags: Vec<Vec<String>> = chunks.iter().map(Chunk::normalized_tags).collect();

        let mut topics: Vec<TopicStats> = Vec::new();
        let mut index_of: HashMap<&str, usize> = HashMap::new();
        let mut pair_counts: HashMap<(usize, usize), usize> = HashMap::new();

        for (position, (chunk, tags)) in chunks.iter().zip(&chunk_tags).enumerate() {
            let mut indices = Vec::with_capacity(tags.len());
            for tag in tags {
                let index = *index_of.entry(tag.as_str()).or_insert_with(|| {
                    topics.push(TopicStats {
                        label: tag.clone(),
                        chunks: Vec::new(),
                        first_seen: chunk.created_at,
                    });
                    topics.len() - 1
                });
                let stats = &mut topics[index];
                stats.chunks.push(position);
                stats.first_seen = stats.first_seen.min(chunk.created_at);
                indices.push(index);
            }

            for (a, &i) in indices.iter().enumerate() {
                for &j in &indices[a + 1..] {
                    *pair_counts.entry((i.min(j), i.max(j))).or_insert(0) += 1;
                }
            }
        }

        let nodes: Vec<TopicNode> = topics
            .iter()
            .enumerate()
            .map(|(index, stats)| TopicNode {
                id: node_id(index),
                label: stats.label.clone(),
                count: stats.chunks.len(),
                first_seen: stats.first_seen,
            })
            .collect();

        let mut pairs: Vec<((usize, usize), usize)> = pair_counts.into_iter().collect();
        pairs.sort_unstable_by_key(|(pair, _)| *pair);
        let edges: Vec<TopicEdge> = pairs
            .into_iter()
            .map(|((i, j), weight)| TopicEdge {
                id: format!("edge_{i}_{j}"),
                source: node_id(i),
                target: node_id(j),
                weight,
            })
            .collect();

        let new_branches = self.new_branches(&topics, &chunk_tags);

        tracing::debug!(
            nodes = nodes.len(),
            edges = edges.len(),
            new_branches = new_branches.len(),
            "Built topic graph"
        );

        KnowledgeEvolution {
            nodes,
            edges,
            new_branches,
        }
    }

    fn new_branches(&self, topics: &[TopicStats], chunk_tags: &[Vec<String>]) -> Vec<NewBranch> {
        if topics.is_empty() || topics.len() < self.config.min_topics_for_branches {
            return Vec::new();
        }

        // Stable: equal timestamps keep first-encounter order.
        let mut sorted: Vec<&TopicStats> = topics.iter().collect();
        sorted.sort_by_key(|stats| stats.first_seen);

        let percentile = self.config.early_percentile.clamp(0.0, 1.0);
        let position = ((sorted.len() as f64 * percentile).floor() as usize).min(sorted.len() - 1);
        let early_threshold = sorted[position].first_seen;

        sorted
            .into_iter()
            .filter(|stats| stats.first_seen > early_threshold)
            .map(|stats| NewBranch {
                topic: stats.label.clone(),
                date: stats.first_seen,
                related_topics: self.related_topics(stats, chunk_tags),
            })
            .collect()
    }

    fn related_topics(&self, stats: &TopicStats, chunk_tags: &[Vec<String>]) -> Vec<String> {
        let mut related: Vec<String> = Vec::new();
        for &position in &stats.chunks {
            for tag in &chunk_tags[position] {
                if related.len() == self.config.related_topics_limit {
                    return related;
                }
                if *tag != stats.label && !related.contains(tag) {
                    related.push(tag.clone());
                }
            }
        }
        related
    }
}

impl Default for TopicGraphBuilder {
    fn default() -> Self {
        Self::new(TopicGraphConfig::default())
    }
}

fn node_id(index: usize) -> String {
    format!("topic_{index}")
}
