use std::collections::HashSet;

use crate::config::BranchTriggerConfig;
use crate::embeddings::EmbeddingOracle;
use crate::error::Result;
use crate::intelligence::utils::cosine_similarity;
use crate::models::{BranchTrigger, Chunk};

/// Finds chunks that diverge from everything before them while introducing
/// a tag never seen before.
///
/// Processing is sequential and order-sensitive: each chunk is compared
/// only with the usable chunks that precede it.
pub struct BranchTriggerDetector {
    config: BranchTriggerConfig,
}

impl BranchTriggerDetector {
    pub fn new(config: BranchTriggerConfig) -> Self {
        Self { config }
    }

    /// `chunks` must be ordered by `created_at` ascending.
    ///
    /// Each usable chunk is embedded exactly once. A chunk whose embedding
    /// fails is skipped and never becomes part of the comparison set.
    ///
    /// # Errors
    /// `DimensionMismatch` when the oracle returns vectors of different
    /// lengths within one run.
    pub async fn detect(
        &self,
        chunks: &[Chunk],
        oracle: &dyn EmbeddingOracle,
    ) -> Result<Vec<BranchTrigger>> {
        let usable = chunks.iter().filter(|c| c.is_usable()).count();
        if usable < 2 {
            tracing::debug!(usable, "Not enough usable chunks for branch detection");
            return Ok(Vec::new());
        }

        let chunk_tags: Vec<Vec<String>> = chunks.iter().map(Chunk::normalized_tags).collect();
        let mut seen_embeddings: Vec<Vec<f32>> = Vec::with_capacity(usable);
        let mut seen_tags: HashSet<&str> = HashSet::new();
        let mut triggers = Vec::new();

        for (position, chunk) in chunks.iter().enumerate() {
            let tags = &chunk_tags[position];
            let Some(text) = chunk.text.as_deref().filter(|t| !t.is_empty()) else {
                continue;
            };
            if tags.is_empty() {
                continue;
            }

            let embedding = match oracle.embed(text).await {
                Ok(embedding) => embedding,
                Err(e) => {
                    tracing::warn!(chunk_id = %chunk.id, error = %e, "Skipping chunk, embedding failed");
                    continue;
                }
            };

            let mut max_similarity = 0.0f32;
            for previous in &seen_embeddings {
                max_similarity = max_similarity.max(cosine_similarity(&embedding, previous)?);
            }

            let new_tags: Vec<&String> = tags
                .iter()
                .filter(|tag| !seen_tags.contains(tag.as_str()))
                .collect();

            if max_similarity < self.config.similarity_threshold {
                if let Some(trigger) = new_tags.first() {
                    let led_to = self.led_to(&new_tags, &chunk_tags[position + 1..]);
                    tracing::debug!(
                        chunk_id = %chunk.id,
                        trigger = %trigger,
                        max_similarity,
                        "Branch trigger detected"
                    );
                    triggers.push(BranchTrigger {
                        date: chunk.created_at,
                        trigger: (*trigger).clone(),
                        led_to,
                    });
                }
            }

            seen_tags.extend(tags.iter().map(String::as_str));
            seen_embeddings.push(embedding);
        }

        Ok(triggers)
    }

    /// Tags of later chunks sharing any of `new_tags`, excluding the new
    /// tags themselves.
    fn led_to(&self, new_tags: &[&String], later: &[Vec<String>]) -> Vec<String> {
        let mut led_to: Vec<String> = Vec::new();
        let related = later
            .iter()
            .filter(|tags| tags.iter().any(|tag| new_tags.contains(&tag)));

        for tags in related {
            for tag in tags {
                if led_to.len() == self.config.led_to_limit {
                    return led_to;
                }
                if !new_tags.contains(&tag) && !led_to.contains(tag) {
                    led_to.push(tag.clone());
                }
            }
        }
        led_to
    }
}

impl Default for BranchTriggerDetector {
    fn default() -> Self {
        Self::new(BranchTriggerConfig::default())
    }
}
