use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use nanoid::nanoid;
use unicode_segmentation::UnicodeSegmentation;

use crate::config::TimelineConfig;
use crate::db::ChunkStore;
use crate::embeddings::EmbeddingOracle;
use crate::error::{CogniError, Result};
use crate::intelligence::sentiment::sentiment_input;
use crate::intelligence::{
    BranchTriggerDetector, InsightGenerator, SentimentOracle, TimelineSnapshot, TopicGraphBuilder,
};
use crate::models::{
    is_storable_timestamp, BranchTrigger, Chunk, EmotionPoint, KnowledgeEvolution, NewChunk,
    Sentiment, TimelineEvent, TopicSpikes,
};

const DEFAULT_FILE_ID: &str = "direct_input";
const SNIPPET_LINES: usize = 2;
const SNIPPET_GRAPHEMES: usize = 200;

/// Timeline aggregates for one user, recomputed from the chunk store on
/// every call.
///
/// Read operations never fail on storage problems: an unreachable store is
/// logged and treated as a user with no chunks.
pub struct TimelineService {
    store: Arc<dyn ChunkStore>,
    embeddings: Arc<dyn EmbeddingOracle>,
    sentiment: Arc<dyn SentimentOracle>,
    insights: InsightGenerator,
    graph_builder: TopicGraphBuilder,
    branch_detector: BranchTriggerDetector,
    sentiment_batch_size: usize,
}

impl TimelineService {
    pub fn new(
        store: Arc<dyn ChunkStore>,
        embeddings: Arc<dyn EmbeddingOracle>,
        sentiment: Arc<dyn SentimentOracle>,
        insights: InsightGenerator,
        config: &TimelineConfig,
    ) -> Self {
        Self {
            store,
            embeddings,
            sentiment,
            insights,
            graph_builder: TopicGraphBuilder::new(config.topic_graph.clone()),
            branch_detector: BranchTriggerDetector::new(config.branch_triggers.clone()),
            sentiment_batch_size: config.sentiment_batch_size.max(1),
        }
    }

    async fn load_chunks(&self, user_id: &str) -> Vec<Chunk> {
        match self.store.get_chunks_for_user(user_id).await {
            Ok(chunks) => {
                tracing::debug!(user_id, chunks = chunks.len(), "Loaded chunks");
                chunks
            }
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Chunk store unavailable, using empty timeline");
                Vec::new()
            }
        }
    }

    pub async fn events(&self, user_id: &str) -> Vec<TimelineEvent> {
        let chunks = self.load_chunks(user_id).await;
        build_events(&chunks)
    }

    pub async fn topic_spikes(&self, user_id: &str) -> TopicSpikes {
        let chunks = self.load_chunks(user_id).await;
        build_topic_spikes(&chunks)
    }

    pub async fn emotion_trend(&self, user_id: &str) -> Vec<EmotionPoint> {
        let chunks = self.load_chunks(user_id).await;
        self.build_emotion_trend(&chunks).await
    }

    pub async fn knowledge_evolution(&self, user_id: &str) -> KnowledgeEvolution {
        let chunks = self.load_chunks(user_id).await;
        self.graph_builder.build(&chunks)
    }

    /// # Errors
    /// `DimensionMismatch` when the embedding oracle is inconsistent.
    pub async fn branch_triggers(&self, user_id: &str) -> Result<Vec<BranchTrigger>> {
        let chunks = self.load_chunks(user_id).await;
        let triggers = self
            .branch_detector
            .detect(&chunks, self.embeddings.as_ref())
            .await?;
        tracing::debug!(user_id, triggers = triggers.len(), "Detected branch triggers");
        Ok(triggers)
    }

    pub async fn insights(&self, user_id: &str) -> String {
        let chunks = self.load_chunks(user_id).await;

        let events = build_events(&chunks);
        let topic_spikes = build_topic_spikes(&chunks);
        let knowledge_evolution = self.graph_builder.build(&chunks);
        let emotion_trend = self.build_emotion_trend(&chunks).await;

        self.insights
            .generate(&TimelineSnapshot {
                events: &events,
                topic_spikes: &topic_spikes,
                emotion_trend: &emotion_trend,
                knowledge_evolution: &knowledge_evolution,
            })
            .await
    }

    pub async fn ingest_chunk(&self, user_id: &str, new_chunk: NewChunk) -> Result<Chunk> {
        if user_id.trim().is_empty() {
            return Err(CogniError::Validation("user id cannot be empty".to_string()));
        }
        let text = new_chunk.text.filter(|t| !t.trim().is_empty());
        if text.is_none() {
            return Err(CogniError::Validation("text cannot be empty".to_string()));
        }
        if let Some(created_at) = new_chunk.created_at {
            if !is_storable_timestamp(&created_at) {
                return Err(CogniError::Validation(
                    "created_at must fall between years 0000 and 9999".to_string(),
                ));
            }
        }

        let chunk = Chunk {
            id: nanoid!(),
            user_id: user_id.to_string(),
            file_id: new_chunk.file_id.filter(|f| !f.trim().is_empty()),
            text,
            tags: new_chunk
                .tags
                .into_iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            summary: new_chunk.summary.filter(|s| !s.trim().is_empty()),
            created_at: new_chunk.created_at.unwrap_or_else(Utc::now),
        };

        self.store.create_chunk(&chunk).await.map_err(|e| match e {
            CogniError::Database(db) => CogniError::StorageUnavailable(db.to_string()),
            other => other,
        })?;

        tracing::info!(user_id, chunk_id = %chunk.id, tags = chunk.tags.len(), "Chunk ingested");
        Ok(chunk)
    }

    /// Removes every chunk of the user. Returns the number deleted.
    pub async fn reset_user(&self, user_id: &str) -> Result<u64> {
        let deleted = self
            .store
            .delete_chunks_for_user(user_id)
            .await
            .map_err(|e| match e {
                CogniError::Database(db) => CogniError::StorageUnavailable(db.to_string()),
                other => other,
            })?;

        tracing::info!(user_id, deleted, "User timeline reset");
        Ok(deleted)
    }

    /// Classifies chunks with text in concurrent batches; output keeps chunk
    /// order and a failed classification becomes neutral.
    async fn build_emotion_trend(&self, chunks: &[Chunk]) -> Vec<EmotionPoint> {
        let inputs: Vec<(&Chunk, String)> = chunks
            .iter()
            .filter(|chunk| chunk.has_text())
            .filter_map(|chunk| sentiment_input(chunk).map(|input| (chunk, input)))
            .collect();

        let mut points = Vec::with_capacity(inputs.len());
        for batch in inputs.chunks(self.sentiment_batch_size) {
            let classified = join_all(batch.iter().map(|(chunk, input)| async move {
                let sentiment = match self.sentiment.classify(input).await {
                    Ok(sentiment) => sentiment,
                    Err(e) => {
                        tracing::warn!(chunk_id = %chunk.id, error = %e, "Sentiment failed, using neutral");
                        Sentiment::neutral()
                    }
                };
                EmotionPoint {
                    date: chunk.created_at,
                    sentiment: sentiment.label,
                    score: sentiment.score,
                }
            }))
            .await;
            points.extend(classified);
        }

        points
    }
}

fn build_events(chunks: &[Chunk]) -> Vec<TimelineEvent> {
    chunks
        .iter()
        .map(|chunk| TimelineEvent {
            chunk_id: chunk.id.clone(),
            file_id: chunk
                .file_id
                .clone()
                .unwrap_or_else(|| DEFAULT_FILE_ID.to_string()),
            user_id: chunk.user_id.clone(),
            timestamp: chunk.created_at,
            tags: chunk.tags.clone(),
            summary: chunk.summary.clone().unwrap_or_default(),
            text_snippet: chunk.text.as_deref().map(text_snippet).unwrap_or_default(),
        })
        .collect()
}

fn build_topic_spikes(chunks: &[Chunk]) -> TopicSpikes {
    let mut spikes = TopicSpikes::new();
    for chunk in chunks {
        let tags = chunk.normalized_tags();
        if tags.is_empty() {
            continue;
        }
        let month = spikes
            .entry(chunk.created_at.format("%Y-%m").to_string())
            .or_default();
        for tag in tags {
            *month.entry(tag).or_insert(0) += 1;
        }
    }
    spikes
}

/// First two lines joined by a space, capped at 200 grapheme clusters.
fn text_snippet(text: &str) -> String {
    let joined = text
        .split('\n')
        .take(SNIPPET_LINES)
        .collect::<Vec<_>>()
        .join(" ");
    joined.graphemes(true).take(SNIPPET_GRAPHEMES).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimelineConfig;
    use crate::embeddings::EmbeddingProvider;
    use crate::intelligence::KeywordSentimentClassifier;
    use crate::llm::LlmProvider;
    use crate::models::SentimentLabel;
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        chunks: Mutex<Vec<Chunk>>,
    }

    #[async_trait]
    impl ChunkStore for MemoryStore {
        async fn get_chunks_for_user(&self, user_id: &str) -> Result<Vec<Chunk>> {
            let chunks = self.chunks.lock().unwrap();
            let mut mine: Vec<Chunk> = chunks
                .iter()
                .filter(|c| c.user_id == user_id)
                .cloned()
                .collect();
            mine.sort_by_key(|c| c.created_at);
            Ok(mine)
        }

        async fn create_chunk(&self, chunk: &Chunk) -> Result<()> {
            self.chunks.lock().unwrap().push(chunk.clone());
            Ok(())
        }

        async fn delete_chunks_for_user(&self, user_id: &str) -> Result<u64> {
            let mut chunks = self.chunks.lock().unwrap();
            let before = chunks.len();
            chunks.retain(|c| c.user_id != user_id);
            Ok((before - chunks.len()) as u64)
        }
    }

    struct DownStore;

    #[async_trait]
    impl ChunkStore for DownStore {
        async fn get_chunks_for_user(&self, _user_id: &str) -> Result<Vec<Chunk>> {
            Err(CogniError::StorageUnavailable("connection refused".to_string()))
        }

        async fn create_chunk(&self, _chunk: &Chunk) -> Result<()> {
            Err(CogniError::StorageUnavailable("connection refused".to_string()))
        }

        async fn delete_chunks_for_user(&self, _user_id: &str) -> Result<u64> {
            Err(CogniError::StorageUnavailable("connection refused".to_string()))
        }
    }

    /// Fails for texts containing "boom"; counts calls.
    #[derive(Default)]
    struct FlakySentiment {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SentimentOracle for FlakySentiment {
        async fn classify(&self, text: &str) -> Result<Sentiment> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if text.contains("boom") {
                return Err(CogniError::Llm("model overloaded".to_string()));
            }
            Ok(KeywordSentimentClassifier::classify_text(text))
        }
    }

    /// Alternates vector lengths to break the oracle contract.
    struct InconsistentOracle {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EmbeddingOracle for InconsistentOracle {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(if n % 2 == 0 { vec![1.0, 0.0] } else { vec![1.0, 0.0, 0.0] })
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    fn t(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap()
    }

    fn chunk(id: &str, created_at: DateTime<Utc>, text: &str, tags: &[&str]) -> Chunk {
        Chunk::new(id.to_string(), "alice".to_string(), created_at)
            .with_text(text)
            .with_tags(tags.iter().copied())
    }

    fn service_with(
        store: Arc<dyn ChunkStore>,
        embeddings: Arc<dyn EmbeddingOracle>,
        sentiment: Arc<dyn SentimentOracle>,
        batch_size: usize,
    ) -> TimelineService {
        let config = TimelineConfig {
            sentiment_batch_size: batch_size,
            ..TimelineConfig::default()
        };
        TimelineService::new(
            store,
            embeddings,
            sentiment,
            InsightGenerator::new(LlmProvider::unavailable("tests")),
            &config,
        )
    }

    fn service(chunks: Vec<Chunk>) -> TimelineService {
        let store = MemoryStore {
            chunks: Mutex::new(chunks),
        };
        service_with(
            Arc::new(store),
            Arc::new(EmbeddingProvider::mock(768)),
            Arc::new(KeywordSentimentClassifier),
            10,
        )
    }

    #[tokio::test]
    async fn events_are_chronological_with_defaults() {
        let mut with_file = chunk("c2", t(2), "second", &["Rust"]).with_summary("about rust");
        with_file.file_id = Some("notes.md".to_string());
        let service = service(vec![with_file, chunk("c1", t(1), "first\nline two\nline three", &[])]);

        let events = service.events("alice").await;

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].chunk_id, "c1");
        assert_eq!(events[0].file_id, "direct_input");
        assert_eq!(events[0].summary, "");
        assert_eq!(events[0].text_snippet, "first line two");
        assert_eq!(events[1].file_id, "notes.md");
        assert_eq!(events[1].tags, vec!["Rust"]);
        assert_eq!(events[1].summary, "about rust");
    }

    #[test]
    fn text_snippet_caps_grapheme_clusters() {
        let text = "e\u{301}".repeat(300);
        let snippet = text_snippet(&text);
        assert_eq!(snippet.graphemes(true).count(), 200);
        assert!(snippet.ends_with("e\u{301}"));
    }

    #[tokio::test]
    async fn events_only_include_the_requested_user() {
        let theirs = Chunk::new("b1".to_string(), "bob".to_string(), t(1)).with_text("secret");
        let service = service(vec![chunk("a1", t(1), "mine", &[]), theirs]);

        let events = service.events("alice").await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].chunk_id, "a1");
        assert!(service.events("carol").await.is_empty());
    }

    #[tokio::test]
    async fn topic_spikes_group_by_month() {
        let feb = Utc.with_ymd_and_hms(2024, 2, 3, 0, 0, 0).unwrap();
        let service = service(vec![
            chunk("c1", t(1), "a", &["Math", "physics"]),
            chunk("c2", t(5), "b", &["math "]),
            chunk("c3", t(6), "c", &[]),
            chunk("c4", feb, "d", &["art"]),
        ]);

        let spikes = service.topic_spikes("alice").await;

        let json = serde_json::to_value(&spikes).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "2024-01": { "math": 2, "physics": 1 },
                "2024-02": { "art": 1 }
            })
        );
    }

    #[tokio::test]
    async fn emotion_trend_keeps_order_and_neutralizes_failures() {
        let sentiment = Arc::new(FlakySentiment::default());
        let store = MemoryStore {
            chunks: Mutex::new(vec![
                chunk("c1", t(1), "a great insight", &[]),
                chunk("c2", t(2), "boom", &[]),
                Chunk::new("c3".to_string(), "alice".to_string(), t(3)).with_summary("great"),
                chunk("c4", t(4), "long text", &[]).with_summary("a bad problem"),
                chunk("c5", t(5), "plain", &[]),
            ]),
        };
        let service = service_with(
            Arc::new(store),
            Arc::new(EmbeddingProvider::mock(8)),
            sentiment.clone(),
            2,
        );

        let trend = service.emotion_trend("alice").await;

        let labels: Vec<SentimentLabel> = trend.iter().map(|p| p.sentiment).collect();
        assert_eq!(
            labels,
            vec![
                SentimentLabel::Positive,
                SentimentLabel::Neutral,
                SentimentLabel::Negative,
                SentimentLabel::Neutral,
            ]
        );
        assert_eq!(trend[1].score, 0.5);
        assert_eq!(trend[2].date, t(4));
        assert_eq!(sentiment.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn knowledge_evolution_uses_topic_graph() {
        let service = service(vec![
            chunk("c1", t(1), "a", &["math"]),
            chunk("c2", t(2), "b", &["math", "physics"]),
            chunk("c3", t(3), "c", &["art"]),
        ]);

        let graph = service.knowledge_evolution("alice").await;
        assert_eq!(graph.nodes.len(), 3);
        assert_eq!(graph.edges.len(), 1);
        assert!(graph.new_branches.is_empty());
    }

    #[tokio::test]
    async fn branch_triggers_with_mock_embeddings_start_at_first_chunk() {
        let service = service(vec![
            chunk("c1", t(1), "Limits and continuity", &["math"]),
            chunk("c2", t(2), "Brush strokes", &["art"]),
        ]);

        let triggers = service.branch_triggers("alice").await.unwrap();
        assert!(!triggers.is_empty());
        assert_eq!(triggers[0].trigger, "math");
        assert_eq!(triggers[0].date, t(1));
    }

    #[tokio::test]
    async fn branch_triggers_propagate_dimension_mismatch() {
        let store = MemoryStore {
            chunks: Mutex::new(vec![
                chunk("c1", t(1), "a", &["math"]),
                chunk("c2", t(2), "b", &["art"]),
            ]),
        };
        let service = service_with(
            Arc::new(store),
            Arc::new(InconsistentOracle {
                calls: AtomicUsize::new(0),
            }),
            Arc::new(KeywordSentimentClassifier),
            10,
        );

        let err = service.branch_triggers("alice").await.unwrap_err();
        assert!(matches!(err, CogniError::DimensionMismatch { .. }));
    }

    #[tokio::test]
    async fn storage_failure_degrades_to_empty_results() {
        let service = service_with(
            Arc::new(DownStore),
            Arc::new(EmbeddingProvider::mock(8)),
            Arc::new(KeywordSentimentClassifier),
            10,
        );

        assert!(service.events("alice").await.is_empty());
        assert!(service.topic_spikes("alice").await.is_empty());
        assert!(service.emotion_trend("alice").await.is_empty());
        assert_eq!(
            service.knowledge_evolution("alice").await,
            KnowledgeEvolution::empty()
        );
        assert!(service.branch_triggers("alice").await.unwrap().is_empty());
        assert_eq!(
            service.insights("alice").await,
            "Start uploading content to see your learning journey unfold!"
        );
    }

    #[tokio::test]
    async fn insights_summarize_top_topics_without_llm() {
        let service = service(vec![
            chunk("c1", t(1), "a", &["math"]),
            chunk("c2", t(2), "b", &["math", "physics"]),
        ]);

        assert_eq!(
            service.insights("alice").await,
            "You've created 2 learning events. Your top topics are: math, physics. Keep exploring!"
        );
    }

    #[tokio::test]
    async fn ingest_chunk_stores_trimmed_content() {
        let service = service(Vec::new());

        let stored = service
            .ingest_chunk(
                "alice",
                NewChunk {
                    text: Some("Eigenvalues of a matrix".to_string()),
                    tags: vec![" linear algebra ".to_string(), "  ".to_string()],
                    summary: Some(" ".to_string()),
                    file_id: None,
                    created_at: Some(t(9)),
                },
            )
            .await
            .unwrap();

        assert_eq!(stored.user_id, "alice");
        assert_eq!(stored.tags, vec!["linear algebra"]);
        assert_eq!(stored.summary, None);
        assert_eq!(stored.created_at, t(9));
        assert!(!stored.id.is_empty());

        let events = service.events("alice").await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].chunk_id, stored.id);
    }

    #[tokio::test]
    async fn ingest_chunk_requires_text() {
        let service = service(Vec::new());
        let err = service
            .ingest_chunk(
                "alice",
                NewChunk {
                    text: Some("   ".to_string()),
                    ..NewChunk::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CogniError::Validation(_)));
    }

    #[tokio::test]
    async fn ingest_chunk_rejects_unsortable_timestamps() {
        let service = service(Vec::new());
        let err = service
            .ingest_chunk(
                "alice",
                NewChunk {
                    text: Some("far future".to_string()),
                    created_at: Utc.with_ymd_and_hms(12_000, 1, 1, 0, 0, 0).single(),
                    ..NewChunk::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CogniError::Validation(_)));
        assert!(service.events("alice").await.is_empty());
    }

    #[tokio::test]
    async fn ingest_chunk_surfaces_storage_failure() {
        let service = service_with(
            Arc::new(DownStore),
            Arc::new(EmbeddingProvider::mock(8)),
            Arc::new(KeywordSentimentClassifier),
            10,
        );
        let err = service
            .ingest_chunk(
                "alice",
                NewChunk {
                    text: Some("hello".to_string()),
                    ..NewChunk::default()
                },
            )
            .await
            .unwrap_err();
        assert!(err.is_storage_failure());
    }
}
