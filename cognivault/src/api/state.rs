use std::sync::Arc;

use crate::config::Config;
use crate::db::{ChunkStore, Database, DatabaseBackend, LibSqlBackend};
use crate::embeddings::{EmbeddingOracle, EmbeddingProvider};
use crate::error::Result;
use crate::intelligence::{
    InsightGenerator, KeywordSentimentClassifier, LlmSentimentClassifier, SentimentOracle,
};
use crate::llm::LlmProvider;
use crate::services::TimelineService;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Arc<dyn DatabaseBackend>,
    pub embeddings: EmbeddingProvider,
    pub llm: LlmProvider,
    pub timeline: Arc<TimelineService>,
}

impl AppState {
    pub fn new<B: DatabaseBackend + 'static>(
        config: Config,
        backend: Arc<B>,
        embeddings: EmbeddingProvider,
        llm: LlmProvider,
    ) -> Self {
        let config = Arc::new(config);
        let store: Arc<dyn ChunkStore> = backend.clone();
        let db: Arc<dyn DatabaseBackend> = backend;

        let sentiment: Arc<dyn SentimentOracle> = if llm.is_available() {
            Arc::new(LlmSentimentClassifier::new(llm.clone()))
        } else {
            tracing::info!("No LLM configured, using keyword sentiment classifier");
            Arc::new(KeywordSentimentClassifier)
        };
        let oracle: Arc<dyn EmbeddingOracle> = Arc::new(embeddings.clone());

        let timeline = TimelineService::new(
            store,
            oracle,
            sentiment,
            InsightGenerator::new(llm.clone()),
            &config.timeline,
        );

        Self {
            config,
            db,
            embeddings,
            llm,
            timeline: Arc::new(timeline),
        }
    }

    /// Opens the database and builds every provider from `config`.
    pub async fn from_config(config: Config) -> Result<Self> {
        let raw_db = Database::new(&config.database).await?;
        let backend = Arc::new(LibSqlBackend::new(raw_db));

        let embeddings = EmbeddingProvider::new(&config.embeddings)?;

        if let Some(llm_config) = &config.llm {
            tracing::info!("Initializing LLM provider: {}...", llm_config.model);
        }
        let llm = LlmProvider::new(config.llm.as_ref());
        if !llm.is_available() {
            tracing::warn!("LLM unavailable - sentiment and insights use local fallbacks");
        }

        Ok(Self::new(config, backend, embeddings, llm))
    }
}
