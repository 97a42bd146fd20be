use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::sync::{Arc, Mutex, OnceLock};

use crate::config::{parse_provider_model, EmbeddingsConfig};
use crate::error::{CogniError, Result};

use super::api::{default_base_url, ApiConfig, EmbeddingApiClient};
use super::mock::mock_embedding;

/// Maps a text to a fixed-length vector.
///
/// Every vector produced by one oracle instance has the same length;
/// comparing vectors from different oracles is a caller error.
#[async_trait]
pub trait EmbeddingOracle: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    fn dimensions(&self) -> usize;
}

#[derive(Clone)]
enum EmbeddingBackend {
    Mock,
    Local {
        model: Arc<Mutex<TextEmbedding>>,
    },
    Api {
        client: EmbeddingApiClient,
        fallback_to_mock: bool,
        /// Length of the first vector the API returned. Fallback vectors use
        /// it so one run never mixes lengths.
        remote_dimensions: Arc<OnceLock<usize>>,
    },
}

#[derive(Clone)]
pub struct EmbeddingProvider {
    backend: EmbeddingBackend,
    dimensions: usize,
}

impl EmbeddingProvider {
    pub fn new(config: &EmbeddingsConfig) -> Result<Self> {
        let (provider, model_name) = parse_provider_model(&config.model);

        let mut dimensions = config.dimensions;
        let backend = match provider {
            "mock" => EmbeddingBackend::Mock,
            "local" => {
                let embedding_model = resolve_embedding_model(model_name);
                dimensions = local_model_dimensions(&embedding_model)?;
                if dimensions != config.dimensions {
                    tracing::info!(
                        configured = config.dimensions,
                        model_dimensions = dimensions,
                        "Using the local model's embedding length"
                    );
                }
                let model = build_model(embedding_model)?;
                EmbeddingBackend::Local {
                    model: Arc::new(Mutex::new(model)),
                }
            }
            remote => {
                let base_url = config
                    .base_url
                    .clone()
                    .unwrap_or_else(|| default_base_url(remote).to_string());
                let client = EmbeddingApiClient::new(ApiConfig {
                    base_url,
                    api_key: config.api_key.clone(),
                    model: model_name.to_string(),
                    timeout_secs: config.timeout_secs,
                    max_retries: config.max_retries,
                })?;
                EmbeddingBackend::Api {
                    client,
                    fallback_to_mock: config.fallback_to_mock,
                    remote_dimensions: Arc::new(OnceLock::new()),
                }
            }
        };

        tracing::info!(
            provider = provider,
            model = model_name,
            dimensions,
            "Embedding provider initialized"
        );

        Ok(Self {
            backend,
            dimensions,
        })
    }

    /// Deterministic provider for development and tests.
    pub fn mock(dimensions: usize) -> Self {
        Self {
            backend: EmbeddingBackend::Mock,
            dimensions,
        }
    }

    pub fn is_mock(&self) -> bool {
        matches!(self.backend, EmbeddingBackend::Mock)
    }

    async fn embed_local(model: Arc<Mutex<TextEmbedding>>, text: String) -> Result<Vec<f32>> {
        tokio::task::spawn_blocking(move || {
            let mut model = model
                .lock()
                .map_err(|e| CogniError::Embedding(format!("Embedding model lock poisoned: {e}")))?;
            model
                .embed(vec![text], Some(1))
                .map_err(|e| CogniError::Embedding(e.to_string()))
        })
        .await
        .map_err(|e| CogniError::Embedding(format!("Embedding worker failed: {e}")))??
        .into_iter()
        .next()
        .ok_or_else(|| CogniError::Embedding("No embedding generated".to_string()))
    }
}

#[async_trait]
impl EmbeddingOracle for EmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        match &self.backend {
            EmbeddingBackend::Mock => Ok(mock_embedding(text, self.dimensions)),
            EmbeddingBackend::Local { model } => {
                Self::embed_local(Arc::clone(model), text.to_string()).await
            }
            EmbeddingBackend::Api {
                client,
                fallback_to_mock,
                remote_dimensions,
            } => {
                let result = client.embed(&[text]).await.and_then(|embeddings| {
                    embeddings
                        .into_iter()
                        .next()
                        .ok_or_else(|| CogniError::Embedding("No embedding returned".to_string()))
                });

                match result {
                    Ok(embedding) => {
                        let expected = *remote_dimensions.get_or_init(|| {
                            if embedding.len() != self.dimensions {
                                tracing::warn!(
                                    configured = self.dimensions,
                                    returned = embedding.len(),
                                    "Embedding API length differs from EMBEDDING_DIMENSIONS, following the API"
                                );
                            }
                            embedding.len()
                        });
                        if embedding.len() != expected {
                            return Err(CogniError::Embedding(format!(
                                "Embedding API returned {} dimensions, expected {expected}",
                                embedding.len()
                            )));
                        }
                        Ok(embedding)
                    }
                    Err(e) if *fallback_to_mock => {
                        tracing::warn!(error = %e, "Embedding API failed, using mock embedding");
                        Ok(mock_embedding(text, self.dimensions()))
                    }
                    Err(e) => Err(e),
                }
            }
        }
    }

    fn dimensions(&self) -> usize {
        match &self.backend {
            EmbeddingBackend::Api {
                remote_dimensions, ..
            } => remote_dimensions.get().copied().unwrap_or(self.dimensions),
            _ => self.dimensions,
        }
    }
}

pub(super) fn resolve_embedding_model(model_name: &str) -> EmbeddingModel {
    match model_name {
        "BAAI/bge-base-en-v1.5" | "bge-base-en-v1.5" => EmbeddingModel::BGEBaseENV15,
        "BAAI/bge-large-en-v1.5" | "bge-large-en-v1.5" => EmbeddingModel::BGELargeENV15,
        "all-MiniLM-L6-v2" | "sentence-transformers/all-MiniLM-L6-v2" => {
            EmbeddingModel::AllMiniLML6V2
        }
        "nomic-embed-text-v1.5" | "nomic-ai/nomic-embed-text-v1.5" => {
            EmbeddingModel::NomicEmbedTextV15
        }
        _ => EmbeddingModel::BGESmallENV15,
    }
}

pub(super) fn local_model_dimensions(embedding_model: &EmbeddingModel) -> Result<usize> {
    TextEmbedding::get_model_info(embedding_model)
        .map(|info| info.dim)
        .map_err(|e| CogniError::Embedding(e.to_string()))
}

fn build_model(embedding_model: EmbeddingModel) -> Result<TextEmbedding> {
    TextEmbedding::try_new(InitOptions::new(embedding_model).with_show_download_progress(true))
        .map_err(|e| CogniError::Embedding(e.to_string()))
}
