use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, StatusCode,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{CogniError, Result};

/// Default base URL of each OpenAI-compatible embedding provider.
pub fn default_base_url(provider: &str) -> &'static str {
    match provider.to_lowercase().as_str() {
        "openrouter" => "https://openrouter.ai/api/v1",
        "ollama" => "http://localhost:11434/v1",
        "lmstudio" => "http://localhost:1234/v1",
        _ => "https://api.openai.com/v1",
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Client for `POST {base_url}/embeddings`.
///
/// 429 and 5xx responses and transport errors are retried with exponential
/// backoff; 401/403 fail immediately.
#[derive(Clone)]
pub struct EmbeddingApiClient {
    client: Client,
    headers: HeaderMap,
    config: ApiConfig,
}

impl EmbeddingApiClient {
    pub fn new(config: ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CogniError::Embedding(format!("Failed to create HTTP client: {e}")))?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(ref api_key) = config.api_key {
            let value = HeaderValue::from_str(&format!("Bearer {api_key}"))
                .map_err(|e| CogniError::Embedding(format!("Invalid API key header: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }

        Ok(Self {
            client,
            headers,
            config,
        })
    }

    pub async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let request = EmbeddingRequest {
            model: &self.config.model,
            input: texts,
        };
        let url = format!("{}/embeddings", self.config.base_url.trim_end_matches('/'));

        let mut last_error = None;
        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                tokio::time::sleep(Duration::from_millis(100 * 2_u64.pow(attempt - 1))).await;
            }

            let response = match self
                .client
                .post(&url)
                .headers(self.headers.clone())
                .json(&request)
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    tracing::debug!(attempt, error = %e, "Embedding request failed");
                    last_error = Some(CogniError::Embedding(format!("Request failed: {e}")));
                    continue;
                }
            };

            let status = response.status();
            if status.is_success() {
                let body: EmbeddingResponse = response.json().await.map_err(|e| {
                    CogniError::Embedding(format!("Failed to parse response: {e}"))
                })?;
                return Ok(body.data.into_iter().map(|d| d.embedding).collect());
            }

            match status {
                StatusCode::TOO_MANY_REQUESTS => {
                    let retry_after = response
                        .headers()
                        .get("retry-after")
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.parse().ok());
                    last_error = Some(CogniError::ApiRateLimit { retry_after });
                }
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    let body = response.text().await.unwrap_or_default();
                    return Err(CogniError::ApiAuth(body));
                }
                s if s.is_server_error() => {
                    let body = response.text().await.unwrap_or_default();
                    last_error = Some(CogniError::Embedding(format!("Server error {s}: {body}")));
                }
                s => {
                    let body = response.text().await.unwrap_or_default();
                    return Err(CogniError::Embedding(format!("API error {s}: {body}")));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| CogniError::Embedding("Unknown error".to_string())))
    }
}
