use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    error::{ApiError, OpenAIError},
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs, CreateChatCompletionResponse,
    },
    Client,
};

use crate::{
    config::{parse_llm_provider_model, LlmConfig},
    error::{CogniError, Result},
    llm::provider::CompletionOptions,
};

#[derive(Debug, Clone)]
struct ApiConfig {
    base_url: String,
    api_key: Option<String>,
    model: String,
    timeout_secs: u64,
    max_retries: u32,
}

/// Chat-completion client for OpenAI-compatible endpoints.
#[derive(Clone)]
pub struct LlmApiClient {
    client: Client<OpenAIConfig>,
    config: ApiConfig,
}

impl LlmApiClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_config = ApiConfig::from_llm_config(config);

        let (provider, _) = parse_llm_provider_model(&config.model);
        let needs_api_key = matches!(provider.to_lowercase().as_str(), "openai" | "openrouter");
        if needs_api_key && api_config.api_key.is_none() {
            return Err(CogniError::LlmUnavailable(format!(
                "API key required for provider {provider}"
            )));
        }

        let openai_config = OpenAIConfig::new()
            .with_api_base(api_config.base_url.clone())
            .with_api_key(api_config.api_key.clone().unwrap_or_default());

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(api_config.timeout_secs))
            .build()
            .map_err(|error| CogniError::Llm(format!("Failed to create LLM HTTP client: {error}")))?;

        // async-openai retries internally; cap it at our own timeout.
        let backoff = backoff::ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(api_config.timeout_secs)),
            ..Default::default()
        };

        let client = Client::with_config(openai_config)
            .with_http_client(http_client)
            .with_backoff(backoff);

        Ok(Self {
            client,
            config: api_config,
        })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub async fn complete(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        options: Option<&CompletionOptions>,
    ) -> Result<String> {
        if prompt.trim().is_empty() {
            return Err(CogniError::Validation("Prompt cannot be empty".to_string()));
        }

        let request = self.build_request(prompt, system_prompt, options)?;
        let mut last_error: Option<CogniError> = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                tokio::time::sleep(Duration::from_millis(100 * 2_u64.pow(attempt - 1))).await;
            }

            let error = match self.client.chat().create(request.clone()).await {
                Ok(response) => return Self::extract_content(response),
                Err(error) => error,
            };

            if let Some(terminal) = Self::rate_limit_error(&error).or_else(|| Self::auth_error(&error))
            {
                return Err(terminal);
            }

            let retryable = Self::is_retryable(&error);
            let mapped = Self::map_openai_error(error);
            tracing::debug!(attempt, retryable, error = %mapped, "LLM completion attempt failed");

            if !retryable {
                return Err(mapped);
            }
            last_error = Some(mapped);
        }

        Err(last_error
            .unwrap_or_else(|| CogniError::Llm("LLM completion failed after retries".to_string())))
    }

    fn build_request(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        options: Option<&CompletionOptions>,
    ) -> Result<CreateChatCompletionRequest> {
        let mut messages = Vec::new();

        if let Some(system_prompt) = system_prompt.filter(|value| !value.trim().is_empty()) {
            messages.push(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system_prompt)
                    .build()
                    .map_err(|error| {
                        CogniError::Validation(format!("Invalid system prompt: {error}"))
                    })?
                    .into(),
            );
        }

        messages.push(
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|error| CogniError::Validation(format!("Invalid user prompt: {error}")))?
                .into(),
        );

        let mut request = CreateChatCompletionRequestArgs::default();
        request.model(self.config.model.clone()).messages(messages);
        if let Some(options) = options {
            if let Some(temperature) = options.temperature {
                request.temperature(temperature);
            }
            if let Some(max_tokens) = options.max_tokens {
                request.max_tokens(max_tokens);
            }
        }

        request.build().map_err(|error| {
            CogniError::Validation(format!("Invalid LLM completion request: {error}"))
        })
    }

    fn extract_content(response: CreateChatCompletionResponse) -> Result<String> {
        let message = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CogniError::Llm("LLM response contained no choices".to_string()))?
            .message
            .content
            .unwrap_or_default();

        if message.trim().is_empty() {
            return Err(CogniError::Llm("LLM response contained empty content".to_string()));
        }

        Ok(message)
    }

    fn is_retryable(error: &OpenAIError) -> bool {
        match error {
            OpenAIError::ApiError(api_error) => {
                api_error.r#type.is_none() && api_error.code.is_none()
            }
            OpenAIError::Reqwest(reqwest_error) => reqwest_error
                .status()
                .map(|status| status.is_server_error())
                .unwrap_or(true),
            _ => false,
        }
    }

    fn rate_limit_error(error: &OpenAIError) -> Option<CogniError> {
        let limited = match error {
            OpenAIError::Reqwest(reqwest_error) => {
                reqwest_error.status() == Some(reqwest::StatusCode::TOO_MANY_REQUESTS)
            }
            OpenAIError::ApiError(api_error) => Self::api_error_matches(
                api_error,
                &["rate limit", "too many requests"],
                &["rate_limit", "insufficient_quota"],
            ),
            _ => false,
        };
        limited.then_some(CogniError::LlmRateLimit { retry_after: None })
    }

    fn auth_error(error: &OpenAIError) -> Option<CogniError> {
        match error {
            OpenAIError::Reqwest(reqwest_error)
                if matches!(
                    reqwest_error.status(),
                    Some(reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN)
                ) =>
            {
                Some(CogniError::ApiAuth(format!("LLM authentication failed: {reqwest_error}")))
            }
            OpenAIError::ApiError(api_error)
                if Self::api_error_matches(
                    api_error,
                    &["unauthorized", "forbidden", "authentication", "invalid api key"],
                    &["invalid_api_key", "authentication"],
                ) =>
            {
                Some(CogniError::ApiAuth(format!("LLM authentication failed: {api_error}")))
            }
            _ => None,
        }
    }

    fn api_error_matches(api_error: &ApiError, messages: &[&str], codes: &[&str]) -> bool {
        let message = api_error.message.to_lowercase();
        let error_type = api_error.r#type.clone().unwrap_or_default().to_lowercase();
        let code = api_error.code.clone().unwrap_or_default().to_lowercase();

        messages.iter().any(|needle| message.contains(needle))
            || codes
                .iter()
                .any(|needle| code.contains(needle) || error_type.contains(needle))
    }

    fn map_openai_error(error: OpenAIError) -> CogniError {
        match error {
            OpenAIError::Reqwest(reqwest_error) => {
                CogniError::Llm(format!("LLM request failed: {reqwest_error}"))
            }
            OpenAIError::ApiError(api_error) => CogniError::Llm(format!("LLM API error: {api_error}")),
            OpenAIError::JSONDeserialize(err) => {
                CogniError::Llm(format!("Failed to parse LLM response: {err}"))
            }
            OpenAIError::InvalidArgument(message) => CogniError::Validation(message),
            other => CogniError::Llm(other.to_string()),
        }
    }
}

impl ApiConfig {
    fn from_llm_config(config: &LlmConfig) -> Self {
        let (provider, model) = parse_llm_provider_model(&config.model);

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| default_base_url(provider).to_string());

        let model = if provider.eq_ignore_ascii_case("local") {
            config.model.clone()
        } else {
            model.to_string()
        };

        Self {
            base_url,
            api_key: config.api_key.clone(),
            model,
            timeout_secs: config.timeout_secs,
            max_retries: config.max_retries,
        }
    }
}

fn default_base_url(provider: &str) -> &'static str {
    match provider.to_lowercase().as_str() {
        "openrouter" => "https://openrouter.ai/api/v1",
        "ollama" => "http://localhost:11434/v1",
        "lmstudio" => "http://localhost:1234/v1",
        _ => "https://api.openai.com/v1",
    }
}
