use serde::Deserialize;
use std::collections::HashMap;
use std::env;

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

/// Parse `COGNIVAULT_API_KEYS` env var.
/// Format: comma-separated `token:user_id` pairs, e.g. `k1:alice,k2:bob`
fn parse_api_keys() -> HashMap<String, String> {
    match env::var("COGNIVAULT_API_KEYS") {
        Ok(val) if !val.is_empty() => parse_token_pairs(&val),
        _ => HashMap::new(),
    }
}

fn parse_token_pairs(raw: &str) -> HashMap<String, String> {
    raw.split(',')
        .filter(|pair| !pair.trim().is_empty())
        .filter_map(|pair| {
            let mut parts = pair.splitn(2, ':');
            let token = parts.next()?.trim();
            let user_id = parts.next().map(str::trim).unwrap_or_default();
            if token.is_empty() || user_id.is_empty() {
                tracing::warn!(
                    "Invalid token pair '{}' in COGNIVAULT_API_KEYS, skipping",
                    pair
                );
                None
            } else {
                Some((token.to_string(), user_id.to_string()))
            }
        })
        .collect()
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub embeddings: EmbeddingsConfig,
    pub llm: Option<LlmConfig>,
    pub timeline: TimelineConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Bearer token -> user id.
    pub api_keys: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub auth_token: Option<String>,
    pub local_path: Option<String>,
    pub busy_timeout_ms: u64,
    pub journal_mode: String,
    pub synchronous: String,
}

impl DatabaseConfig {
    /// Local file (or `:memory:`) database with default pragmas.
    pub fn local(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            auth_token: None,
            local_path: None,
            busy_timeout_ms: 5000,
            journal_mode: "WAL".to_string(),
            synchronous: "NORMAL".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingsConfig {
    /// `mock`, `local/<fastembed model>` or `<provider>/<model>` for
    /// OpenAI-compatible APIs.
    pub model: String,
    pub dimensions: usize,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
    /// Serve the deterministic mock embedding when a remote call fails.
    pub fallback_to_mock: bool,
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            model: "mock".to_string(),
            dimensions: 768,
            api_key: None,
            base_url: None,
            timeout_secs: 30,
            max_retries: 3,
            fallback_to_mock: true,
        }
    }
}

/// LLM configuration for chat/completion models
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

/// Tunables for the knowledge-evolution graph.
#[derive(Debug, Clone, Deserialize)]
pub struct TopicGraphConfig {
    /// Fraction of the first-seen ordering that counts as "early" topics.
    pub early_percentile: f64,
    /// Below this many distinct topics no new branches are reported.
    pub min_topics_for_branches: usize,
    pub related_topics_limit: usize,
}

impl Default for TopicGraphConfig {
    fn default() -> Self {
        Self {
            early_percentile: 0.3,
            min_topics_for_branches: 4,
            related_topics_limit: 3,
        }
    }
}

/// Tunables for branch-trigger detection.
#[derive(Debug, Clone, Deserialize)]
pub struct BranchTriggerConfig {
    /// A chunk only triggers when its best match against earlier chunks is
    /// strictly below this cosine similarity.
    pub similarity_threshold: f32,
    pub led_to_limit: usize,
}

impl Default for BranchTriggerConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.4,
            led_to_limit: 3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TimelineConfig {
    pub topic_graph: TopicGraphConfig,
    pub branch_triggers: BranchTriggerConfig,
    /// Number of sentiment classifications issued concurrently.
    pub sentiment_batch_size: usize,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            topic_graph: TopicGraphConfig::default(),
            branch_triggers: BranchTriggerConfig::default(),
            sentiment_batch_size: 10,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let embedding_defaults = EmbeddingsConfig::default();
        let graph_defaults = TopicGraphConfig::default();
        let branch_defaults = BranchTriggerConfig::default();

        Self {
            server: ServerConfig {
                host: env::var("COGNIVAULT_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_or("COGNIVAULT_PORT", 3000),
                api_keys: parse_api_keys(),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or_else(|_| "file:cognivault.db".to_string()),
                auth_token: env::var("DATABASE_AUTH_TOKEN").ok(),
                local_path: env::var("DATABASE_LOCAL_PATH").ok(),
                busy_timeout_ms: parse_env_or("DATABASE_BUSY_TIMEOUT_MS", 5000),
                journal_mode: env::var("DATABASE_JOURNAL_MODE").unwrap_or_else(|_| "WAL".to_string()),
                synchronous: env::var("DATABASE_SYNCHRONOUS")
                    .unwrap_or_else(|_| "NORMAL".to_string()),
            },
            embeddings: EmbeddingsConfig {
                model: env::var("EMBEDDING_MODEL").unwrap_or(embedding_defaults.model),
                dimensions: parse_env_or("EMBEDDING_DIMENSIONS", embedding_defaults.dimensions),
                api_key: env::var("EMBEDDING_API_KEY").ok(),
                base_url: env::var("EMBEDDING_BASE_URL").ok(),
                timeout_secs: parse_env_or("EMBEDDING_TIMEOUT", embedding_defaults.timeout_secs),
                max_retries: parse_env_or("EMBEDDING_MAX_RETRIES", embedding_defaults.max_retries),
                fallback_to_mock: parse_env_or(
                    "EMBEDDING_FALLBACK_TO_MOCK",
                    embedding_defaults.fallback_to_mock,
                ),
            },
            llm: env::var("LLM_MODEL").ok().map(|model| LlmConfig {
                model,
                api_key: env::var("LLM_API_KEY").ok(),
                base_url: env::var("LLM_BASE_URL").ok(),
                timeout_secs: parse_env_or("LLM_TIMEOUT", 30),
                max_retries: parse_env_or("LLM_MAX_RETRIES", 3),
            }),
            timeline: TimelineConfig {
                topic_graph: TopicGraphConfig {
                    early_percentile: parse_env_or(
                        "BRANCH_EARLY_PERCENTILE",
                        graph_defaults.early_percentile,
                    ),
                    min_topics_for_branches: parse_env_or(
                        "BRANCH_MIN_TOPICS",
                        graph_defaults.min_topics_for_branches,
                    ),
                    related_topics_limit: parse_env_or(
                        "BRANCH_RELATED_LIMIT",
                        graph_defaults.related_topics_limit,
                    ),
                },
                branch_triggers: BranchTriggerConfig {
                    similarity_threshold: parse_env_or(
                        "BRANCH_SIMILARITY_THRESHOLD",
                        branch_defaults.similarity_threshold,
                    ),
                    led_to_limit: parse_env_or("BRANCH_LED_TO_LIMIT", branch_defaults.led_to_limit),
                },
                sentiment_batch_size: parse_env_or("SENTIMENT_BATCH_SIZE", 10usize).max(1),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}

/// Known embedding providers that use OpenAI-compatible APIs
const KNOWN_PROVIDERS: &[&str] = &["openai", "openrouter", "ollama", "lmstudio", "local"];

/// Known LLM providers that use OpenAI-compatible APIs
pub const KNOWN_LLM_PROVIDERS: &[&str] = &["openai", "openrouter", "ollama", "lmstudio"];

/// Parse a model name into (provider, model) tuple.
pub fn parse_provider_model(model: &str) -> (&str, &str) {
    if model.eq_ignore_ascii_case("mock") {
        return ("mock", model);
    }
    if let Some((prefix, rest)) = model.split_once('/') {
        // Check if prefix is a known provider
        let prefix_lower = prefix.to_lowercase();
        if KNOWN_PROVIDERS.contains(&prefix_lower.as_str()) {
            return (prefix, rest);
        }
    }
    // Default to local provider
    ("local", model)
}

/// Parse an LLM model name into (provider, model) tuple.
pub fn parse_llm_provider_model(model: &str) -> (&str, &str) {
    if let Some((prefix, rest)) = model.split_once('/') {
        let prefix_lower = prefix.to_lowercase();
        if KNOWN_LLM_PROVIDERS.contains(&prefix_lower.as_str()) {
            return (prefix, rest);
        }
    }
    // Default to treating the whole string as a local model
    ("local", model)
}
