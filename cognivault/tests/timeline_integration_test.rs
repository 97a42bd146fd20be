//! End-to-end timeline tests: a real router on a TCP port, a temporary
//! libsql database and `reqwest` as the client.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::net::TcpListener;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use cognivault::api::{create_router, AppState};
use cognivault::config::{Config, DatabaseConfig, EmbeddingsConfig, LlmConfig};
use cognivault::db::{Database, LibSqlBackend};
use cognivault::embeddings::EmbeddingProvider;
use cognivault::llm::LlmProvider;

const ALICE: &str = "alice-token";
const BOB: &str = "bob-token";

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    _dir: TempDir,
}

impl TestServer {
    async fn start(embeddings: EmbeddingsConfig, llm: Option<LlmConfig>) -> Self {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("timeline.db");

        let mut config = Config::default();
        config.server.api_keys = [(ALICE, "alice"), (BOB, "bob")]
            .into_iter()
            .map(|(token, user)| (token.to_string(), user.to_string()))
            .collect();
        config.database = DatabaseConfig::local(format!("file:{}", db_path.display()));
        config.embeddings = embeddings;
        config.llm = llm;
        config.timeline = Default::default();

        let db = Database::new(&config.database).await.unwrap();
        let backend = Arc::new(LibSqlBackend::new(db));
        let embeddings = EmbeddingProvider::new(&config.embeddings).unwrap();
        let llm = LlmProvider::new(config.llm.as_ref());
        let state = AppState::new(config, backend, embeddings, llm);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, create_router(state)).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}/api/v1"),
            client: reqwest::Client::new(),
            _dir: dir,
        }
    }

    async fn mock_only() -> Self {
        Self::start(EmbeddingsConfig::default(), None).await
    }

    async fn get(&self, route: &str, token: Option<&str>) -> (u16, Value) {
        let mut request = self.client.get(format!("{}{route}", self.base_url));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await.unwrap();
        let status = response.status().as_u16();
        (status, response.json().await.unwrap())
    }

    async fn data(&self, route: &str, token: &str) -> Value {
        let (status, body) = self.get(route, Some(token)).await;
        assert_eq!(status, 200, "GET {route} failed: {body}");
        body["data"].clone()
    }

    async fn ingest(&self, token: &str, body: Value) -> Value {
        let response = self
            .client
            .post(format!("{}/chunks", self.base_url))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 201);
        let body: Value = response.json().await.unwrap();
        body["data"].clone()
    }

    /// Three chunks: math, math+physics, art, in January and February.
    async fn seed_alice(&self) {
        self.ingest(
            ALICE,
            json!({
                "text": "Limits and continuity.\nEpsilon-delta proofs.\nMore notes.",
                "tags": ["Math"],
                "summary": "A great insight into limits",
                "createdAt": "2024-01-05T09:00:00Z"
            }),
        )
        .await;
        self.ingest(
            ALICE,
            json!({
                "text": "Kinematics with calculus",
                "tags": ["math", "physics"],
                "fileId": "mechanics.pdf",
                "createdAt": "2024-01-20T09:00:00Z"
            }),
        )
        .await;
        self.ingest(
            ALICE,
            json!({
                "text": "Watercolor wash was a difficult problem",
                "tags": ["art"],
                "createdAt": "2024-02-02T09:00:00Z"
            }),
        )
        .await;
    }
}

fn llm_reply(content: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "created": 1,
        "model": "gpt-4o-mini",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
}

#[tokio::test]
async fn rejects_missing_and_unknown_tokens() {
    let server = TestServer::mock_only().await;

    let (status, body) = server.get("/timeline/events", None).await;
    assert_eq!(status, 401);
    assert_eq!(body["error"]["code"], "unauthorized");

    let (status, body) = server.get("/timeline/events", Some("stolen")).await;
    assert_eq!(status, 403);
    assert_eq!(body["error"]["code"], "forbidden");

    let (status, _) = server.get("/health", None).await;
    assert_eq!(status, 200);
}

#[tokio::test]
async fn events_are_chronological_and_scoped_to_the_token_user() {
    let server = TestServer::mock_only().await;
    server.seed_alice().await;
    server
        .ingest(BOB, json!({ "text": "bob's private note", "tags": ["secret"] }))
        .await;

    let events = server.data("/timeline/events", ALICE).await;
    let events = events.as_array().unwrap();
    assert_eq!(events.len(), 3);
    assert_eq!(events[0]["fileId"], "direct_input");
    assert_eq!(events[0]["userId"], "alice");
    assert_eq!(
        events[0]["textSnippet"],
        "Limits and continuity. Epsilon-delta proofs."
    );
    assert_eq!(events[0]["summary"], "A great insight into limits");
    assert_eq!(events[1]["fileId"], "mechanics.pdf");
    assert_eq!(events[1]["summary"], "");
    assert_eq!(events[2]["tags"], json!(["art"]));

    let bob_events = server.data("/timeline/events", BOB).await;
    assert_eq!(bob_events.as_array().unwrap().len(), 1);
    assert_eq!(bob_events[0]["tags"], json!(["secret"]));
}

#[tokio::test]
async fn topic_spikes_and_knowledge_evolution() {
    let server = TestServer::mock_only().await;
    server.seed_alice().await;

    let spikes = server.data("/timeline/topic-spikes", ALICE).await;
    assert_eq!(
        spikes,
        json!({
            "2024-01": { "math": 2, "physics": 1 },
            "2024-02": { "art": 1 }
        })
    );

    let graph = server.data("/timeline/knowledge-evolution", ALICE).await;
    let nodes = graph["nodes"].as_array().unwrap();
    let labels: Vec<&str> = nodes.iter().map(|n| n["label"].as_str().unwrap()).collect();
    assert_eq!(labels, vec!["math", "physics", "art"]);
    assert_eq!(nodes[0]["count"], 2);
    assert_eq!(nodes[0]["type"], "topic");
    assert_eq!(nodes[0]["firstSeen"], "2024-01-05T09:00:00Z");

    let edges = graph["edges"].as_array().unwrap();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0]["source"], nodes[0]["id"]);
    assert_eq!(edges[0]["target"], nodes[1]["id"]);
    assert_eq!(edges[0]["weight"], 1);
    assert_eq!(edges[0]["type"], "related");
    assert_eq!(graph["newBranches"], json!([]));
}

#[tokio::test]
async fn emotion_trend_and_insights_without_llm() {
    let server = TestServer::mock_only().await;
    server.seed_alice().await;

    let trend = server.data("/timeline/emotion-trend", ALICE).await;
    let labels: Vec<&str> = trend
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["sentiment"].as_str().unwrap())
        .collect();
    assert_eq!(labels, vec!["positive", "neutral", "negative"]);

    let insights = server.data("/timeline/insights", ALICE).await;
    assert_eq!(
        insights["insights"],
        "You've created 3 learning events. Your top topics are: math, art, physics. Keep exploring!"
    );
}

#[tokio::test]
async fn branch_triggers_with_mock_embeddings() {
    let server = TestServer::mock_only().await;
    server.seed_alice().await;

    let triggers = server.data("/timeline/branch-triggers", ALICE).await;
    let triggers = triggers.as_array().unwrap();
    assert!(!triggers.is_empty());
    assert_eq!(triggers[0]["trigger"], "math");
    assert_eq!(triggers[0]["date"], "2024-01-05T09:00:00Z");
    assert_eq!(triggers[0]["ledTo"], json!(["physics"]));
}

#[tokio::test]
async fn branch_triggers_with_embedding_api() {
    let embedding_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": [{ "object": "embedding", "index": 0, "embedding": [0.6, 0.8, 0.0] }],
            "model": "text-embedding-3-small"
        })))
        .expect(3)
        .mount(&embedding_server)
        .await;

    let embeddings = EmbeddingsConfig {
        model: "openai/text-embedding-3-small".to_string(),
        dimensions: 3,
        api_key: Some("test-key".to_string()),
        base_url: Some(embedding_server.uri()),
        timeout_secs: 5,
        max_retries: 0,
        fallback_to_mock: false,
    };
    let server = TestServer::start(embeddings, None).await;
    server.seed_alice().await;

    // Identical vectors: only the first chunk has nothing similar before it.
    let triggers = server.data("/timeline/branch-triggers", ALICE).await;
    assert_eq!(triggers.as_array().unwrap().len(), 1);
    assert_eq!(triggers[0]["trigger"], "math");
}

#[tokio::test]
async fn embedding_outage_skips_chunks_instead_of_failing() {
    let embedding_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&embedding_server)
        .await;

    let embeddings = EmbeddingsConfig {
        model: "openai/text-embedding-3-small".to_string(),
        dimensions: 3,
        api_key: Some("test-key".to_string()),
        base_url: Some(embedding_server.uri()),
        timeout_secs: 5,
        max_retries: 0,
        fallback_to_mock: false,
    };
    let server = TestServer::start(embeddings, None).await;
    server.seed_alice().await;

    let triggers = server.data("/timeline/branch-triggers", ALICE).await;
    assert_eq!(triggers, json!([]));
}

#[tokio::test]
async fn llm_drives_sentiment_and_insights() {
    let llm_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("Analyze the sentiment"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(llm_reply(r#"{"label": "positive", "score": 0.75}"#)),
        )
        .mount(&llm_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("learning timeline data"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(llm_reply("  You moved from math into art.  ")),
        )
        .mount(&llm_server)
        .await;

    let llm = LlmConfig {
        model: "openai/gpt-4o-mini".to_string(),
        api_key: Some("test-key".to_string()),
        base_url: Some(llm_server.uri()),
        timeout_secs: 5,
        max_retries: 0,
    };
    let server = TestServer::start(EmbeddingsConfig::default(), Some(llm)).await;
    server.seed_alice().await;

    let trend = server.data("/timeline/emotion-trend", ALICE).await;
    let trend = trend.as_array().unwrap();
    assert_eq!(trend.len(), 3);
    for point in trend {
        assert_eq!(point["sentiment"], "positive");
        assert_eq!(point["score"], 0.75);
    }

    let insights = server.data("/timeline/insights", ALICE).await;
    assert_eq!(insights["insights"], "You moved from math into art.");
}

#[tokio::test]
async fn failing_llm_degrades_to_neutral_and_growth_message() {
    let llm_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "message": "bad request", "type": "invalid_request_error", "code": null }
        })))
        .mount(&llm_server)
        .await;

    let llm = LlmConfig {
        model: "openai/gpt-4o-mini".to_string(),
        api_key: Some("test-key".to_string()),
        base_url: Some(llm_server.uri()),
        timeout_secs: 5,
        max_retries: 0,
    };
    let server = TestServer::start(EmbeddingsConfig::default(), Some(llm)).await;
    server.seed_alice().await;

    let trend = server.data("/timeline/emotion-trend", ALICE).await;
    for point in trend.as_array().unwrap() {
        assert_eq!(point["sentiment"], "neutral");
        assert_eq!(point["score"], 0.5);
    }

    let insights = server.data("/timeline/insights", ALICE).await;
    assert_eq!(
        insights["insights"],
        "Your learning journey shows continuous growth. Keep exploring new topics!"
    );
}

#[tokio::test]
async fn new_user_gets_empty_results() {
    let server = TestServer::mock_only().await;

    assert_eq!(server.data("/timeline/events", BOB).await, json!([]));
    assert_eq!(server.data("/timeline/topic-spikes", BOB).await, json!({}));
    assert_eq!(server.data("/timeline/emotion-trend", BOB).await, json!([]));
    assert_eq!(server.data("/timeline/branch-triggers", BOB).await, json!([]));
    assert_eq!(
        server.data("/timeline/knowledge-evolution", BOB).await,
        json!({ "nodes": [], "edges": [], "newBranches": [] })
    );
    assert_eq!(
        server.data("/timeline/insights", BOB).await["insights"],
        "Start uploading content to see your learning journey unfold!"
    );
}
