pub mod branch;
pub mod insights;
pub mod sentiment;
pub mod topic_graph;
pub mod utils;

pub use branch::BranchTriggerDetector;
pub use insights::{InsightGenerator, TimelineSnapshot};
pub use sentiment::{KeywordSentimentClassifier, LlmSentimentClassifier, SentimentOracle};
pub use topic_graph::TopicGraphBuilder;
