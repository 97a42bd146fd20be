mod api;
mod mock;
mod provider;


pub use mock::mock_embedding;
pub use provider::{EmbeddingOracle, EmbeddingProvider};
