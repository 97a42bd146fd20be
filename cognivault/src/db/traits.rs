use async_trait::async_trait;

use crate::error::Result;
use crate::models::Chunk;

/// Source of a user's chunks. Implementations must return chunks ordered by
/// `created_at` ascending, ties in insertion order.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    async fn get_chunks_for_user(&self, user_id: &str) -> Result<Vec<Chunk>>;
    async fn create_chunk(&self, chunk: &Chunk) -> Result<()>;
    async fn delete_chunks_for_user(&self, user_id: &str) -> Result<u64>;
}

/// A full storage backend. Every backend is a chunk store that can also sync.
#[async_trait]
pub trait DatabaseBackend: ChunkStore {
    /// Sync with remote (e.g. Turso replication). No-op for local-only backends.
    async fn sync(&self) -> Result<()>;
}
