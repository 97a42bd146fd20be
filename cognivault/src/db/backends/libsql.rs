use async_trait::async_trait;

use crate::db::connection::Database;
use crate::db::repository::ChunkRepository;
use crate::db::traits::{ChunkStore, DatabaseBackend};
use crate::error::Result;
use crate::models::Chunk;

pub struct LibSqlBackend {
    db: Database,
}

impl LibSqlBackend {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ChunkStore for LibSqlBackend {
    async fn get_chunks_for_user(&self, user_id: &str) -> Result<Vec<Chunk>> {
        let conn = self.db.connect()?;
        ChunkRepository::list_for_user(&conn, user_id).await
    }

    async fn create_chunk(&self, chunk: &Chunk) -> Result<()> {
        let conn = self.db.connect()?;
        ChunkRepository::create(&conn, chunk).await
    }

    async fn delete_chunks_for_user(&self, user_id: &str) -> Result<u64> {
        let conn = self.db.connect()?;
        ChunkRepository::delete_for_user(&conn, user_id).await
    }
}

#[async_trait]
impl DatabaseBackend for LibSqlBackend {
    async fn sync(&self) -> Result<()> {
        self.db.sync().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use chrono::Utc;
    use tempfile::TempDir;

    #[tokio::test]
    async fn backend_round_trips_chunks_through_the_store_trait() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("backend.db");
        let db = Database::new(&DatabaseConfig::local(format!("file:{}", db_path.display())))
            .await
            .unwrap();
        let backend = LibSqlBackend::new(db);
        let store: &dyn ChunkStore = &backend;

        let chunk = Chunk::new("c1".to_string(), "alice".to_string(), Utc::now())
            .with_text("Derivatives measure change")
            .with_tags(["math", "calculus"]);
        store.create_chunk(&chunk).await.unwrap();

        let chunks = store.get_chunks_for_user("alice").await.unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].tags, vec!["math", "calculus"]);

        assert!(store.get_chunks_for_user("bob").await.unwrap().is_empty());
        backend.sync().await.unwrap();
    }
}
