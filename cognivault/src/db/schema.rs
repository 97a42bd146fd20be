use libsql::Connection;

use crate::error::Result;

pub async fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Content chunks, one row per ingested unit
        CREATE TABLE IF NOT EXISTS chunks (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            file_id TEXT,
            chunk_text TEXT,
            summary TEXT,
            tags TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_chunks_user_created ON chunks(user_id, created_at);
        "#,
    )
    .await?;

    Ok(())
}
