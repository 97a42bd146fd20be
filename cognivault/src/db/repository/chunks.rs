use chrono::{DateTime, SecondsFormat, Utc};
use libsql::{params, Connection};

use crate::error::Result;
use crate::models::Chunk;

pub struct ChunkRepository;

/// Fixed-width UTC timestamps so lexical order in SQL equals chronological
/// order. Callers only store years 0000-9999 (see `is_storable_timestamp`).
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl ChunkRepository {
    pub async fn create(conn: &Connection, chunk: &Chunk) -> Result<()> {
        let tags_json = serde_json::to_string(&chunk.tags)?;

        conn.execute(
            r#"
            INSERT INTO chunks (id, user_id, file_id, chunk_text, summary, tags, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                chunk.id.clone(),
                chunk.user_id.clone(),
                chunk.file_id.clone(),
                chunk.text.clone(),
                chunk.summary.clone(),
                tags_json,
                format_timestamp(&chunk.created_at),
            ],
        )
        .await?;

        Ok(())
    }

    /// All chunks of a user, oldest first. Equal timestamps keep insertion order.
    pub async fn list_for_user(conn: &Connection, user_id: &str) -> Result<Vec<Chunk>> {
        let mut rows = conn
            .query(
                r#"
                SELECT id, user_id, file_id, chunk_text, summary, tags, created_at
                FROM chunks
                WHERE user_id = ?1
                ORDER BY created_at ASC, rowid ASC
                "#,
                params![user_id],
            )
            .await?;

        let mut chunks = Vec::new();
        while let Some(row) = rows.next().await? {
            if let Some(chunk) = Self::row_to_chunk(&row)? {
                chunks.push(chunk);
            }
        }

        Ok(chunks)
    }

    pub async fn delete_for_user(conn: &Connection, user_id: &str) -> Result<u64> {
        let deleted = conn
            .execute("DELETE FROM chunks WHERE user_id = ?1", params![user_id])
            .await?;
        Ok(deleted)
    }

    fn row_to_chunk(row: &libsql::Row) -> Result<Option<Chunk>> {
        let id: String = row.get(0)?;
        let raw_created_at: String = row.get(6)?;
        let created_at = match DateTime::parse_from_rfc3339(&raw_created_at) {
            Ok(dt) => dt.with_timezone(&Utc),
            Err(error) => {
                tracing::warn!(chunk_id = %id, error = %error, "Skipping chunk with unreadable timestamp");
                return Ok(None);
            }
        };

        Ok(Some(Chunk {
            id,
            user_id: row.get(1)?,
            file_id: row.get::<Option<String>>(2)?,
            text: row.get::<Option<String>>(3)?,
            summary: row.get::<Option<String>>(4)?,
            tags: serde_json::from_str(&row.get::<String>(5)?).unwrap_or_default(),
            created_at,
        }))
    }
}
