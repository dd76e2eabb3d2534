//! SQLite-based vector store implementation.
//!
//! Uses SQLite with cosine similarity computed in Rust for simplicity.
//! For production use cases with large datasets, consider using sqlite-vec
//! extension or a dedicated vector database.

use super::{
    cosine_similarity, rank_results, ChunkRecord, IndexMeta, IndexedEpisode, SearchResult,
    VectorStore,
};
use crate::chunking::Chunk;
use crate::error::{ReplikkError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS chunks (
        chunk_id TEXT PRIMARY KEY,
        season INTEGER NOT NULL,
        episode INTEGER NOT NULL,
        start_line INTEGER NOT NULL,
        end_line INTEGER NOT NULL,
        text TEXT NOT NULL,
        embedding BLOB NOT NULL,
        indexed_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_chunks_episode ON chunks(season, episode);

    CREATE TABLE IF NOT EXISTS index_meta (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );
"#;

/// SQLite-based vector store.
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
}

impl SqliteVectorStore {
    /// Open (or create) a SQLite vector store at the given path.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // Enable WAL mode for better concurrent performance
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite vector store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite vector store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock_conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| ReplikkError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    /// Serialize embedding to bytes.
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize embedding from bytes.
    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }

    fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChunkRecord> {
        let start_line: i64 = row.get(3)?;
        let end_line: i64 = row.get(4)?;
        let embedding_bytes: Vec<u8> = row.get(6)?;
        let indexed_at_str: String = row.get(7)?;

        Ok(ChunkRecord {
            chunk: Chunk {
                chunk_id: row.get(0)?,
                season: row.get(1)?,
                episode: row.get(2)?,
                start_line: start_line as usize,
                end_line: end_line as usize,
                text: row.get(5)?,
            },
            embedding: Self::bytes_to_embedding(&embedding_bytes),
            indexed_at: DateTime::parse_from_rfc3339(&indexed_at_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    #[instrument(skip(self, records), fields(count = records.len()))]
    async fn upsert_batch(&self, records: &[ChunkRecord]) -> Result<usize> {
        let conn = self.lock_conn()?;

        // One transaction per batch: either every record lands or none do.
        let tx = conn.unchecked_transaction()?;

        for record in records {
            let embedding_bytes = Self::embedding_to_bytes(&record.embedding);

            tx.execute(
                r#"
                INSERT OR REPLACE INTO chunks
                (chunk_id, season, episode, start_line, end_line, text, embedding, indexed_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
                params![
                    record.chunk.chunk_id,
                    record.chunk.season,
                    record.chunk.episode,
                    record.chunk.start_line as i64,
                    record.chunk.end_line as i64,
                    record.chunk.text,
                    embedding_bytes,
                    record.indexed_at.to_rfc3339(),
                ],
            )?;
        }

        tx.commit()?;
        info!("Committed batch of {} chunks", records.len());
        Ok(records.len())
    }

    async fn contains(&self, chunk_id: &str) -> Result<bool> {
        let conn = self.lock_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM chunks WHERE chunk_id = ?1",
            params![chunk_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    #[instrument(skip(self, query_embedding))]
    async fn search(&self, query_embedding: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        let conn = self.lock_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT chunk_id, season, episode, start_line, end_line, text, embedding, indexed_at
            FROM chunks
            "#,
        )?;

        let records = stmt.query_map([], Self::row_to_record)?;

        let mut results: Vec<SearchResult> = records
            .filter_map(|r| r.ok())
            .map(|record| {
                let score = cosine_similarity(query_embedding, &record.embedding);
                SearchResult {
                    chunk: record.chunk,
                    score,
                }
            })
            .collect();

        rank_results(&mut results, k);

        debug!("Found {} matching chunks", results.len());
        Ok(results)
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<usize> {
        let conn = self.lock_conn()?;
        let deleted = conn.execute("DELETE FROM chunks", [])?;
        conn.execute("DELETE FROM index_meta", [])?;
        info!("Cleared {} chunks from the index", deleted);
        Ok(deleted)
    }

    async fn chunk_count(&self) -> Result<usize> {
        let conn = self.lock_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    #[instrument(skip(self))]
    async fn list_episodes(&self) -> Result<Vec<IndexedEpisode>> {
        let conn = self.lock_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT season, episode, COUNT(*) as chunk_count, MAX(indexed_at) as indexed_at
            FROM chunks
            GROUP BY season, episode
            ORDER BY season, episode
            "#,
        )?;

        let episodes = stmt.query_map([], |row| {
            let indexed_at_str: String = row.get(3)?;
            Ok(IndexedEpisode {
                season: row.get(0)?,
                episode: row.get(1)?,
                chunk_count: row.get(2)?,
                indexed_at: DateTime::parse_from_rfc3339(&indexed_at_str)
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now()),
            })
        })?;

        let result: Vec<IndexedEpisode> = episodes.filter_map(|e| e.ok()).collect();
        Ok(result)
    }

    async fn index_meta(&self) -> Result<Option<IndexMeta>> {
        let conn = self.lock_conn()?;

        let model = conn.query_row(
            "SELECT value FROM index_meta WHERE key = 'embedding_model'",
            [],
            |row| row.get::<_, String>(0),
        );
        let dimensions = conn.query_row(
            "SELECT value FROM index_meta WHERE key = 'embedding_dimensions'",
            [],
            |row| row.get::<_, String>(0),
        );

        match (model, dimensions) {
            (Ok(embedding_model), Ok(dims)) => {
                let dimensions = dims.parse::<usize>().map_err(|_| {
                    ReplikkError::VectorStore(format!(
                        "Corrupt index metadata: bad dimensions '{}'",
                        dims
                    ))
                })?;
                Ok(Some(IndexMeta {
                    embedding_model,
                    dimensions,
                }))
            }
            (Err(rusqlite::Error::QueryReturnedNoRows), _)
            | (_, Err(rusqlite::Error::QueryReturnedNoRows)) => Ok(None),
            (Err(e), _) | (_, Err(e)) => Err(e.into()),
        }
    }

    async fn set_index_meta(&self, meta: &IndexMeta) -> Result<()> {
        let conn = self.lock_conn()?;

        conn.execute(
            "INSERT OR REPLACE INTO index_meta (key, value) VALUES ('embedding_model', ?1)",
            params![meta.embedding_model],
        )?;
        conn.execute(
            "INSERT OR REPLACE INTO index_meta (key, value) VALUES ('embedding_dimensions', ?1)",
            params![meta.dimensions.to_string()],
        )?;

        debug!(
            "Recorded index metadata: {} ({} dims)",
            meta.embedding_model, meta.dimensions
        );
        Ok(())
    }
}
