//! SQLite-backed document store.
//!
//! Each collection is one database file holding the stored texts with their
//! embeddings. Search is an exhaustive scan ranked by squared L2 distance.
//! All SQLite work runs on the blocking thread pool.

use crate::embeddings::{EmbeddingConfig, EmbeddingProvider};
use crate::store::DocumentStore;
use crate::types::{KnowledgeItem, SearchHit};
use rag_core::{AppError, AppResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

const INSERT_SQL: &str =
    "INSERT INTO documents (id, text, embedding, created_at) VALUES (?1, ?2, ?3, ?4)";
const UPSERT_SQL: &str =
    "INSERT OR REPLACE INTO documents (id, text, embedding, created_at) VALUES (?1, ?2, ?3, ?4)";

/// Persistent store backed by a single SQLite file.
pub struct SqliteDocumentStore {
    conn: Arc<Mutex<Connection>>,
    embedder: Arc<dyn EmbeddingProvider>,
    path: PathBuf,
}

impl std::fmt::Debug for SqliteDocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteDocumentStore")
            .field("path", &self.path)
            .field("embedder", &self.embedder)
            .finish()
    }
}

impl SqliteDocumentStore {
    /// Open or create the store at `db_path`.
    ///
    /// A new store records the embedding provider, model and dimensions.
    /// Reopening with a different embedding is an error.
    pub fn open(db_path: &Path, embedder: Arc<dyn EmbeddingProvider>) -> AppResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Knowledge(format!("Failed to create store directory: {}", e))
            })?;
        }

        let conn = Connection::open(db_path)
            .map_err(|e| AppError::Knowledge(format!("Failed to open SQLite store: {}", e)))?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                text TEXT NOT NULL,
                embedding BLOB NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )
        .map_err(|e| AppError::Knowledge(format!("Failed to create tables: {}", e)))?;

        check_embedding_meta(&conn, embedder.as_ref())?;

        tracing::debug!("Opened SQLite store at {:?}", db_path);
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            embedder,
            path: db_path.to_path_buf(),
        })
    }

    /// Run `f` against the connection on the blocking thread pool.
    async fn with_conn<T, F>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&Connection) -> AppResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|_| AppError::Knowledge("SQLite store lock poisoned".to_string()))?;
            f(&conn)
        })
        .await
        .map_err(|e| AppError::Knowledge(format!("SQLite task failed: {}", e)))?
    }

    async fn write(&self, sql: &'static str, item: &KnowledgeItem) -> AppResult<()> {
        let bytes = embedding_to_bytes(&self.embedder.embed(&item.text).await?);
        let item = item.clone();

        self.with_conn(move |conn| {
            conn.execute(
                sql,
                params![item.id, item.text, bytes, item.created_at.to_rfc3339()],
            )
            .map_err(|e| {
                AppError::Knowledge(format!("Failed to write document '{}': {}", item.id, e))
            })?;
            Ok(())
        })
        .await
    }
}

/// Compare the stored embedding identity with `embedder`, recording it on
/// first use.
fn check_embedding_meta(conn: &Connection, embedder: &dyn EmbeddingProvider) -> AppResult<()> {
    let current = EmbeddingConfig {
        provider: embedder.provider_name().to_string(),
        model: embedder.model_name().to_string(),
        dimensions: embedder.dimensions(),
        normalize: true,
        endpoint: None,
    };

    let read = |key: &str| -> AppResult<Option<String>> {
        conn.query_row("SELECT value FROM meta WHERE key = ?1", [key], |row| {
            row.get(0)
        })
        .optional()
        .map_err(|e| AppError::Knowledge(format!("Failed to read store metadata: {}", e)))
    };

    match (read("provider")?, read("model")?, read("dimensions")?) {
        (Some(provider), Some(model), Some(dimensions)) => {
            let dimensions = dimensions.parse::<usize>().map_err(|e| {
                AppError::Knowledge(format!("Corrupt dimensions in store metadata: {}", e))
            })?;
            let stored = EmbeddingConfig {
                provider,
                model,
                dimensions,
                ..current.clone()
            };
            stored
                .validate_consistency(&current)
                .map_err(|e| AppError::Knowledge(format!("Store embedding mismatch: {}", e)))
        }
        _ => {
            for (key, value) in [
                ("provider", current.provider.clone()),
                ("model", current.model.clone()),
                ("dimensions", current.dimensions.to_string()),
            ] {
                conn.execute(
                    "INSERT OR REPLACE INTO meta (key, value) VALUES (?1, ?2)",
                    params![key, value],
                )
                .map_err(|e| {
                    AppError::Knowledge(format!("Failed to write store metadata: {}", e))
                })?;
            }
            Ok(())
        }
    }
}

/// Rank every stored document against `query_embedding`.
fn scan(conn: &Connection, query_embedding: &[f32], top_k: usize) -> AppResult<Vec<SearchHit>> {
    let mut stmt = conn
        .prepare("SELECT id, text, embedding FROM documents ORDER BY rowid")
        .map_err(|e| AppError::Knowledge(format!("Failed to prepare query: {}", e)))?;

    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Vec<u8>>(2)?,
            ))
        })
        .map_err(|e| AppError::Knowledge(format!("Failed to query documents: {}", e)))?;

    let mut hits = Vec::new();
    for row in rows {
        let (id, text, bytes) =
            row.map_err(|e| AppError::Knowledge(format!("Failed to read document: {}", e)))?;
        let embedding = bytes_to_embedding(&bytes)?;
        hits.push(SearchHit::new(id, text, squared_l2(query_embedding, &embedding)));
    }

    // Stable sort keeps insertion order among equal distances
    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    hits.truncate(top_k);
    Ok(hits)
}

#[async_trait::async_trait]
impl DocumentStore for SqliteDocumentStore {
    fn backend_name(&self) -> &str {
        "sqlite"
    }

    async fn add(&self, item: &KnowledgeItem) -> AppResult<()> {
        self.write(INSERT_SQL, item).await?;
        tracing::debug!("Added document {}", item.id);
        Ok(())
    }

    async fn upsert(&self, item: &KnowledgeItem) -> AppResult<()> {
        self.write(UPSERT_SQL, item).await?;
        tracing::debug!("Upserted document {}", item.id);
        Ok(())
    }

    async fn search(&self, query: &str, top_k: usize) -> AppResult<Vec<SearchHit>> {
        let query_embedding = self.embedder.embed(query).await?;
        let hits = self
            .with_conn(move |conn| scan(conn, &query_embedding, top_k))
            .await?;

        tracing::debug!("Retrieved {} documents (requested top-{})", hits.len(), top_k);
        Ok(hits)
    }

    async fn count(&self) -> AppResult<u64> {
        self.with_conn(|conn| {
            conn.query_row("SELECT COUNT(*) FROM documents", [], |row| {
                row.get::<_, i64>(0).map(|v| v as u64)
            })
            .map_err(|e| AppError::Knowledge(format!("Failed to count documents: {}", e)))
        })
        .await
    }
}


/// Convert embedding vector to bytes for storage.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for &value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Convert bytes back to embedding vector.
fn bytes_to_embedding(bytes: &[u8]) -> AppResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(AppError::Knowledge(
            "Invalid embedding bytes length".to_string(),
        ));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// Squared Euclidean distance. Mismatched lengths yield infinity.
fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return f32::INFINITY;
    }
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::trigram::TrigramProvider;
    use tempfile::TempDir;

    fn open(dir: &TempDir) -> SqliteDocumentStore {
        SqliteDocumentStore::open(
            &dir.path().join("db").join("docs.sqlite"),
            Arc::new(TrigramProvider::new(384)),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_empty_store_search() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);

        assert_eq!(store.count().await.unwrap(), 0);
        assert!(store.search("anything", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_orders_by_distance() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);

        store
            .add(&KnowledgeItem::new("Bananas grow in tropical climates"))
            .await
            .unwrap();
        store
            .add(&KnowledgeItem::new("The office wifi password is hunter2"))
            .await
            .unwrap();
        store
            .add(&KnowledgeItem::new("Quarterly reports are due Friday"))
            .await
            .unwrap();

        let hits = store
            .search("What is the office wifi password?", 5)
            .await
            .unwrap();

        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].text, "The office wifi password is hunter2");
        assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
        assert!(hits[0].distance < 0.9);
    }

    #[tokio::test]
    async fn test_search_respects_top_k() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        for i in 0..7 {
            store
                .add(&KnowledgeItem::new(format!("document number {}", i)))
                .await
                .unwrap();
        }

        assert_eq!(store.search("document", 5).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_same_text_added_twice_is_two_documents() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);

        let first = KnowledgeItem::new("duplicate fact");
        let second = KnowledgeItem::new("duplicate fact");
        store.add(&first).await.unwrap();
        store.add(&second).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 2);
        let hits = store.search("duplicate fact", 5).await.unwrap();
        assert_eq!(hits[0].distance, hits[1].distance);
        assert_eq!(hits[0].id, first.id);
    }

    #[tokio::test]
    async fn test_add_duplicate_id_fails() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);

        store
            .add(&KnowledgeItem::with_id("fixed", "one"))
            .await
            .unwrap();
        let result = store.add(&KnowledgeItem::with_id("fixed", "two")).await;
        assert!(matches!(result, Err(AppError::Knowledge(_))));
    }

    #[tokio::test]
    async fn test_upsert_replaces() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);

        store
            .upsert(&KnowledgeItem::with_id("knowledge", "old"))
            .await
            .unwrap();
        store
            .upsert(&KnowledgeItem::with_id("knowledge", "new"))
            .await
            .unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        let text = store
            .with_conn(|conn| {
                conn.query_row(
                    "SELECT text FROM documents WHERE id = 'knowledge'",
                    [],
                    |row| row.get::<_, String>(0),
                )
                .map_err(|e| AppError::Knowledge(e.to_string()))
            })
            .await
            .unwrap();
        assert_eq!(text, "new");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_add_and_search() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(open(&dir));

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .add(&KnowledgeItem::new(format!("concurrent fact {}", i)))
                    .await
                    .unwrap();
                store.search("concurrent fact", 5).await.unwrap().len()
            }));
        }

        for handle in handles {
            let found = handle.await.unwrap();
            assert!((1..=5).contains(&found));
        }

        assert_eq!(store.count().await.unwrap(), 8);
        assert_eq!(store.search("concurrent fact", 5).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_reopen_persists() {
        let dir = TempDir::new().unwrap();
        {
            let store = open(&dir);
            store
                .add(&KnowledgeItem::new("persistent fact"))
                .await
                .unwrap();
        }

        let store = open(&dir);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[test]
    fn test_reopen_with_other_embedding_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("docs.sqlite");
        SqliteDocumentStore::open(&path, Arc::new(TrigramProvider::new(384))).unwrap();

        let result = SqliteDocumentStore::open(&path, Arc::new(TrigramProvider::new(128)));
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Dimension mismatch"));
    }

    #[test]
    fn test_embedding_bytes() {
        let embedding = vec![1.5, -0.25, 0.0];
        let bytes = embedding_to_bytes(&embedding);
        assert_eq!(bytes.len(), 12);
        assert_eq!(bytes_to_embedding(&bytes).unwrap(), embedding);
        assert!(bytes_to_embedding(&bytes[..5]).is_err());
    }

    #[test]
    fn test_squared_l2() {
        assert_eq!(squared_l2(&[1.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(squared_l2(&[1.0, 0.0], &[0.0, 1.0]), 2.0);
        assert_eq!(squared_l2(&[1.0], &[1.0, 0.0]), f32::INFINITY);
    }
}
