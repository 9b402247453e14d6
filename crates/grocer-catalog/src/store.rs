use crate::embedding::cosine_similarity;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use grocer_core::{CatalogDocument, GrocerError, GrocerResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// A single product stored in the vector store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Stable identifier assigned at ingestion (source row index).
    pub id: String,
    /// Product name; the document text that gets embedded.
    pub name: String,
    /// Embedding of `name`.
    pub embedding: Vec<f32>,
    /// Loose metadata record (`price`, `store`, `brand`).
    pub metadata: HashMap<String, serde_json::Value>,
    /// When the entry was written to the store.
    pub indexed_at: DateTime<Utc>,
}

impl CatalogEntry {
    /// Projects the entry into the shape returned by a catalog fetch.
    pub fn to_document(&self) -> CatalogDocument {
        CatalogDocument {
            id: self.id.clone(),
            text: self.name.clone(),
            metadata: self.metadata.clone(),
        }
    }
}

/// Result of a nearest-neighbor query.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The matched entry.
    pub entry: CatalogEntry,
    /// Cosine similarity to the query vector.
    pub score: f32,
}

/// Trait for vector storage backends.
///
/// Iteration order of [`VectorStore::list`] is insertion order.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert a single entry.
    async fn insert(&self, entry: CatalogEntry) -> GrocerResult<()>;

    /// Insert a batch of entries, preserving their order.
    async fn insert_batch(&self, entries: Vec<CatalogEntry>) -> GrocerResult<()> {
        for entry in entries {
            self.insert(entry).await?;
        }
        Ok(())
    }

    /// Search for the top-k most similar entries to a query embedding,
    /// most similar first.
    async fn search(&self, query_embedding: &[f32], top_k: usize)
        -> GrocerResult<Vec<SearchResult>>;

    /// List all entries in insertion order.
    async fn list(&self) -> GrocerResult<Vec<CatalogEntry>>;

    /// List all entries as catalog documents (no embeddings) in insertion order.
    async fn documents(&self) -> GrocerResult<Vec<CatalogDocument>> {
        Ok(self.list().await?.iter().map(CatalogEntry::to_document).collect())
    }

    /// Count entries.
    async fn count(&self) -> GrocerResult<usize>;

    /// Embedding length of the stored entries, or `None` when empty.
    async fn dimension(&self) -> GrocerResult<Option<usize>> {
        Ok(self.list().await?.first().map(|e| e.embedding.len()))
    }
}

/// In-memory vector store using brute-force cosine similarity.
/// Suitable for catalogs up to a few hundred thousand products.
pub struct InMemoryVectorStore {
    entries: RwLock<Vec<CatalogEntry>>,
}

impl InMemoryVectorStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn insert(&self, entry: CatalogEntry) -> GrocerResult<()> {
        self.entries.write().await.push(entry);
        Ok(())
    }

    async fn insert_batch(&self, entries: Vec<CatalogEntry>) -> GrocerResult<()> {
        self.entries.write().await.extend(entries);
        Ok(())
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> GrocerResult<Vec<SearchResult>> {
        if query_embedding.is_empty() {
            return Err(GrocerError::Catalog("Empty query embedding".to_string()));
        }

        let entries = self.entries.read().await;
        if let Some(entry) = entries
            .iter()
            .find(|e| e.embedding.len() != query_embedding.len())
        {
            return Err(GrocerError::Catalog(format!(
                "Embedding dimension mismatch: query has {}, entry {} has {}",
                query_embedding.len(),
                entry.id,
                entry.embedding.len()
            )));
        }

        let mut scored: Vec<(usize, f32)> = entries
            .iter()
            .enumerate()
            .map(|(pos, e)| (pos, cosine_similarity(query_embedding, &e.embedding)))
            .collect();

        // Stable sort keeps insertion order among equal scores.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(pos, score)| SearchResult {
                entry: entries[pos].clone(),
                score,
            })
            .collect())
    }

    async fn list(&self) -> GrocerResult<Vec<CatalogEntry>> {
        Ok(self.entries.read().await.clone())
    }

    async fn documents(&self) -> GrocerResult<Vec<CatalogDocument>> {
        let entries = self.entries.read().await;
        Ok(entries.iter().map(CatalogEntry::to_document).collect())
    }

    async fn count(&self) -> GrocerResult<usize> {
        Ok(self.entries.read().await.len())
    }

    async fn dimension(&self) -> GrocerResult<Option<usize>> {
        Ok(self.entries.read().await.first().map(|e| e.embedding.len()))
    }
}

/// File-backed vector store that persists entries as JSONL on disk.
/// Loads all entries into memory on open; appends on insert.
pub struct FileVectorStore {
    path: PathBuf,
    inner: InMemoryVectorStore,
}

impl FileVectorStore {
    /// Opens the store at `path`, loading every entry if the file exists and
    /// creating the parent directory otherwise.
    pub async fn open(path: impl Into<PathBuf>) -> GrocerResult<Self> {
        let path = path.into();
        let inner = InMemoryVectorStore::new();

        if path.exists() {
            let data = tokio::fs::read_to_string(&path).await.map_err(|e| {
                GrocerError::Catalog(format!(
                    "Failed to read vector store {}: {e}",
                    path.display()
                ))
            })?;
            let mut loaded = Vec::new();
            for (lineno, line) in data.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                let entry: CatalogEntry = serde_json::from_str(line).map_err(|e| {
                    GrocerError::Catalog(format!("Invalid JSONL entry at line {}: {e}", lineno + 1))
                })?;
                loaded.push(entry);
            }
            inner.insert_batch(loaded).await?;
        } else if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    GrocerError::Catalog(format!("Failed to create dir: {e}"))
                })?;
            }
        }

        Ok(Self { path, inner })
    }

    /// Path of the backing JSONL file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append_to_file(&self, entries: &[CatalogEntry]) -> GrocerResult<()> {
        use tokio::io::AsyncWriteExt;

        let mut data = String::new();
        for entry in entries {
            data.push_str(&serde_json::to_string(entry)?);
            data.push('\n');
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| GrocerError::Catalog(format!("Failed to open vector store: {e}")))?;
        file.write_all(data.as_bytes())
            .await
            .map_err(|e| GrocerError::Catalog(format!("Failed to write entries: {e}")))?;
        file.flush()
            .await
            .map_err(|e| GrocerError::Catalog(format!("Failed to flush vector store: {e}")))?;
        Ok(())
    }
}

#[async_trait]
impl VectorStore for FileVectorStore {
    async fn insert(&self, entry: CatalogEntry) -> GrocerResult<()> {
        self.append_to_file(std::slice::from_ref(&entry)).await?;
        self.inner.insert(entry).await
    }

    async fn insert_batch(&self, entries: Vec<CatalogEntry>) -> GrocerResult<()> {
        if entries.is_empty() {
            return Ok(());
        }
        self.append_to_file(&entries).await?;
        self.inner.insert_batch(entries).await
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> GrocerResult<Vec<SearchResult>> {
        self.inner.search(query_embedding, top_k).await
    }

    async fn list(&self) -> GrocerResult<Vec<CatalogEntry>> {
        self.inner.list().await
    }

    async fn documents(&self) -> GrocerResult<Vec<CatalogDocument>> {
        self.inner.documents().await
    }

    async fn count(&self) -> GrocerResult<usize> {
        self.inner.count().await
    }

    async fn dimension(&self) -> GrocerResult<Option<usize>> {
        self.inner.dimension().await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn make_entry(id: &str, name: &str, embedding: Vec<f32>) -> CatalogEntry {
        let mut metadata = HashMap::new();
        metadata.insert("price".to_string(), json!(1.5));
        CatalogEntry {
            id: id.to_string(),
            name: name.to_string(),
            embedding,
            metadata,
            indexed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_count() {
        let store = InMemoryVectorStore::new();
        assert_eq!(store.count().await.unwrap(), 0);

        store
            .insert(make_entry("0", "milk", vec![1.0, 0.0, 0.0]))
            .await
            .unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_search_returns_similar() {
        let store = InMemoryVectorStore::new();
        store
            .insert(make_entry("0", "whole milk", vec![0.9, 0.1, 0.0]))
            .await
            .unwrap();
        store
            .insert(make_entry("1", "dish soap", vec![0.0, 0.0, 1.0]))
            .await
            .unwrap();

        let results = store.search(&[1.0, 0.0, 0.0], 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].entry.name, "whole milk");
        assert!(results[0].score > results[1].score);
    }

    #[tokio::test]
    async fn test_search_top_k() {
        let store = InMemoryVectorStore::new();
        for i in 0..10 {
            let mut emb = vec![0.0f32; 3];
            emb[i % 3] = 1.0;
            store
                .insert(make_entry(&i.to_string(), &format!("item {i}"), emb))
                .await
                .unwrap();
        }

        let results = store.search(&[1.0, 0.0, 0.0], 3).await.unwrap();
        assert_eq!(results.len(), 3);
    }

    #[tokio::test]
    async fn test_search_ties_keep_insertion_order() {
        let store = InMemoryVectorStore::new();
        store
            .insert_batch(vec![
                make_entry("0", "a", vec![1.0, 0.0]),
                make_entry("1", "b", vec![1.0, 0.0]),
                make_entry("2", "c", vec![1.0, 0.0]),
            ])
            .await
            .unwrap();

        let results = store.search(&[1.0, 0.0], 3).await.unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.entry.id.as_str()).collect();
        assert_eq!(ids, ["0", "1", "2"]);
    }

    #[tokio::test]
    async fn test_search_empty_query() {
        let store = InMemoryVectorStore::new();
        assert!(store.search(&[], 5).await.is_err());
    }

    #[tokio::test]
    async fn test_search_rejects_dimension_mismatch() {
        let store = InMemoryVectorStore::new();
        store
            .insert_batch(vec![
                make_entry("0", "dish soap", vec![1.0, 0.0, 0.0, 0.0]),
                make_entry("1", "whole milk", vec![0.0, 1.0, 0.0, 0.0]),
            ])
            .await
            .unwrap();

        let err = store.search(&[0.0, 1.0], 2).await.unwrap_err();
        assert!(matches!(err, GrocerError::Catalog(msg) if msg.contains("dimension mismatch")));
    }

    #[tokio::test]
    async fn test_dimension_reports_stored_length() {
        let store = InMemoryVectorStore::new();
        assert_eq!(store.dimension().await.unwrap(), None);
        store
            .insert(make_entry("0", "milk", vec![1.0, 0.0, 0.0]))
            .await
            .unwrap();
        assert_eq!(store.dimension().await.unwrap(), Some(3));
    }

    #[tokio::test]
    async fn test_documents_preserve_order_and_metadata() {
        let store = InMemoryVectorStore::new();
        store
            .insert_batch(vec![
                make_entry("0", "eggs", vec![1.0]),
                make_entry("1", "bacon", vec![0.5]),
            ])
            .await
            .unwrap();

        let docs = store.documents().await.unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].text, "eggs");
        assert_eq!(docs[1].id, "1");
        assert_eq!(docs[1].metadata["price"], json!(1.5));
    }

    #[tokio::test]
    async fn test_file_store_insert_and_persist() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("catalog.jsonl");

        {
            let store = FileVectorStore::open(path.clone()).await.unwrap();
            store
                .insert(make_entry("0", "bread", vec![1.0, 0.0]))
                .await
                .unwrap();
            store
                .insert_batch(vec![
                    make_entry("1", "butter", vec![0.0, 1.0]),
                    make_entry("2", "jam", vec![0.5, 0.5]),
                ])
                .await
                .unwrap();
            assert_eq!(store.count().await.unwrap(), 3);
        }

        let reopened = FileVectorStore::open(path).await.unwrap();
        let names: Vec<String> = reopened
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, ["bread", "butter", "jam"]);
    }

    #[tokio::test]
    async fn test_file_store_search() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileVectorStore::open(tmp.path().join("catalog.jsonl"))
            .await
            .unwrap();
        store
            .insert(make_entry("0", "close", vec![0.9, 0.1, 0.0]))
            .await
            .unwrap();
        store
            .insert(make_entry("1", "far", vec![0.0, 0.0, 1.0]))
            .await
            .unwrap();

        let results = store.search(&[1.0, 0.0, 0.0], 2).await.unwrap();
        assert_eq!(results[0].entry.name, "close");
    }

    #[tokio::test]
    async fn test_file_store_creates_parent_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("catalog.jsonl");
        let store = FileVectorStore::open(path.clone()).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
        assert!(path.parent().unwrap().is_dir());
    }

    #[tokio::test]
    async fn test_file_store_rejects_corrupt_line() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("catalog.jsonl");
        tokio::fs::write(&path, "{not json}\n").await.unwrap();
        let err = FileVectorStore::open(path).await.err().unwrap();
        assert!(matches!(err, GrocerError::Catalog(_)));
    }
}
