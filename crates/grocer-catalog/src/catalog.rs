use crate::embedding::EmbeddingProvider;
use crate::store::VectorStore;
use async_trait::async_trait;
use grocer_core::{CatalogDocument, GrocerError, GrocerResult, SemanticHit};
use std::sync::Arc;
use tracing::debug;

/// The read-only catalog service consumed by search.
///
/// Implementations must return documents in a stable order (the order the
/// catalog was built in) and semantic hits closest-first.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Every indexed product with its text and metadata.
    async fn fetch_all(&self) -> GrocerResult<Vec<CatalogDocument>>;

    /// The `top_k` products nearest to `query_text` by embedding similarity.
    async fn semantic_query(&self, query_text: &str, top_k: usize)
        -> GrocerResult<Vec<SemanticHit>>;

    /// Number of indexed products.
    async fn count(&self) -> GrocerResult<usize>;
}

/// Catalog backed by a [`VectorStore`] and the [`EmbeddingProvider`] that
/// built it.
pub struct EmbeddedCatalog {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl EmbeddedCatalog {
    /// Wraps an already-populated store.
    pub fn new(store: Arc<dyn VectorStore>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { store, embedder }
    }

    /// Wraps a store after checking that its vectors have the length the
    /// embedder produces.
    ///
    /// A store built with a different provider or dimension would otherwise
    /// fail every semantic query.
    pub async fn open(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> GrocerResult<Self> {
        if let Some(stored) = store.dimension().await? {
            if stored != embedder.dimension() {
                return Err(GrocerError::Catalog(format!(
                    "Store vectors have dimension {stored} but the embedder produces {}; \
                     rebuild the catalog with --force",
                    embedder.dimension()
                )));
            }
        }
        Ok(Self::new(store, embedder))
    }
}

#[async_trait]
impl Catalog for EmbeddedCatalog {
    async fn fetch_all(&self) -> GrocerResult<Vec<CatalogDocument>> {
        self.store.documents().await
    }

    async fn semantic_query(
        &self,
        query_text: &str,
        top_k: usize,
    ) -> GrocerResult<Vec<SemanticHit>> {
        let query_embedding = self.embedder.embed(query_text).await?;
        let results = self.store.search(&query_embedding, top_k).await?;
        debug!(hits = results.len(), top_k, "Semantic query served");

        Ok(results
            .into_iter()
            .map(|r| SemanticHit {
                id: r.entry.id,
                text: r.entry.name,
                metadata: r.entry.metadata,
                distance: 1.0 - r.score,
            })
            .collect())
    }

    async fn count(&self) -> GrocerResult<usize> {
        self.store.count().await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::embedding::LocalEmbedding;
    use crate::store::{CatalogEntry, InMemoryVectorStore};
    use chrono::Utc;
    use std::collections::HashMap;

    async fn catalog_with(names: &[&str]) -> EmbeddedCatalog {
        let embedder = Arc::new(LocalEmbedding::default());
        let store = Arc::new(InMemoryVectorStore::new());
        for (i, name) in names.iter().enumerate() {
            store
                .insert(CatalogEntry {
                    id: i.to_string(),
                    name: name.to_string(),
                    embedding: embedder.embed(name).await.unwrap(),
                    metadata: HashMap::new(),
                    indexed_at: Utc::now(),
                })
                .await
                .unwrap();
        }
        EmbeddedCatalog::new(store, embedder)
    }

    #[tokio::test]
    async fn test_fetch_all_in_build_order() {
        let catalog = catalog_with(&["Milk", "Almond Milk", "Bread"]).await;
        let docs = catalog.fetch_all().await.unwrap();
        let texts: Vec<&str> = docs.iter().map(|d| d.text.as_str()).collect();
        assert_eq!(texts, ["Milk", "Almond Milk", "Bread"]);
        assert_eq!(catalog.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_semantic_query_closest_first() {
        let catalog = catalog_with(&["Sourdough Bread", "Organic Whole Milk", "Dish Soap"]).await;
        let hits = catalog.semantic_query("organic whole milk gallon", 3).await.unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].text, "Organic Whole Milk");
        assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
    }

    #[tokio::test]
    async fn test_semantic_query_respects_top_k() {
        let catalog = catalog_with(&["a1", "a2", "a3", "a4"]).await;
        let hits = catalog.semantic_query("a1 a2 a3", 2).await.unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn test_open_rejects_store_built_with_other_dimension() {
        let built = catalog_with(&["Organic Whole Milk", "Dish Soap"]).await;
        let err = EmbeddedCatalog::open(built.store, Arc::new(LocalEmbedding::new(64)))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, GrocerError::Catalog(msg) if msg.contains("dimension 256")));
    }

    #[tokio::test]
    async fn test_open_accepts_matching_or_empty_store() {
        let built = catalog_with(&["Milk"]).await;
        assert!(EmbeddedCatalog::open(built.store, Arc::new(LocalEmbedding::default()))
            .await
            .is_ok());
        let empty = Arc::new(InMemoryVectorStore::new());
        assert!(EmbeddedCatalog::open(empty, Arc::new(LocalEmbedding::new(64)))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_semantic_query_with_mismatched_embedder_fails() {
        let built = catalog_with(&["Dish Soap", "Paper Towels", "Organic Whole Milk"]).await;
        let catalog = EmbeddedCatalog::new(built.store, Arc::new(LocalEmbedding::new(64)));
        assert!(catalog
            .semantic_query("organic whole milk gallon", 20)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_semantic_query_empty_catalog() {
        let catalog = catalog_with(&[]).await;
        let hits = catalog.semantic_query("anything at all", 20).await.unwrap();
        assert!(hits.is_empty());
    }
}
