use grocer_catalog::Catalog;
use grocer_core::{Bucket, GrocerResult, Query, ResultItem, SemanticHit};
use std::sync::Arc;
use tracing::debug;

/// Appends nearest-neighbor results for queries long enough to benefit from
/// them.
///
/// Queries with fewer than `min_tokens` tokens are served from literal
/// matching alone; the semantic index is never contacted for them.
pub struct SemanticExpander {
    catalog: Arc<dyn Catalog>,
    min_tokens: usize,
    top_k: usize,
}

impl SemanticExpander {
    /// Creates an expander over `catalog`.
    pub fn new(catalog: Arc<dyn Catalog>, min_tokens: usize, top_k: usize) -> Self {
        Self {
            catalog,
            min_tokens,
            top_k,
        }
    }

    /// Whether `query` qualifies for semantic retrieval.
    pub fn applies_to(&self, query: &Query) -> bool {
        !query.is_blank() && query.token_count() >= self.min_tokens
    }

    /// Semantic results for `query` in index order, or nothing when the query
    /// is too short.
    pub async fn expand(&self, query: &Query) -> GrocerResult<Vec<ResultItem>> {
        if !self.applies_to(query) {
            return Ok(Vec::new());
        }
        let hits = self.catalog.semantic_query(query.raw(), self.top_k).await?;
        debug!(hits = hits.len(), "Semantic expansion");
        Ok(hits_to_items(hits))
    }
}

/// Converts nearest-neighbor hits to result items, dropping blank documents.
pub fn hits_to_items(hits: Vec<SemanticHit>) -> Vec<ResultItem> {
    hits.into_iter()
        .filter(|hit| !hit.text.trim().is_empty())
        .map(|hit| {
            ResultItem::from_parts(
                Some(hit.id),
                hit.text.trim(),
                &hit.metadata,
                Bucket::Semantic,
            )
        })
        .collect()
}
