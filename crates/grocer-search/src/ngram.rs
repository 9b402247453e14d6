use crate::literal::{classify, LiteralBuckets, LiteralMatcher};
use async_trait::async_trait;
use grocer_catalog::Catalog;
use grocer_core::{CatalogDocument, GrocerResult, Query, ResultItem};
use std::collections::HashMap;
use tracing::info;

/// Character n-gram length used for the inverted index.
const GRAM: usize = 3;

/// Character trigrams of `text`, in order, with duplicates.
fn trigrams(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars.windows(GRAM).map(|w| w.iter().collect()).collect()
}

/// Intersects two ascending posting lists.
fn intersect(a: &[u32], b: &[u32]) -> Vec<u32> {
    let (mut i, mut j) = (0, 0);
    let mut out = Vec::with_capacity(a.len().min(b.len()));
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out
}

/// Trigram inverted index over a catalog snapshot.
///
/// Any document containing a token as a substring also contains every
/// trigram of that token, so intersecting the trigram posting lists yields a
/// superset of the literal matches. Candidates are then checked with the
/// exact substring predicate. Tokens shorter than three characters do not
/// narrow the candidate set.
#[derive(Debug, Clone)]
pub struct NgramIndex {
    docs: Vec<CatalogDocument>,
    /// Lowercased document texts, parallel to `docs`.
    lowered: Vec<String>,
    /// trigram -> ascending document positions
    postings: HashMap<String, Vec<u32>>,
}

impl NgramIndex {
    /// Indexes `docs`, keeping their order as the catalog order.
    pub fn build(docs: Vec<CatalogDocument>) -> Self {
        let mut postings: HashMap<String, Vec<u32>> = HashMap::new();
        let mut lowered = Vec::with_capacity(docs.len());

        for (pos, doc) in docs.iter().enumerate() {
            let lower = doc.text.to_lowercase();
            for gram in trigrams(&lower) {
                let list = postings.entry(gram).or_default();
                // Positions arrive in ascending order; skip repeats within a doc.
                if list.last() != Some(&(pos as u32)) {
                    list.push(pos as u32);
                }
            }
            lowered.push(lower);
        }

        Self {
            docs,
            lowered,
            postings,
        }
    }

    /// Number of indexed documents.
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// True when the index holds no documents.
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Number of distinct trigrams.
    pub fn gram_count(&self) -> usize {
        self.postings.len()
    }

    /// Ascending positions of documents that may contain every token.
    fn candidates(&self, query: &Query) -> Vec<u32> {
        let mut current: Option<Vec<u32>> = None;
        for token in query.tokens() {
            for gram in trigrams(token) {
                let Some(list) = self.postings.get(&gram) else {
                    return Vec::new();
                };
                current = Some(match current {
                    Some(acc) => intersect(&acc, list),
                    None => list.clone(),
                });
                if current.as_ref().is_some_and(Vec::is_empty) {
                    return Vec::new();
                }
            }
        }
        current.unwrap_or_else(|| (0..self.docs.len() as u32).collect())
    }

    /// Literal matches for `query`, identical to a full scan of the snapshot.
    pub fn search(&self, query: &Query) -> Vec<ResultItem> {
        let mut buckets = LiteralBuckets::default();
        if query.is_blank() {
            return buckets.into_items();
        }
        for pos in self.candidates(query) {
            let pos = pos as usize;
            if let Some(bucket) = classify(&self.lowered[pos], query) {
                buckets.push(&self.docs[pos], bucket);
            }
        }
        buckets.into_items()
    }
}

/// Literal matcher backed by an [`NgramIndex`] built once at startup.
///
/// The catalog is read-only during serving, so the snapshot stays valid for
/// the lifetime of the process.
pub struct NgramMatcher {
    index: NgramIndex,
}

impl NgramMatcher {
    /// Snapshots `catalog` and indexes it.
    pub async fn build(catalog: &dyn Catalog) -> GrocerResult<Self> {
        let docs = catalog.fetch_all().await?;
        let index = NgramIndex::build(docs);
        info!(
            documents = index.len(),
            grams = index.gram_count(),
            "Trigram literal index built"
        );
        Ok(Self { index })
    }

    /// Wraps an index built elsewhere.
    pub fn from_index(index: NgramIndex) -> Self {
        Self { index }
    }
}

#[async_trait]
impl LiteralMatcher for NgramMatcher {
    async fn find(&self, query: &Query) -> GrocerResult<Vec<ResultItem>> {
        Ok(self.index.search(query))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::literal::literal_matches;

    fn docs(names: &[&str]) -> Vec<CatalogDocument> {
        names
            .iter()
            .enumerate()
            .map(|(i, n)| CatalogDocument {
                id: i.to_string(),
                text: n.to_string(),
                metadata: HashMap::new(),
            })
            .collect()
    }

    const NAMES: &[&str] = &[
        "Almond Milk",
        "Milk",
        "Organic Milk 2%",
        "Buttermilk Pancake Mix",
        "Milk Chocolate Bar",
        "Oat Milk Barista Edition",
        "Sourdough Bread",
        "Crème Fraîche",
        "2% Reduced Fat Milk",
    ];

    #[test]
    fn test_trigrams() {
        assert_eq!(trigrams("milk"), ["mil", "ilk"]);
        assert!(trigrams("ab").is_empty());
        assert_eq!(trigrams("crème"), ["crè", "rèm", "ème"]);
    }

    #[test]
    fn test_intersect() {
        assert_eq!(intersect(&[1, 3, 5, 7], &[3, 4, 5, 8]), vec![3, 5]);
        assert!(intersect(&[1, 2], &[]).is_empty());
    }

    #[test]
    fn test_matches_full_scan() {
        let index = NgramIndex::build(docs(NAMES));
        let snapshot = docs(NAMES);
        for q in [
            "milk",
            "MILK",
            "ilk",
            "oat milk",
            "milk bar",
            "2%",
            "2% milk",
            "m",
            "crème",
            "bread milk",
            "chocolate milk",
            "zzz",
            "  ",
        ] {
            let query = Query::parse(q);
            assert_eq!(
                index.search(&query),
                literal_matches(&query, &snapshot),
                "mismatch for query {q:?}"
            );
        }
    }

    #[test]
    fn test_short_tokens_fall_back_to_all_docs() {
        let index = NgramIndex::build(docs(NAMES));
        assert_eq!(index.candidates(&Query::parse("2%")).len(), NAMES.len());
    }

    #[test]
    fn test_unknown_gram_short_circuits() {
        let index = NgramIndex::build(docs(NAMES));
        assert!(index.candidates(&Query::parse("xyz milk")).is_empty());
    }

    #[test]
    fn test_empty_index() {
        let index = NgramIndex::build(Vec::new());
        assert!(index.is_empty());
        assert!(index.search(&Query::parse("milk")).is_empty());
    }
}
