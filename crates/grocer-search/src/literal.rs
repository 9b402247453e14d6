use async_trait::async_trait;
use grocer_catalog::Catalog;
use grocer_core::{Bucket, CatalogDocument, GrocerResult, Query, ResultItem};
use std::sync::Arc;

/// Produces the literal part of a result list: priority matches followed by
/// normal matches, each in catalog order.
///
/// Implementations differ only in how they find candidates; the output for a
/// given catalog and query must equal [`literal_matches`].
#[async_trait]
pub trait LiteralMatcher: Send + Sync {
    /// Literal matches for `query`, priority bucket first.
    async fn find(&self, query: &Query) -> GrocerResult<Vec<ResultItem>>;
}

/// Classifies an already-lowercased name against a query.
///
/// Returns `None` unless every token is a substring of the name. A blank
/// query matches nothing.
pub fn classify(lower_name: &str, query: &Query) -> Option<Bucket> {
    if query.is_blank() {
        return None;
    }
    if !query.tokens().iter().all(|t| lower_name.contains(t.as_str())) {
        return None;
    }
    if lower_name.starts_with(query.prefix()) {
        Some(Bucket::PriorityLiteral)
    } else {
        Some(Bucket::NormalLiteral)
    }
}

/// Accumulates matches into their buckets and flattens them in merge order.
#[derive(Debug, Default)]
pub(crate) struct LiteralBuckets {
    priority: Vec<ResultItem>,
    normal: Vec<ResultItem>,
}

impl LiteralBuckets {
    pub(crate) fn push(&mut self, doc: &CatalogDocument, bucket: Bucket) {
        let item =
            ResultItem::from_parts(Some(doc.id.clone()), doc.text.as_str(), &doc.metadata, bucket);
        match bucket {
            Bucket::PriorityLiteral => self.priority.push(item),
            _ => self.normal.push(item),
        }
    }

    pub(crate) fn into_items(mut self) -> Vec<ResultItem> {
        self.priority.append(&mut self.normal);
        self.priority
    }
}

/// Full-scan literal matching over a catalog snapshot.
pub fn literal_matches(query: &Query, docs: &[CatalogDocument]) -> Vec<ResultItem> {
    let mut buckets = LiteralBuckets::default();
    if query.is_blank() {
        return buckets.into_items();
    }
    for doc in docs {
        if let Some(bucket) = classify(&doc.text.to_lowercase(), query) {
            buckets.push(doc, bucket);
        }
    }
    buckets.into_items()
}

/// Fetches the whole catalog on every query and scans it linearly.
pub struct ScanMatcher {
    catalog: Arc<dyn Catalog>,
}

impl ScanMatcher {
    /// Creates a matcher reading from `catalog`.
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl LiteralMatcher for ScanMatcher {
    async fn find(&self, query: &Query) -> GrocerResult<Vec<ResultItem>> {
        let docs = self.catalog.fetch_all().await?;
        Ok(literal_matches(query, &docs))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use grocer_core::{UNKNOWN_BRAND, UNKNOWN_STORE};
    use serde_json::json;
    use std::collections::HashMap;

    fn doc(id: usize, text: &str) -> CatalogDocument {
        CatalogDocument {
            id: id.to_string(),
            text: text.to_string(),
            metadata: HashMap::new(),
        }
    }

    fn names(items: &[ResultItem]) -> Vec<&str> {
        items.iter().map(|i| i.name.as_str()).collect()
    }

    #[test]
    fn test_classify_requires_every_token() {
        let q = Query::parse("organic milk");
        assert_eq!(classify("organic milk 2%", &q), Some(Bucket::PriorityLiteral));
        assert_eq!(classify("milk, organic", &q), Some(Bucket::NormalLiteral));
        assert_eq!(classify("organic eggs", &q), None);
    }

    #[test]
    fn test_classify_is_substring_not_whole_word() {
        let q = Query::parse("ilk");
        assert_eq!(classify("buttermilk", &q), Some(Bucket::NormalLiteral));
    }

    #[test]
    fn test_classify_prefix_uses_whole_query() {
        // Both tokens appear, but the name does not start with "milk organic".
        let q = Query::parse("Milk Organic");
        assert_eq!(classify("milk, organic", &q), Some(Bucket::NormalLiteral));
        assert_eq!(classify("milk organic valley", &q), Some(Bucket::PriorityLiteral));
    }

    #[test]
    fn test_blank_query_matches_nothing() {
        let docs = vec![doc(0, "Milk"), doc(1, "Bread")];
        assert!(literal_matches(&Query::parse("   "), &docs).is_empty());
    }

    #[test]
    fn test_empty_catalog() {
        assert!(literal_matches(&Query::parse("milk"), &[]).is_empty());
    }

    #[test]
    fn test_priority_before_normal_each_in_catalog_order() {
        let docs = vec![
            doc(0, "Almond Milk"),
            doc(1, "Milk Chocolate"),
            doc(2, "Oat Milk"),
            doc(3, "Milk"),
            doc(4, "Bread"),
        ];
        let items = literal_matches(&Query::parse("milk"), &docs);
        assert_eq!(names(&items), ["Milk Chocolate", "Milk", "Almond Milk", "Oat Milk"]);
        assert_eq!(items[0].bucket, Bucket::PriorityLiteral);
        assert_eq!(items[2].bucket, Bucket::NormalLiteral);
    }

    #[test]
    fn test_case_insensitive_name_kept_verbatim() {
        let docs = vec![doc(0, "GREEK Yogurt ")];
        let items = literal_matches(&Query::parse("greek YOGURT"), &docs);
        assert_eq!(names(&items), ["GREEK Yogurt "]);
        assert_eq!(items[0].bucket, Bucket::PriorityLiteral);
    }

    #[test]
    fn test_missing_metadata_gets_defaults() {
        let items = literal_matches(&Query::parse("milk"), &[doc(0, "Milk")]);
        assert_eq!(items[0].price, 0.0);
        assert_eq!(items[0].store, UNKNOWN_STORE);
        assert_eq!(items[0].brand, UNKNOWN_BRAND);
        assert_eq!(items[0].id.as_deref(), Some("0"));
    }

    #[test]
    fn test_metadata_copied_from_entry() {
        let mut d = doc(0, "Organic Milk 2%");
        d.metadata = serde_json::from_value(json!({
            "price": 4.99, "store": "FreshMart", "brand": "Organic Valley"
        }))
        .unwrap();
        let items = literal_matches(&Query::parse("milk"), &[d]);
        assert_eq!(items[0].price, 4.99);
        assert_eq!(items[0].store, "FreshMart");
        assert_eq!(items[0].brand, "Organic Valley");
    }
}
