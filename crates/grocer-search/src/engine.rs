use crate::config::{MatcherKind, SearchConfig};
use crate::literal::{LiteralMatcher, ScanMatcher};
use crate::merge::merge;
use crate::ngram::NgramMatcher;
use crate::semantic::SemanticExpander;
use grocer_catalog::Catalog;
use grocer_core::{GrocerResult, Query, ResultItem};
use std::sync::Arc;
use tracing::{debug, warn};

/// Hybrid search over a product catalog.
///
/// Each call runs literal matching, then (for long enough queries) semantic
/// expansion, then merges the two into one bounded list. The engine holds no
/// per-request state and can be shared across tasks behind an `Arc`.
pub struct SearchEngine {
    matcher: Arc<dyn LiteralMatcher>,
    expander: SemanticExpander,
    config: SearchConfig,
}

impl SearchEngine {
    /// Engine with a full-scan literal matcher.
    pub fn new(catalog: Arc<dyn Catalog>, config: SearchConfig) -> Self {
        let matcher = Arc::new(ScanMatcher::new(Arc::clone(&catalog)));
        Self::with_matcher(matcher, catalog, config)
    }

    /// Engine with a caller-supplied literal matcher.
    ///
    /// An out-of-range `max_results` is clamped into `1..=20`; use
    /// [`SearchEngine::from_config`] to reject it instead.
    pub fn with_matcher(
        matcher: Arc<dyn LiteralMatcher>,
        catalog: Arc<dyn Catalog>,
        mut config: SearchConfig,
    ) -> Self {
        let bounded = config.bounded_max_results();
        if bounded != config.max_results {
            warn!(
                requested = config.max_results,
                applied = bounded,
                "search.max_results out of range, clamping"
            );
            config.max_results = bounded;
        }
        let expander =
            SemanticExpander::new(catalog, config.min_semantic_tokens, config.semantic_top_k);
        Self {
            matcher,
            expander,
            config,
        }
    }

    /// Engine with the literal matcher named in `config.matcher`.
    ///
    /// The trigram matcher snapshots the catalog here, so the catalog must be
    /// fully built before this is called. Fails with [`GrocerError::Config`]
    /// when `config` does not validate.
    ///
    /// [`GrocerError::Config`]: grocer_core::GrocerError::Config
    pub async fn from_config(catalog: Arc<dyn Catalog>, config: SearchConfig) -> GrocerResult<Self> {
        config.validate()?;
        let matcher: Arc<dyn LiteralMatcher> = match config.matcher {
            MatcherKind::Scan => Arc::new(ScanMatcher::new(Arc::clone(&catalog))),
            MatcherKind::Ngram => Arc::new(NgramMatcher::build(catalog.as_ref()).await?),
        };
        Ok(Self::with_matcher(matcher, catalog, config))
    }

    /// Active configuration.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Searches for `raw`, returning at most `max_results` items.
    pub async fn search(&self, raw: &str) -> GrocerResult<Vec<ResultItem>> {
        self.search_query(&Query::parse(raw)).await
    }

    /// Searches for an already-parsed query.
    ///
    /// A blank query yields no results without touching the catalog. A
    /// failure in either the catalog fetch or the semantic query fails the
    /// whole search.
    pub async fn search_query(&self, query: &Query) -> GrocerResult<Vec<ResultItem>> {
        if query.is_blank() {
            return Ok(Vec::new());
        }

        let literal = self.matcher.find(query).await?;
        let semantic = self.expander.expand(query).await?;
        debug!(
            tokens = query.token_count(),
            literal = literal.len(),
            semantic = semantic.len(),
            "Search buckets collected"
        );

        Ok(merge(
            literal,
            semantic,
            self.config.max_results,
            self.config.dedupe,
        ))
    }
}
