use grocer_core::{GrocerError, GrocerResult};
use serde::Deserialize;

/// Upper bound on `max_results`; a response never carries more items.
pub const MAX_RESULTS_LIMIT: usize = 20;

/// Which literal matcher backs the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatcherKind {
    /// Fetch and scan the whole catalog per query.
    #[default]
    Scan,
    /// Trigram index built once at startup.
    Ngram,
}

/// Search tuning, read from the `[search]` section of `grocer.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Maximum number of results returned per query, in `1..=20`.
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// Number of nearest neighbors requested from the semantic index.
    #[serde(default = "default_semantic_top_k")]
    pub semantic_top_k: usize,
    /// Minimum token count for a query to trigger semantic retrieval.
    #[serde(default = "default_min_semantic_tokens")]
    pub min_semantic_tokens: usize,
    /// Drop repeated catalog entries, keeping the earliest bucket.
    #[serde(default)]
    pub dedupe: bool,
    /// Literal matcher implementation.
    #[serde(default)]
    pub matcher: MatcherKind,
}

fn default_max_results() -> usize {
    20
}
fn default_semantic_top_k() -> usize {
    20
}
fn default_min_semantic_tokens() -> usize {
    3
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            semantic_top_k: default_semantic_top_k(),
            min_semantic_tokens: default_min_semantic_tokens(),
            dedupe: false,
            matcher: MatcherKind::default(),
        }
    }
}

impl SearchConfig {
    /// Rejects settings the engine cannot honor.
    pub fn validate(&self) -> GrocerResult<()> {
        if !(1..=MAX_RESULTS_LIMIT).contains(&self.max_results) {
            return Err(GrocerError::Config(format!(
                "search.max_results must be between 1 and {MAX_RESULTS_LIMIT}, got {}",
                self.max_results
            )));
        }
        Ok(())
    }

    /// `max_results` forced into `1..=MAX_RESULTS_LIMIT`.
    pub fn bounded_max_results(&self) -> usize {
        self.max_results.clamp(1, MAX_RESULTS_LIMIT)
    }
}
