//! Hybrid product search for Grocer.
//!
//! A query is matched literally against every product name (all tokens must
//! appear as substrings, names starting with the whole query rank first) and,
//! when it has enough tokens, expanded with nearest neighbors from the
//! semantic index. The buckets are concatenated and truncated.
//!
//! # Main types
//!
//! - [`SearchEngine`]: Runs the literal, semantic and merge stages.
//! - [`LiteralMatcher`]: Trait for literal matching backends.
//! - [`ScanMatcher`]: Linear scan over a fresh catalog fetch.
//! - [`NgramMatcher`] / [`NgramIndex`]: Trigram index over a startup snapshot.
//! - [`SemanticExpander`]: Token-gated semantic retrieval.
//! - [`SearchConfig`]: Result limits, semantic gating, dedupe and matcher choice.

/// Search configuration.
pub mod config;
/// The search engine.
pub mod engine;
/// Literal matching predicate and scan matcher.
pub mod literal;
/// Result list merging.
pub mod merge;
/// Trigram literal index.
pub mod ngram;
/// Semantic expansion.
pub mod semantic;

pub use config::{MatcherKind, SearchConfig};
pub use engine::SearchEngine;
pub use literal::{classify, literal_matches, LiteralMatcher, ScanMatcher};
pub use merge::merge;
pub use ngram::{NgramIndex, NgramMatcher};
pub use semantic::{hits_to_items, SemanticExpander};
