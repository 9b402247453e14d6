//! Product catalog storage for Grocer.
//!
//! Provides the vector store that holds every product with its embedding,
//! the embedding providers used to build and query it, the [`Catalog`]
//! service that search consumes, and the one-shot TSV ingestion step.
//!
//! # Main types
//!
//! - [`VectorStore`]: Trait for storing and querying product embeddings.
//! - [`FileVectorStore`]: JSONL-backed persistent store.
//! - [`EmbeddingProvider`]: Trait for text embedding backends.
//! - [`LocalEmbedding`]: Deterministic hashed bag-of-words embedder.
//! - [`Catalog`] / [`EmbeddedCatalog`]: `fetch_all` + `semantic_query` service.
//! - [`CatalogBuilder`]: Builds a store from a TSV catalog file.

/// Catalog service trait and store-backed implementation.
pub mod catalog;
/// Embedding provider trait and local implementation.
pub mod embedding;
/// OpenAI-compatible HTTP embedding provider.
#[cfg(feature = "http-embeddings")]
pub mod http_embedding;
/// TSV catalog parsing and store building.
pub mod ingest;
/// Vector store trait and in-memory / file-backed implementations.
pub mod store;

pub use catalog::{Catalog, EmbeddedCatalog};
pub use embedding::{cosine_similarity, EmbeddingProvider, LocalEmbedding};
#[cfg(feature = "http-embeddings")]
pub use http_embedding::HttpEmbedding;
pub use ingest::{
    parse_catalog, BuildReport, CatalogBuilder, IngestConfig, ParsedCatalog, ProductRow,
};
pub use store::{CatalogEntry, FileVectorStore, InMemoryVectorStore, SearchResult, VectorStore};
