//! One-shot catalog build: TSV file → normalized rows → embedded entries.
//!
//! The build runs once per store. [`CatalogBuilder::build_if_needed`] skips
//! the work entirely when the store file already exists, and writes new
//! stores to a `.partial` sibling that is only renamed into place after every
//! row has been loaded.

use crate::embedding::EmbeddingProvider;
use crate::store::{CatalogEntry, FileVectorStore, VectorStore};
use chrono::Utc;
use grocer_core::{
    parse_price, GrocerError, GrocerResult, ProductMetadata, UNKNOWN_BRAND, UNKNOWN_STORE,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Header of the product name column.
pub const NAME_COLUMN: &str = "Product Name";
/// Header of the price column.
pub const PRICE_COLUMN: &str = "Price";
/// Header of the store column.
pub const STORE_COLUMN: &str = "Store";
/// Header of the brand column.
pub const BRAND_COLUMN: &str = "Brand";

/// Cell values treated as "no value" in the store and brand columns.
const NULL_MARKERS: &[&str] = &[
    "", "nan", "NaN", "-nan", "-NaN", "NA", "N/A", "n/a", "<NA>", "#N/A", "NULL", "null", "None",
];

/// Tuning for the build step.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    /// Rows embedded and inserted per batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Log progress every this many rows.
    #[serde(default = "default_progress_every")]
    pub progress_every: usize,
}

fn default_batch_size() -> usize {
    200
}
fn default_progress_every() -> usize {
    500
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            progress_every: default_progress_every(),
        }
    }
}

/// A normalized catalog row, ready to embed.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRow {
    /// Zero-based data row index; becomes the entry id.
    pub row_index: usize,
    /// Trimmed product name.
    pub name: String,
    /// Normalized metadata with defaults applied.
    pub metadata: ProductMetadata,
}

/// Parsed catalog file.
#[derive(Debug, Clone, Default)]
pub struct ParsedCatalog {
    /// Rows with a usable product name.
    pub rows: Vec<ProductRow>,
    /// Data rows that were dropped because their name was blank.
    pub skipped: usize,
    /// Total data rows seen (kept + skipped).
    pub total: usize,
}

/// Outcome of a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    /// Data rows read from the source file.
    pub rows_read: usize,
    /// Entries written to the store.
    pub entries_indexed: usize,
    /// Rows dropped for having no product name.
    pub rows_skipped: usize,
}

/// Parses a tab-separated catalog with a header row.
///
/// Columns are located by header name, so their order is free and extra
/// columns are ignored. Blank lines are skipped and do not consume a row
/// index; rows with a blank name do.
pub fn parse_catalog(text: &str) -> GrocerResult<ParsedCatalog> {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());

    let header = lines
        .next()
        .ok_or_else(|| GrocerError::Ingest("Catalog file is empty".to_string()))?;
    let header: Vec<String> = split_row(header.trim_start_matches('\u{feff}'))
        .into_iter()
        .map(|h| h.trim().to_string())
        .collect();

    let column = |name: &str| {
        header
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| GrocerError::Ingest(format!("Missing required column '{name}'")))
    };
    let name_col = column(NAME_COLUMN)?;
    let price_col = column(PRICE_COLUMN)?;
    let store_col = column(STORE_COLUMN)?;
    let brand_col = column(BRAND_COLUMN)?;

    let mut parsed = ParsedCatalog::default();
    for (row_index, line) in lines.enumerate() {
        parsed.total += 1;
        let cells = split_row(line);
        let cell = |i: usize| cells.get(i).map(|c| c.trim()).unwrap_or("");

        let name = cell(name_col);
        if is_null(name) {
            parsed.skipped += 1;
            continue;
        }

        parsed.rows.push(ProductRow {
            row_index,
            name: name.to_string(),
            metadata: ProductMetadata::new(
                parse_price(cell(price_col)),
                display_or(cell(store_col), UNKNOWN_STORE),
                display_or(cell(brand_col), UNKNOWN_BRAND),
            ),
        });
    }

    Ok(parsed)
}

/// Splits one TSV line into cells.
///
/// A cell that opens with `"` runs to its closing quote, so it may contain
/// tabs; `""` inside it is a literal quote. Quotes elsewhere are kept as is.
fn split_row(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut chars = line.chars().peekable();
    let mut in_quotes = false;
    let mut at_cell_start = true;

    while let Some(c) = chars.next() {
        if in_quotes {
            if c != '"' {
                cell.push(c);
            } else if chars.peek() == Some(&'"') {
                chars.next();
                cell.push('"');
            } else {
                in_quotes = false;
            }
            continue;
        }
        match c {
            '\t' => {
                cells.push(std::mem::take(&mut cell));
                at_cell_start = true;
                continue;
            }
            '"' if at_cell_start => in_quotes = true,
            _ => cell.push(c),
        }
        at_cell_start = false;
    }
    cells.push(cell);
    cells
}

fn is_null(cell: &str) -> bool {
    NULL_MARKERS.contains(&cell)
}

fn display_or(cell: &str, fallback: &str) -> String {
    if is_null(cell) {
        fallback.to_string()
    } else {
        cell.to_string()
    }
}

/// Embeds normalized rows and loads them into a vector store.
pub struct CatalogBuilder {
    embedder: Arc<dyn EmbeddingProvider>,
    config: IngestConfig,
}

impl CatalogBuilder {
    /// Creates a builder using `embedder` for every row.
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, config: IngestConfig) -> Self {
        Self { embedder, config }
    }

    /// Embeds `catalog.rows` and inserts them into `store` in batches.
    pub async fn load_into(
        &self,
        catalog: &ParsedCatalog,
        store: &dyn VectorStore,
    ) -> GrocerResult<BuildReport> {
        let batch_size = self.config.batch_size.max(1);
        let progress_every = self.config.progress_every.max(1);
        let total = catalog.total.max(1);
        let mut indexed = 0;

        for batch in catalog.rows.chunks(batch_size) {
            let names: Vec<&str> = batch.iter().map(|r| r.name.as_str()).collect();
            let embeddings = self.embedder.embed_batch(&names).await?;
            if embeddings.len() != batch.len() {
                return Err(GrocerError::Ingest(format!(
                    "Embedder returned {} vectors for {} rows",
                    embeddings.len(),
                    batch.len()
                )));
            }

            let now = Utc::now();
            let entries: Vec<CatalogEntry> = batch
                .iter()
                .zip(embeddings)
                .map(|(row, embedding)| CatalogEntry {
                    id: row.row_index.to_string(),
                    name: row.name.clone(),
                    embedding,
                    metadata: row.metadata.to_map(),
                    indexed_at: now,
                })
                .collect();
            store.insert_batch(entries).await?;

            let before = indexed;
            indexed += batch.len();
            let last_row = batch.last().map(|r| r.row_index).unwrap_or(0);
            if before / progress_every != indexed / progress_every || indexed == catalog.rows.len()
            {
                info!(
                    indexed,
                    progress = %format!("{:.2}%", (last_row + 1) as f64 / total as f64 * 100.0),
                    "Catalog build progress"
                );
            }
        }

        Ok(BuildReport {
            rows_read: catalog.total,
            entries_indexed: indexed,
            rows_skipped: catalog.skipped,
        })
    }

    /// Builds a fresh JSONL store at `store_path` from the TSV at `input`,
    /// replacing any existing store.
    pub async fn build_file(&self, input: &Path, store_path: &Path) -> GrocerResult<BuildReport> {
        let text = tokio::fs::read_to_string(input).await.map_err(|e| {
            GrocerError::Ingest(format!("Failed to read catalog {}: {e}", input.display()))
        })?;
        let catalog = parse_catalog(&text)?;
        info!(
            input = %input.display(),
            rows = catalog.total,
            skipped = catalog.skipped,
            "Building catalog vector store"
        );

        let partial = partial_path(store_path);
        if partial.exists() {
            tokio::fs::remove_file(&partial).await?;
        }

        let report = {
            let store = FileVectorStore::open(partial.clone()).await?;
            self.load_into(&catalog, &store).await?
        };
        // A catalog with no usable rows never touches the file.
        if !partial.exists() {
            tokio::fs::write(&partial, b"").await?;
        }

        tokio::fs::rename(&partial, store_path).await.map_err(|e| {
            GrocerError::Ingest(format!(
                "Failed to move {} into place: {e}",
                partial.display()
            ))
        })?;
        info!(
            entries = report.entries_indexed,
            store = %store_path.display(),
            "Catalog vector store built"
        );
        Ok(report)
    }

    /// Runs [`CatalogBuilder::build_file`] unless `store_path` already exists.
    pub async fn build_if_needed(
        &self,
        input: &Path,
        store_path: &Path,
    ) -> GrocerResult<Option<BuildReport>> {
        if store_path.exists() {
            info!(store = %store_path.display(), "Catalog vector store already exists");
            return Ok(None);
        }
        self.build_file(input, store_path).await.map(Some)
    }
}

fn partial_path(store_path: &Path) -> PathBuf {
    let mut name = store_path.as_os_str().to_owned();
    name.push(".partial");
    PathBuf::from(name)
}
