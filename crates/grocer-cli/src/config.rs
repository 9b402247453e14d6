use grocer_catalog::IngestConfig;
use grocer_search::SearchConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// File name of the JSONL vector store inside `data_dir`.
pub const STORE_FILE: &str = "catalog.jsonl";

/// Top-level contents of `grocer.toml`.
#[derive(Debug, Deserialize)]
pub struct GrocerConfig {
    /// Directory holding the built vector store.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Source TSV catalog used when the store has to be built.
    #[serde(default = "default_catalog_file")]
    pub catalog_file: PathBuf,
    /// Tracing filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Search tuning.
    #[serde(default)]
    pub search: SearchConfig,
    /// Embedding backend used for both build and query.
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    /// Catalog build batching.
    #[serde(default)]
    pub ingest: IngestConfig,
}

impl Default for GrocerConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            catalog_file: default_catalog_file(),
            log_level: default_log_level(),
            server: ServerConfig::default(),
            search: SearchConfig::default(),
            embedding: EmbeddingConfig::default(),
            ingest: IngestConfig::default(),
        }
    }
}

impl GrocerConfig {
    /// Where the built vector store lives.
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join(STORE_FILE)
    }
}

/// `[server]` section.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Which embedding backend builds and queries the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Built-in hashed n-gram embedder; needs no network.
    #[default]
    Local,
    /// OpenAI-compatible `/embeddings` endpoint.
    Http,
}

/// `[embedding]` section.
#[derive(Debug, Deserialize)]
pub struct EmbeddingConfig {
    /// Which backend embeds rows and queries.
    #[serde(default)]
    pub provider: EmbeddingBackend,
    /// Vector length; must match the store being opened.
    #[serde(default = "default_dimension")]
    pub dimension: usize,
    /// Base URL of an OpenAI-compatible API; required for `provider = "http"`.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Model name sent to the HTTP backend.
    #[serde(default = "default_model")]
    pub model: String,
    /// Environment variable holding the API key, if the endpoint needs one.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingBackend::default(),
            dimension: default_dimension(),
            base_url: None,
            model: default_model(),
            api_key_env: default_api_key_env(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}
fn default_catalog_file() -> PathBuf {
    PathBuf::from("grocery_products_clean.tsv")
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8000
}
fn default_dimension() -> usize {
    256
}
fn default_model() -> String {
    "BAAI/bge-base-en-v1.5".to_string()
}
fn default_api_key_env() -> String {
    "GROCER_EMBEDDING_API_KEY".to_string()
}

/// Reads `path`, falling back to defaults when the file does not exist.
///
/// The boolean is `true` when defaults were used, so the caller can log it
/// once tracing is up.
pub async fn load(path: &Path) -> anyhow::Result<(GrocerConfig, bool)> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => {
            let config = toml::from_str(&text).map_err(|e| {
                anyhow::anyhow!("Failed to parse config file '{}': {e}", path.display())
            })?;
            Ok((config, false))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok((GrocerConfig::default(), true)),
        Err(e) => Err(anyhow::anyhow!(
            "Failed to read config file '{}': {e}",
            path.display()
        )),
    }
}
