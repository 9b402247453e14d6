mod config;

use clap::{Parser, Subcommand};
use config::{EmbeddingBackend, GrocerConfig};
use grocer_catalog::{
    Catalog, CatalogBuilder, EmbeddedCatalog, EmbeddingProvider, FileVectorStore, HttpEmbedding,
    LocalEmbedding,
};
use grocer_gateway::{shutdown_signal, GatewayServer};
use grocer_search::SearchEngine;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "grocer", about = "Grocer: hybrid grocery product search")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "grocer.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the catalog if needed, then start the HTTP server
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Build the vector store from the TSV catalog
    Build {
        /// Catalog TSV file (overrides config)
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Rebuild even if the store already exists
        #[arg(long)]
        force: bool,
    },
    /// Run one query and print the results as JSON
    Search {
        /// Query text
        query: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is normal.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let (config, defaulted) = config::load(&cli.config).await?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .json()
        .init();

    if defaulted {
        info!(path = %cli.config.display(), "Config file not found, using defaults");
    }

    let embedder = build_embedder(&config)?;
    let builder = CatalogBuilder::new(Arc::clone(&embedder), config.ingest.clone());
    let store_path = config.store_path();

    match cli.command {
        Commands::Serve { host, port } => {
            builder
                .build_if_needed(&config.catalog_file, &store_path)
                .await?;
            let catalog = open_catalog(&store_path, embedder).await?;
            let entries = catalog.count().await?;
            let engine = Arc::new(
                SearchEngine::from_config(Arc::clone(&catalog), config.search.clone()).await?,
            );

            let host = host.unwrap_or(config.server.host);
            let port = port.unwrap_or(config.server.port);
            let app = GatewayServer::build(engine, catalog);

            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            info!(
                addr = %addr,
                entries,
                matcher = ?config.search.matcher,
                "Grocer gateway listening"
            );
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
        Commands::Build { input, force } => {
            let input = input.unwrap_or(config.catalog_file);
            let report = if force {
                Some(builder.build_file(&input, &store_path).await?)
            } else {
                builder.build_if_needed(&input, &store_path).await?
            };
            match report {
                Some(report) => println!(
                    "Indexed {} of {} rows ({} skipped) into {}",
                    report.entries_indexed,
                    report.rows_read,
                    report.rows_skipped,
                    store_path.display()
                ),
                None => println!(
                    "Store {} already exists; pass --force to rebuild",
                    store_path.display()
                ),
            }
        }
        Commands::Search { query } => {
            builder
                .build_if_needed(&config.catalog_file, &store_path)
                .await?;
            let catalog = open_catalog(&store_path, embedder).await?;
            let engine = SearchEngine::from_config(catalog, config.search.clone()).await?;
            let results = engine.search(&query).await?;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
    }

    Ok(())
}

fn build_embedder(config: &GrocerConfig) -> anyhow::Result<Arc<dyn EmbeddingProvider>> {
    let embedding = &config.embedding;
    match embedding.provider {
        EmbeddingBackend::Local => Ok(Arc::new(LocalEmbedding::new(embedding.dimension))),
        EmbeddingBackend::Http => {
            let base_url = embedding.base_url.clone().ok_or_else(|| {
                anyhow::anyhow!("[embedding] base_url is required when provider = \"http\"")
            })?;
            let mut provider =
                HttpEmbedding::new(base_url, embedding.model.clone(), embedding.dimension);
            match std::env::var(&embedding.api_key_env) {
                Ok(key) if !key.is_empty() => provider = provider.with_api_key(key),
                _ => warn!(
                    var = %embedding.api_key_env,
                    "No embedding API key in environment, sending unauthenticated requests"
                ),
            }
            info!(model = %embedding.model, "Using HTTP embedding provider");
            Ok(Arc::new(provider))
        }
    }
}

async fn open_catalog(
    store_path: &Path,
    embedder: Arc<dyn EmbeddingProvider>,
) -> anyhow::Result<Arc<dyn Catalog>> {
    let store = Arc::new(FileVectorStore::open(store_path.to_path_buf()).await?);
    Ok(Arc::new(EmbeddedCatalog::open(store, embedder).await?))
}
