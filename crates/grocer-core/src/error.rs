use thiserror::Error;

/// A convenience `Result` alias using [`GrocerError`].
pub type GrocerResult<T> = Result<T, GrocerError>;

/// Top-level error type for the Grocer workspace.
///
/// Each variant corresponds to a subsystem that can produce errors.
#[derive(Error, Debug)]
pub enum GrocerError {
    /// The catalog or vector store could not be read or queried.
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// The embedding provider failed to produce a vector.
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// The catalog build step failed (unreadable file, missing column, ...).
    #[error("Ingest error: {0}")]
    Ingest(String),

    /// An error in configuration parsing or validation.
    #[error("Config error: {0}")]
    Config(String),

    /// A query that the boundary layer must reject (empty, whitespace only).
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// An error from the HTTP front end.
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// An error from an outbound HTTP request (e.g. a remote embedding API).
    #[error("HTTP error: {0}")]
    Http(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GrocerError {
    /// Returns true if the error was caused by the caller's input rather than
    /// by an unavailable upstream service.
    pub fn is_client_error(&self) -> bool {
        matches!(self, GrocerError::InvalidQuery(_))
    }
}
