//! HTTP gateway for Grocer.
//!
//! Serves `GET /search?q=` and `GET /health` over axum with permissive CORS,
//! request tracing and a per-request correlation id.

pub mod middleware;
pub mod server;

pub use middleware::REQUEST_ID_HEADER;
pub use server::{shutdown_signal, GatewayServer};
