//! Configuration types for docpipe core
//!
//! Core only accepts fully resolved, validated configuration.
//! All discovery, loading, and merging happens in the CLI layer.

pub mod endpoints;
pub mod types;

pub use endpoints::{load_endpoints, EndpointConfig, DEFAULT_ENDPOINT_NAME, DEFAULT_ENDPOINT_URL};
pub use types::{LlmConfig, ModelParams};
