//! Error types and handling for docpipe core

use thiserror::Error;

/// Result type alias for docpipe operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for docpipe core
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Text-generation service errors
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Tool registry and invocation errors
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    /// Plan compilation errors
    #[error("Plan error: {0}")]
    Plan(#[from] PlanError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Generic error with message
    #[error("{0}")]
    Generic(String),
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for field '{field}': {value}")]
    InvalidValue { field: String, value: String },
}

/// Text-generation service errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Missing credential: {message}")]
    MissingCredential { message: String },

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Empty response from model")]
    EmptyResponse,
}

/// Tool registry and invocation errors
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Tool not found: {name}")]
    NotFound { name: String },

    #[error("Duplicate local tool: {name}")]
    DuplicateLocal { name: String },

    #[error("Endpoint '{endpoint}' failed: {message}")]
    Endpoint { endpoint: String, message: String },

    #[error("Tool execution failed: {name} - {message}")]
    ExecutionFailed { name: String, message: String },

    #[error("Invalid tool parameters: {message}")]
    InvalidParameters { message: String },
}

/// Plan compilation errors
#[derive(Error, Debug)]
pub enum PlanError {
    #[error("Failed to parse structured plan: {message}")]
    Parse { message: String },

    #[error("Structured plan contains no steps")]
    EmptyPlan,
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Generic(msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Generic(msg.to_string())
    }
}
