//! Error types for code generation.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our custom error.
pub type Result<T> = std::result::Result<T, CodegenError>;

/// Errors that can occur while generating a solution.
#[derive(Error, Debug)]
pub enum CodegenError {
    /// Error reading or writing files.
    #[error("I/O error for path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The prompt template path does not exist.
    #[error("Prompt template not found at '{0}'")]
    TemplateNotFound(PathBuf),

    /// The prompt template is malformed.
    #[error("Invalid prompt template: {0}")]
    Template(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP request error.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// LLM API error.
    #[error("LLM API error: {0}")]
    LlmApi(String),

    /// The gateway rejected the request with HTTP 429.
    #[error("Rate limited by LLM API: {0}")]
    RateLimited(String),

    /// LLM response parsing error.
    #[error("Failed to parse LLM response: {0}")]
    LlmParse(String),

    /// The model returned zero completion tokens, usually a content filter.
    #[error("Completion tokens is 0, content={0:?}")]
    NoContentGenerated(String),

    /// The response contains no fenced code block.
    #[error("No {language} code block found in model response")]
    NoCodeBlock { language: String },

    /// Harness input or output document error.
    #[error("Harness document error: {0}")]
    Harness(String),
}

impl CodegenError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether another attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited(_) | Self::NoContentGenerated(_))
    }
}

impl From<reqwest::Error> for CodegenError {
    fn from(err: reqwest::Error) -> Self {
        CodegenError::Http(err.to_string())
    }
}

impl From<serde_json::Error> for CodegenError {
    fn from(err: serde_json::Error) -> Self {
        CodegenError::LlmParse(err.to_string())
    }
}
