//! Error types for the LLM oracle.
//!
//! Every variant is mapped to an [`OracleError`] at the trait boundary, so
//! the simulation only ever sees "unreachable" or "malformed".
//!
//! [`OracleError`]: hearth_core::oracle::OracleError

use hearth_core::oracle::OracleError;

/// Errors that can occur while asking an LLM for a decision.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// Configuration is invalid or missing.
    #[error("config error: {0}")]
    Config(String),

    /// Failed to load or render a prompt template.
    #[error("template render error: {0}")]
    Template(String),

    /// An LLM backend returned an error or was unreachable.
    #[error("LLM backend error: {0}")]
    Backend(String),

    /// The LLM response could not be parsed into a decision.
    #[error("response parse error: {0}")]
    Parse(String),

    /// Serialization or deserialization failure.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl From<LlmError> for OracleError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Backend(message) => Self::Unreachable { message },
            other => Self::Malformed {
                message: other.to_string(),
            },
        }
    }
}
