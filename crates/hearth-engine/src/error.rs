//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode of startup so `main` can
//! propagate with `?` and attach context.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: hearth_core::config::ConfigError,
    },

    /// The LLM oracle could not be configured.
    #[error("oracle error: {source}")]
    Oracle {
        /// The underlying oracle error.
        #[from]
        source: hearth_oracle::LlmError,
    },

    /// The log filter or subscriber could not be installed.
    #[error("logging error: {message}")]
    Logging {
        /// Description of the failure.
        message: String,
    },

    /// Simulation runner failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: hearth_core::runner::RunnerError,
    },
}
