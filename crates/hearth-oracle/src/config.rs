//! Configuration types for the LLM oracle.
//!
//! All configuration is loaded from environment variables: which backend
//! to talk to, where it lives, which model to ask, and where the prompt
//! templates are.

use crate::error::LlmError;

/// Default Ollama endpoint.
pub const OLLAMA_DEFAULT_URL: &str = "http://localhost:11434";

/// Default Ollama model.
pub const OLLAMA_DEFAULT_MODEL: &str = "gemma3:4b";

/// Complete LLM oracle configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Backend to call.
    pub backend: LlmBackendConfig,
    /// Path to the templates directory.
    pub templates_dir: String,
}

/// Configuration for a single LLM backend.
#[derive(Debug, Clone)]
pub struct LlmBackendConfig {
    /// The backend type.
    pub backend_type: BackendType,
    /// Base API URL (e.g. `https://api.openai.com/v1`).
    pub api_url: String,
    /// API key. Empty for local backends.
    pub api_key: String,
    /// Model identifier.
    pub model: String,
}

/// Supported LLM backend types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    /// `OpenAI`-compatible chat completions API (`OpenAI`, `DeepSeek`, vLLM).
    OpenAi,
    /// Anthropic Messages API.
    Anthropic,
    /// Ollama's native generate API.
    Ollama,
}

impl BackendType {
    fn parse(name: &str) -> Result<Self, LlmError> {
        match name.trim().to_lowercase().as_str() {
            "openai" | "deepseek" | "vllm" => Ok(Self::OpenAi),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            "ollama" => Ok(Self::Ollama),
            other => Err(LlmError::Config(format!("unknown backend type: {other}"))),
        }
    }
}

impl LlmConfig {
    /// Load configuration from environment variables.
    ///
    /// Required variables:
    /// - `HEARTH_LLM_BACKEND` -- `openai`, `anthropic` or `ollama`
    /// - `HEARTH_LLM_API_URL` -- API base URL (optional for Ollama)
    /// - `HEARTH_LLM_API_KEY` -- API key (optional for Ollama)
    /// - `HEARTH_LLM_MODEL` -- model name (optional for Ollama)
    ///
    /// Optional variables:
    /// - `HEARTH_TEMPLATES_DIR` -- path to prompt templates (default `templates`)
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Config`] if a required variable is missing or the
    /// backend type is unknown.
    pub fn from_env() -> Result<Self, LlmError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value.
    ///
    /// # Errors
    ///
    /// Same as [`LlmConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, LlmError> {
        let required = |name: &str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| LlmError::Config(format!("missing required env var {name}")))
        };

        let backend_type = BackendType::parse(&required("HEARTH_LLM_BACKEND")?)?;
        let backend = if backend_type == BackendType::Ollama {
            LlmBackendConfig {
                backend_type,
                api_url: lookup("HEARTH_LLM_API_URL")
                    .unwrap_or_else(|| OLLAMA_DEFAULT_URL.to_owned()),
                api_key: lookup("HEARTH_LLM_API_KEY").unwrap_or_default(),
                model: lookup("HEARTH_LLM_MODEL")
                    .unwrap_or_else(|| OLLAMA_DEFAULT_MODEL.to_owned()),
            }
        } else {
            LlmBackendConfig {
                backend_type,
                api_url: required("HEARTH_LLM_API_URL")?,
                api_key: required("HEARTH_LLM_API_KEY")?,
                model: required("HEARTH_LLM_MODEL")?,
            }
        };

        let templates_dir =
            lookup("HEARTH_TEMPLATES_DIR").unwrap_or_else(|| "templates".to_owned());

        Ok(Self {
            backend: LlmBackendConfig {
                api_url: backend.api_url.trim_end_matches('/').to_owned(),
                ..backend
            },
            templates_dir,
        })
    }
}
