//! LLM-backed [`GoalOracle`] for the Hearth simulation.
//!
//! # Architecture
//!
//! ```text
//! WorldSnapshot --> Prompt Engine --> LLM Backend --> Parser --> StrategicResponse
//!                                                              \-> TacticalResponse
//! ```
//!
//! - [`config`] -- backend selection from environment variables
//! - [`prompt`] -- `minijinja` templates loaded from disk
//! - [`llm`] -- `OpenAI`-compatible, Anthropic and Ollama HTTP backends
//! - [`parse`] -- tolerant JSON extraction from model output
//! - [`oracle`] -- the [`LlmOracle`] tying them together
//!
//! [`GoalOracle`]: hearth_core::oracle::GoalOracle

pub mod config;
pub mod error;
pub mod llm;
pub mod oracle;
pub mod parse;
pub mod prompt;

pub use config::LlmConfig;
pub use error::LlmError;
pub use oracle::LlmOracle;
