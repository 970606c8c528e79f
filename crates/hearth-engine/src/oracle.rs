//! Runtime oracle selection.
//!
//! [`GoalOracle`] is not object safe, so the configured backend is wrapped
//! in an enum that forwards both contracts.

use std::future::Future;

use hearth_core::config::OracleBackend;
use hearth_core::oracle::{GoalOracle, OracleError, RuleOracle};
use hearth_oracle::{LlmConfig, LlmOracle};
use hearth_types::{StrategicRequest, StrategicResponse, TacticalRequest, TacticalResponse};
use tracing::info;

use crate::error::EngineError;

/// The oracle the simulation talks to.
pub enum EngineOracle {
    /// Deterministic in-process rules.
    Rules(RuleOracle),
    /// A language model over HTTP.
    Llm(Box<LlmOracle>),
}

impl EngineOracle {
    /// Build the oracle named by `backend`. LLM settings come from the
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Oracle`] if the LLM backend is selected and its
    /// environment or templates are incomplete.
    pub fn from_config(backend: OracleBackend) -> Result<Self, EngineError> {
        match backend {
            OracleBackend::Rules => {
                info!("Using rule-based goal oracle");
                Ok(Self::Rules(RuleOracle::new()))
            }
            OracleBackend::Llm => {
                let config = LlmConfig::from_env()?;
                let oracle = LlmOracle::new(&config)?;
                info!(
                    backend = oracle.backend_name(),
                    model = %config.backend.model,
                    templates_dir = %config.templates_dir,
                    "Using LLM goal oracle"
                );
                Ok(Self::Llm(Box::new(oracle)))
            }
        }
    }
}

impl GoalOracle for EngineOracle {
    fn strategic(
        &self,
        request: StrategicRequest,
    ) -> impl Future<Output = Result<StrategicResponse, OracleError>> + Send {
        async move {
            match self {
                Self::Rules(rules) => rules.strategic(request).await,
                Self::Llm(llm) => llm.strategic(request).await,
            }
        }
    }

    fn tactical(
        &self,
        request: TacticalRequest,
    ) -> impl Future<Output = Result<TacticalResponse, OracleError>> + Send {
        async move {
            match self {
                Self::Rules(rules) => rules.tactical(request).await,
                Self::Llm(llm) => llm.tactical(request).await,
            }
        }
    }
}
