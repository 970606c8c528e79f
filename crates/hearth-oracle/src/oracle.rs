//! [`GoalOracle`] implementation backed by an LLM.

use std::future::Future;

use hearth_core::oracle::{GoalOracle, OracleError};
use hearth_types::{StrategicRequest, StrategicResponse, TacticalRequest, TacticalResponse};
use tracing::{debug, warn};

use crate::config::LlmConfig;
use crate::error::LlmError;
use crate::llm::{LlmBackend, create_backend};
use crate::parse::{parse_strategic, parse_tactical};
use crate::prompt::PromptEngine;

/// Asks a language model for goals and plans.
///
/// Both contracts render a prompt from the agent's snapshot, send it to the
/// configured backend and parse the JSON out of the reply. Failures surface
/// as [`OracleError`]; the runner turns them into the fallback goal.
pub struct LlmOracle {
    backend: LlmBackend,
    prompts: PromptEngine,
}

impl LlmOracle {
    /// Build the backend client and load the prompt templates.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Template`] if the templates cannot be loaded.
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let prompts = PromptEngine::new(&config.templates_dir)?;
        let backend = create_backend(&config.backend);
        debug!(
            backend = backend.name(),
            model = %config.backend.model,
            templates_dir = %config.templates_dir,
            "LLM oracle ready"
        );
        Ok(Self { backend, prompts })
    }

    /// Name of the backend in use.
    pub const fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    async fn ask_strategic(&self, request: &StrategicRequest) -> Result<StrategicResponse, LlmError> {
        let prompt = self.prompts.render_strategic(&request.snapshot)?;
        let raw = self.backend.complete(&prompt).await?;
        debug!(agent = %request.agent_id, raw_response = %raw, "Strategic answer received");
        parse_strategic(&raw)
    }

    async fn ask_tactical(&self, request: &TacticalRequest) -> Result<TacticalResponse, LlmError> {
        let prompt = self
            .prompts
            .render_tactical(&request.snapshot, &request.goal)?;
        let raw = self.backend.complete(&prompt).await?;
        debug!(
            agent = %request.agent_id,
            goal = %request.goal.name,
            raw_response = %raw,
            "Tactical answer received"
        );
        parse_tactical(&raw)
    }
}

impl GoalOracle for LlmOracle {
    fn strategic(
        &self,
        request: StrategicRequest,
    ) -> impl Future<Output = Result<StrategicResponse, OracleError>> + Send {
        async move {
            self.ask_strategic(&request).await.map_err(|err| {
                warn!(
                    agent = %request.agent_id,
                    backend = self.backend.name(),
                    error = %err,
                    "Strategic LLM call failed"
                );
                OracleError::from(err)
            })
        }
    }

    fn tactical(
        &self,
        request: TacticalRequest,
    ) -> impl Future<Output = Result<TacticalResponse, OracleError>> + Send {
        async move {
            self.ask_tactical(&request).await.map_err(|err| {
                warn!(
                    agent = %request.agent_id,
                    goal = %request.goal.name,
                    backend = self.backend.name(),
                    error = %err,
                    "Tactical LLM call failed"
                );
                OracleError::from(err)
            })
        }
    }
}
