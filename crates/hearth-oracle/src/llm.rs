//! LLM backend abstraction and implementations.
//!
//! Enum dispatch over the supported HTTP APIs, since async methods are not
//! dyn-compatible. The oracle does not care which model answers: it sends a
//! prompt and expects text containing JSON.

use crate::config::{BackendType, LlmBackendConfig};
use crate::error::LlmError;
use crate::prompt::RenderedPrompt;

/// Output token ceiling for every backend.
const MAX_TOKENS: u32 = 1024;

/// Sampling temperature for hosted backends.
const TEMPERATURE: f64 = 0.7;

// ---------------------------------------------------------------------------
// Unified backend enum
// ---------------------------------------------------------------------------

/// An LLM backend that can process a prompt and return a response.
pub enum LlmBackend {
    /// `OpenAI`-compatible chat completions API.
    OpenAi(HttpBackend),
    /// Anthropic Messages API.
    Anthropic(HttpBackend),
    /// Ollama generate API.
    Ollama(HttpBackend),
}

impl LlmBackend {
    /// Send a prompt to the LLM and return the response text.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Backend`] if the HTTP call fails or the response
    /// has no text where the API puts it.
    pub async fn complete(&self, prompt: &RenderedPrompt) -> Result<String, LlmError> {
        match self {
            Self::OpenAi(http) => {
                let body = serde_json::json!({
                    "model": http.model,
                    "messages": [
                        {"role": "system", "content": prompt.system},
                        {"role": "user", "content": prompt.user}
                    ],
                    "temperature": TEMPERATURE,
                    "max_tokens": MAX_TOKENS,
                });
                let request = http
                    .client
                    .post(format!("{}/chat/completions", http.api_url))
                    .bearer_auth(&http.api_key)
                    .json(&body);
                let json = send(self.name(), request).await?;
                extract_openai_content(&json)
            }
            Self::Anthropic(http) => {
                let body = serde_json::json!({
                    "model": http.model,
                    "max_tokens": MAX_TOKENS,
                    "system": prompt.system,
                    "messages": [
                        {"role": "user", "content": prompt.user}
                    ]
                });
                let request = http
                    .client
                    .post(format!("{}/messages", http.api_url))
                    .header("x-api-key", &http.api_key)
                    .header("anthropic-version", "2023-06-01")
                    .json(&body);
                let json = send(self.name(), request).await?;
                extract_anthropic_content(&json)
            }
            Self::Ollama(http) => {
                let body = serde_json::json!({
                    "model": http.model,
                    "prompt": format!("{}\n\n{}", prompt.system, prompt.user),
                    "stream": false,
                });
                let request = http
                    .client
                    .post(format!("{}/api/generate", http.api_url))
                    .json(&body);
                let json = send(self.name(), request).await?;
                extract_ollama_content(&json)
            }
        }
    }

    /// Human-readable name for logging.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::OpenAi(_) => "openai-compatible",
            Self::Anthropic(_) => "anthropic",
            Self::Ollama(_) => "ollama",
        }
    }
}

/// Connection details shared by every backend.
pub struct HttpBackend {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl HttpBackend {
    fn new(config: &LlmBackendConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }
}

/// Send a request and return the JSON body of a successful response.
async fn send(
    backend: &str,
    request: reqwest::RequestBuilder,
) -> Result<serde_json::Value, LlmError> {
    let response = request
        .send()
        .await
        .map_err(|e| LlmError::Backend(format!("{backend} request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| "unable to read error body".to_owned());
        return Err(LlmError::Backend(format!(
            "{backend} returned {status}: {error_body}"
        )));
    }

    response
        .json()
        .await
        .map_err(|e| LlmError::Backend(format!("{backend} response parse failed: {e}")))
}

/// Extract the text content from an `OpenAI` chat completions response.
fn extract_openai_content(json: &serde_json::Value) -> Result<String, LlmError> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            LlmError::Backend("OpenAI response missing choices[0].message.content".to_owned())
        })
}

/// Extract the text content from an Anthropic Messages API response.
fn extract_anthropic_content(json: &serde_json::Value) -> Result<String, LlmError> {
    json.get("content")
        .and_then(|c| c.get(0))
        .and_then(|b| b.get("text"))
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| LlmError::Backend("Anthropic response missing content[0].text".to_owned()))
}

/// Extract the text from an Ollama generate response.
fn extract_ollama_content(json: &serde_json::Value) -> Result<String, LlmError> {
    json.get("response")
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| LlmError::Backend("Ollama response missing response field".to_owned()))
}

/// Create an LLM backend from configuration.
pub fn create_backend(config: &LlmBackendConfig) -> LlmBackend {
    let http = HttpBackend::new(config);
    match config.backend_type {
        BackendType::OpenAi => LlmBackend::OpenAi(http),
        BackendType::Anthropic => LlmBackend::Anthropic(http),
        BackendType::Ollama => LlmBackend::Ollama(http),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_openai_content_valid() {
        let json = serde_json::json!({
            "choices": [{
                "message": {
                    "content": "{\"goal\": \"GATHER_WOOD\", \"priority\": \"HIGH\"}"
                }
            }]
        });
        let result = extract_openai_content(&json);
        assert!(result.is_ok());
        assert!(result.unwrap_or_default().contains("GATHER_WOOD"));
    }

    #[test]
    fn extract_openai_content_missing_choices() {
        let json = serde_json::json!({"error": "rate_limit"});
        assert!(extract_openai_content(&json).is_err());
    }

    #[test]
    fn extract_anthropic_content_valid() {
        let json = serde_json::json!({
            "content": [{
                "type": "text",
                "text": "{\"goal\": \"BUILD_CAMPFIRE\"}"
            }]
        });
        let result = extract_anthropic_content(&json);
        assert!(result.unwrap_or_default().contains("BUILD_CAMPFIRE"));
    }

    #[test]
    fn extract_anthropic_content_missing() {
        let json = serde_json::json!({"content": []});
        assert!(extract_anthropic_content(&json).is_err());
    }

    #[test]
    fn extract_ollama_content_valid_and_missing() {
        let json = serde_json::json!({"model": "gemma3:4b", "response": "{\"plan\": []}", "done": true});
        assert_eq!(extract_ollama_content(&json).unwrap_or_default(), "{\"plan\": []}");
        assert!(extract_ollama_content(&serde_json::json!({"done": true})).is_err());
    }

    #[test]
    fn create_backend_dispatches_correctly() {
        let mut config = LlmBackendConfig {
            backend_type: BackendType::OpenAi,
            api_url: "https://api.openai.com/v1".to_owned(),
            api_key: "test".to_owned(),
            model: "test-model".to_owned(),
        };
        assert_eq!(create_backend(&config).name(), "openai-compatible");

        config.backend_type = BackendType::Anthropic;
        assert_eq!(create_backend(&config).name(), "anthropic");

        config.backend_type = BackendType::Ollama;
        assert_eq!(create_backend(&config).name(), "ollama");
    }
}
