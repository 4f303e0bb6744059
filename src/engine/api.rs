//! OpenAI-compatible chat completions client.
//!
//! One client serves every configured provider; the provider name recorded
//! in a tree's config selects the endpoint and credentials at request time.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ArborError, Result};
use crate::forest::{Message, TreeConfig};

use super::{Engine, GenerateOptions, NodeData};

/// Request timeout. Generation is slow; navigation stays responsive because
/// requests run on a spawned task.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Resolved endpoint for one provider.
#[derive(Debug, Clone)]
pub struct ProviderEndpoint {
    /// Base URL up to the API root, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    /// Bearer token, if the provider requires one.
    pub api_key: Option<String>,
}

/// HTTP generation engine.
pub struct ApiEngine {
    client: reqwest::Client,
    providers: HashMap<String, ProviderEndpoint>,
}

impl ApiEngine {
    /// Build an engine over a set of resolved provider endpoints.
    pub fn new(providers: HashMap<String, ProviderEndpoint>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ArborError::generation_with_source("Failed to build HTTP client", e))?;

        Ok(Self { client, providers })
    }

    fn endpoint(&self, provider: &str) -> Result<&ProviderEndpoint> {
        self.providers
            .get(provider)
            .ok_or_else(|| ArborError::ProviderNotConfigured {
                name: provider.to_string(),
            })
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    n: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

fn wire_role(message: &Message) -> &'static str {
    match message.role {
        crate::forest::Role::System => "system",
        crate::forest::Role::User => "user",
        crate::forest::Role::Assistant => "assistant",
    }
}

#[async_trait]
impl Engine for ApiEngine {
    async fn generate(
        &self,
        config: &TreeConfig,
        messages: &[Message],
        options: &GenerateOptions,
    ) -> Result<Vec<NodeData>> {
        let endpoint = self.endpoint(&config.provider)?;
        let url = format!(
            "{}/chat/completions",
            endpoint.base_url.trim_end_matches('/')
        );

        let request = ChatRequest {
            model: &config.model,
            messages: messages
                .iter()
                .map(|m| WireMessage {
                    role: wire_role(m),
                    content: &m.content,
                })
                .collect(),
            n: options.count as u32,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        };

        debug!(provider = %config.provider, model = %config.model, n = options.count, "sending generation request");

        let mut builder = self.client.post(&url).json(&request);
        if let Some(key) = &endpoint.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            ArborError::generation_with_source(
                format!("Request to provider '{}' failed", config.provider),
                e,
            )
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet = crate::util::truncate_line(&body, 200);
            return Err(ArborError::generation(format!(
                "Provider '{}' returned {status}: {snippet}",
                config.provider
            )));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            ArborError::generation_with_source(
                format!("Provider '{}' returned an unreadable response", config.provider),
                e,
            )
        })?;

        if parsed.choices.is_empty() {
            return Err(ArborError::generation(format!(
                "Provider '{}' returned no candidates",
                config.provider
            )));
        }

        Ok(parsed
            .choices
            .into_iter()
            .map(|choice| NodeData {
                message: Message::assistant(choice.message.content.unwrap_or_default()),
                model: parsed.model.clone(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_request_wire_shape() {
        let request = ChatRequest {
            model: "gpt-4o",
            messages: vec![
                WireMessage {
                    role: "system",
                    content: "be terse",
                },
                WireMessage {
                    role: "user",
                    content: "hi",
                },
            ],
            n: 3,
            temperature: Some(0.7),
            max_tokens: None,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-4o");
        assert_eq!(json["n"], 3);
        assert_eq!(json["messages"][1]["role"], "user");
        assert!(json.get("max_tokens").is_none());
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{
            "id": "chatcmpl-1",
            "model": "gpt-4o-2024",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "one"}},
                {"index": 1, "message": {"role": "assistant", "content": "two"}}
            ]
        }"#;

        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices.len(), 2);
        assert_eq!(parsed.model.as_deref(), Some("gpt-4o-2024"));
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("one"));
    }

    #[test]
    fn test_missing_provider_is_config_error() {
        let engine = ApiEngine::new(HashMap::new()).unwrap();
        let err = engine.endpoint("nowhere").unwrap_err();
        assert!(matches!(err, ArborError::ProviderNotConfigured { .. }));
    }
}
