//! OpenAI-compatible chat completion backend

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use corretor_config::LlmProviderSettings;
use corretor_core::CompletionModel;

use crate::LlmError;

/// Configuration for an OpenAI-compatible chat backend
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// API endpoint base, e.g. `https://api.openai.com/v1` or
    /// `https://chat.maritaca.ai/api`
    pub endpoint: String,
    /// API key (Bearer token)
    pub api_key: String,
    /// Model name
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Maximum tokens to generate
    pub max_tokens: usize,
    /// Request timeout; expiry surfaces as a network error
    pub timeout: Duration,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.0,
            max_tokens: 512,
            timeout: Duration::from_secs(60),
        }
    }
}

impl From<&LlmProviderSettings> for ChatConfig {
    fn from(settings: &LlmProviderSettings) -> Self {
        Self {
            endpoint: settings.endpoint.clone(),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            timeout: Duration::from_secs(settings.timeout_secs),
        }
    }
}

/// OpenAI-compatible chat backend
///
/// Works with OpenAI, Maritaca AI, and any other server speaking the
/// `/chat/completions` protocol.
pub struct ChatBackend {
    config: ChatConfig,
    client: Client,
}

impl ChatBackend {
    /// Create a new backend. Fails when the API key is missing for a
    /// remote endpoint or the HTTP client cannot be built.
    pub fn new(config: ChatConfig) -> Result<Self, LlmError> {
        if config.api_key.is_empty() && !config.endpoint.starts_with("http://localhost") {
            return Err(LlmError::Configuration(
                "API key required for remote endpoints".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Network(e.to_string()))?;

        Ok(Self { config, client })
    }

    fn chat_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.endpoint.trim_end_matches('/')
        )
    }

    async fn chat(&self, prompt: &str) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: Some(self.config.temperature),
            max_tokens: Some(self.config.max_tokens),
            stream: Some(false),
        };

        let response = self
            .client
            .post(self.chat_url())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("HTTP {}: {}", status, error_text)));
        }

        let response: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("no choices in response".to_string()))?;

        Ok(choice.message.content.into_text())
    }
}

#[async_trait]
impl CompletionModel for ChatBackend {
    async fn complete(&self, prompt: &str) -> corretor_core::Result<String> {
        let text = self.chat(prompt).await?;
        tracing::debug!(model = %self.config.model, chars = text.len(), "completion received");
        Ok(text)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

// Wire types

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: MessageContent,
}

/// Chat message content as returned by the provider.
///
/// Some providers return a plain string, others an array of typed content
/// parts. Both shapes are reduced to plain text at this boundary.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    #[serde(default)]
    text: String,
}

impl Default for MessageContent {
    fn default() -> Self {
        MessageContent::Text(String::new())
    }
}

impl MessageContent {
    fn into_text(self) -> String {
        match self {
            MessageContent::Text(text) => text,
            MessageContent::Parts(parts) => {
                parts.into_iter().map(|p| p.text).collect::<Vec<_>>().join("")
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_settings() {
        let settings = LlmProviderSettings {
            api_key: "mk-test".to_string(),
            endpoint: "https://chat.maritaca.ai/api".to_string(),
            model: "sabia-3".to_string(),
            temperature: 0.35,
            max_tokens: 2048,
            timeout_secs: 30,
        };

        let config = ChatConfig::from(&settings);
        assert_eq!(config.model, "sabia-3");
        assert_eq!(config.temperature, 0.35);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_backend_requires_api_key_for_remote() {
        let config = ChatConfig::default();
        assert!(ChatBackend::new(config).is_err());

        let config = ChatConfig {
            api_key: "sk-test".to_string(),
            ..Default::default()
        };
        assert!(ChatBackend::new(config).is_ok());

        // Local endpoints skip the key check
        let config = ChatConfig {
            endpoint: "http://localhost:8000/v1".to_string(),
            ..Default::default()
        };
        assert!(ChatBackend::new(config).is_ok());
    }

    #[test]
    fn test_chat_url() {
        let backend = ChatBackend::new(ChatConfig {
            endpoint: "https://chat.maritaca.ai/api/".to_string(),
            api_key: "mk-test".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            backend.chat_url(),
            "https://chat.maritaca.ai/api/chat/completions"
        );
    }

    #[test]
    fn test_unwrap_plain_string_content() {
        let json = r#"{"choices":[{"message":{"role":"assistant","content":"Análise pronta."}}]}"#;
        let response: ChatResponse = serde_json::from_str(json).unwrap();
        let choice = response.choices.into_iter().next().unwrap();
        assert_eq!(choice.message.content.into_text(), "Análise pronta.");
    }

    #[test]
    fn test_unwrap_structured_content() {
        let json = r#"{
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": [
                        {"type": "text", "text": "Parte um. "},
                        {"type": "text", "text": "Parte dois."}
                    ]
                }
            }]
        }"#;
        let response: ChatResponse = serde_json::from_str(json).unwrap();
        let choice = response.choices.into_iter().next().unwrap();
        assert_eq!(choice.message.content.into_text(), "Parte um. Parte dois.");
    }

    #[test]
    fn test_missing_content_defaults_to_empty() {
        let json = r#"{"choices":[{"message":{"role":"assistant"}}]}"#;
        let response: ChatResponse = serde_json::from_str(json).unwrap();
        let choice = response.choices.into_iter().next().unwrap();
        assert_eq!(choice.message.content.into_text(), "");
    }
}
