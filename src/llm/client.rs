//! LLM client for API communication

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Which wire protocol the endpoint speaks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    Ollama,
    /// Any `/v1/chat/completions` compatible server
    OpenAi,
}

/// Configuration for the LLM client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: LlmProvider,

    /// API endpoint URL (e.g., http://localhost:11434 for Ollama)
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// API key (if required)
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "llama3".to_string()
}

fn default_max_tokens() -> usize {
    512
}

fn default_temperature() -> f32 {
    0.2
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            endpoint: default_endpoint(),
            model: default_model(),
            api_key: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

/// LLM client for cluster explanations
pub struct LlmClient {
    config: LlmConfig,
    client: reqwest::Client,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Generate a completion, returning the raw text
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        match self.config.provider {
            LlmProvider::Ollama => self.complete_ollama(prompt).await,
            LlmProvider::OpenAi => self.complete_openai(prompt).await,
        }
    }

    async fn complete_ollama(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.config.endpoint.trim_end_matches('/'));

        let request = OllamaGenerateRequest {
            model: &self.config.model,
            prompt,
            stream: false,
            options: OllamaOptions {
                temperature: self.config.temperature,
                num_predict: self.config.max_tokens,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to Ollama")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Ollama request failed: {} - {}", status, body);
        }

        let result: OllamaGenerateResponse = response
            .json()
            .await
            .context("Failed to parse Ollama response")?;

        Ok(result.response)
    }

    async fn complete_openai(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/v1/chat/completions",
            self.config.endpoint.trim_end_matches('/')
        );

        let request = OpenAIChatRequest {
            model: &self.config.model,
            messages: vec![OpenAIMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let mut builder = self.client.post(&url).json(&request);
        if let Some(ref key) = self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .context("Failed to send request to OpenAI-compatible API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("OpenAI request failed: {} - {}", status, body);
        }

        let result: OpenAIChatResponse = response
            .json()
            .await
            .context("Failed to parse OpenAI response")?;

        result
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .context("OpenAI response contained no choices")
    }
}

// Ollama API types

#[derive(Debug, Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: usize,
}

#[derive(Debug, Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

// OpenAI API types

#[derive(Debug, Serialize)]
struct OpenAIChatRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAIMessage>,
    max_tokens: usize,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIChatResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LlmConfig::default();
        assert_eq!(config.provider, LlmProvider::Ollama);
        assert!(config.endpoint.contains("11434"));
        assert!(config.temperature > 0.0);
    }

    #[test]
    fn test_config_from_toml() {
        let config: LlmConfig = toml::from_str(
            r#"
provider = "openai"
endpoint = "https://llm.example.com"
model = "gpt-4o-mini"
"#,
        )
        .unwrap();
        assert_eq!(config.provider, LlmProvider::OpenAi);
        assert_eq!(config.max_tokens, 512);
        assert!(config.api_key.is_none());
    }
}
