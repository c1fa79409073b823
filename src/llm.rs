//! Chat-completion clients implementing [`CompletionService`].
//!
//! - **[`OpenAIChat`]**: OpenAI-compatible `POST {base_url}/chat/completions`.
//!   One request per call, no retries: a failed call ends the turn.
//! - **[`DisabledChat`]**: fails every call. Lets the not-found and
//!   weak-match paths run without network access.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use lumidesk_core::{CompletionService, Message};
use std::time::Duration;

use crate::config::LlmConfig;

pub struct OpenAIChat {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    temperature: f32,
    api_key: String,
}

impl OpenAIChat {
    /// # Errors
    ///
    /// Returns an error if `OPENAI_API_KEY` is not in the environment.
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| anyhow!("OPENAI_API_KEY environment variable not set"))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            endpoint: endpoint(&config.base_url),
            model: config.model.clone(),
            temperature: config.temperature,
            api_key,
        })
    }
}

/// Resolve the chat completions endpoint from a base URL.
fn endpoint(base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if base.ends_with("/chat/completions") {
        base.to_string()
    } else {
        format!("{}/chat/completions", base)
    }
}

fn request_body(model: &str, temperature: f32, messages: &[Message]) -> serde_json::Value {
    serde_json::json!({
        "model": model,
        "temperature": temperature,
        "messages": messages,
    })
}

/// Extract `choices[0].message.content`. A missing or null content is an error.
fn parse_content(json: &serde_json::Value) -> Result<String> {
    json["choices"]
        .get(0)
        .and_then(|c| c["message"]["content"].as_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow!("Invalid chat response: missing choices[0].message.content"))
}

#[async_trait]
impl CompletionService for OpenAIChat {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        let body = request_body(&self.model, self.temperature, messages);

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("Chat request failed")?;

        let status = resp.status();
        let text = resp.text().await.context("Failed to read chat response")?;
        if !status.is_success() {
            bail!("Chat API error {}: {}", status, text);
        }

        let json: serde_json::Value =
            serde_json::from_str(&text).context("Failed to parse chat response JSON")?;
        parse_content(&json)
    }
}

pub struct DisabledChat;

#[async_trait]
impl CompletionService for DisabledChat {
    async fn complete(&self, _messages: &[Message]) -> Result<String> {
        bail!("LLM provider is disabled (set [llm] provider = \"openai\")")
    }
}

/// Create the completion service named by `config.provider`.
pub fn create_completion(config: &LlmConfig) -> Result<Box<dyn CompletionService>> {
    match config.provider.as_str() {
        "disabled" => Ok(Box::new(DisabledChat)),
        "openai" => Ok(Box::new(OpenAIChat::new(config)?)),
        other => bail!("Unknown llm provider: {}", other),
    }
}
