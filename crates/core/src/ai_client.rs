// crates/core/src/ai_client.rs

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Abstract chat-completion client.
///
/// Implementations can use OpenAI, Azure, Ollama, or a scripted stand-in.
pub trait AiClient {
    fn chat(&self, request: ChatRequest) -> Result<ChatResponse>;

    /// One system + user exchange, returning the reply text.
    fn complete(&self, system: &str, prompt: &str, temperature: f32) -> Result<String> {
        let request = ChatRequest::new(vec![
            json!({"role": "system", "content": system}),
            json!({"role": "user", "content": prompt}),
        ])
        .with_temperature(temperature);
        self.chat(request)?
            .content()
            .context("model reply has no text content")
    }
}

/// A chat completion request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub messages: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl ChatRequest {
    pub fn new(messages: Vec<Value>) -> Self {
        Self {
            messages,
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// A chat completion response.
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<ChatChoice>,
}

impl ChatResponse {
    /// Text of the first choice, if any.
    pub fn content(self) -> Option<String> {
        self.choices.into_iter().next()?.message.content
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
}
