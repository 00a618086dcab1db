// crates/core/src/openai_client.rs

//! OpenAI-compatible client for the Chat Completions API.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::ai_client::{AiClient, ChatRequest, ChatResponse};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const MAX_ATTEMPTS: u32 = 3;

/// Blocking client for any endpoint speaking the `/chat/completions` protocol.
pub struct OpenAiClient {
    client: Client,
    url: String,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(base_url: &str, model: &str, api_key: &str) -> Self {
        let url = format!("{}/chat/completions", base_url.trim_end_matches('/'));

        Self {
            client: Client::new(),
            url,
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
struct CompletionsRequest<'a> {
    model: &'a str,
    messages: &'a [Value],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

impl AiClient for OpenAiClient {
    fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let body = CompletionsRequest {
            model: &self.model,
            messages: &request.messages,
            temperature: request.temperature,
        };

        let mut last_error = None;

        for attempt in 1..=MAX_ATTEMPTS {
            debug!(url = %self.url, model = %self.model, attempt, "sending chat request");
            let resp = self
                .client
                .post(&self.url)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send();

            match resp {
                Ok(r) => {
                    let status = r.status();
                    if !status.is_success() {
                        let text = r.text().unwrap_or_default();

                        if status.as_u16() == 429 || status.is_server_error() {
                            // 5s, 20s, 45s for rate limits
                            let delay = if status.as_u16() == 429 {
                                5 * u64::from(attempt * attempt)
                            } else {
                                u64::from(attempt) * 2
                            };
                            warn!(
                                attempt,
                                %status,
                                delay_secs = delay,
                                body = %text.chars().take(500).collect::<String>(),
                                "chat request throttled or failed, retrying"
                            );
                            last_error = Some(anyhow::anyhow!("HTTP {} - {}", status, text));
                            std::thread::sleep(Duration::from_secs(delay));
                            continue;
                        }

                        anyhow::bail!("chat request failed: HTTP {} - {}", status, text);
                    }

                    let raw = r.text().context("failed to read response body")?;
                    return serde_json::from_str(&raw)
                        .context("failed to parse chat completions response");
                }
                Err(e) => {
                    warn!(attempt, error = %e, "chat request network error, retrying");
                    last_error = Some(anyhow::anyhow!("network error: {}", e));
                    std::thread::sleep(Duration::from_secs(u64::from(attempt)));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("request failed after retries")))
    }
}
