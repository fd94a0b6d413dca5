/// Language model client for OpenAI-compatible chat completion APIs.
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::OpenAiConfig;
use crate::error::{RagError, Result};
use crate::http;

/// Sends a prompt to a completion service and returns the generated text.
pub trait LanguageModel: Send + Sync {
    fn complete(&self, prompt: &str, model: &str, temperature: f32) -> Result<String>;
}

pub struct OpenAiChatModel {
    client: Client,
    url: String,
    api_key: String,
}

/// Request payload for `/chat/completions`.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiChatModel {
    pub fn new(cfg: &OpenAiConfig) -> Result<Self> {
        let api_key = cfg
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| RagError::config("OPENAI_API_KEY is not set"))?;

        Ok(Self {
            client: http::build_client(cfg.timeout())?,
            url: http::endpoint(&cfg.base_url, "chat/completions"),
            api_key,
        })
    }
}

fn first_choice_text(resp: ChatResponse) -> Result<String> {
    resp.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| RagError::service("chat completion returned no content"))
}

impl LanguageModel for OpenAiChatModel {
    fn complete(&self, prompt: &str, model: &str, temperature: f32) -> Result<String> {
        let request = ChatRequest {
            model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature,
        };

        debug!("Requesting completion from {model} (temperature {temperature})");
        let resp: ChatResponse = http::post_json(
            &self.client,
            &self.url,
            &self.api_key,
            "chat completion",
            &request,
        )?;
        first_choice_text(resp)
    }
}
