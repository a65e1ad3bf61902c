use std::time::Duration;

use log::debug;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::{RaceSpaceError, config::SummaryConfig};

use super::{PromptRequest, TextGenerator};

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReplyMessage,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

/// Text generator backed by an OpenAI compatible `/chat/completions` endpoint.
pub struct ChatCompletionsClient {
    config: SummaryConfig,
    http: Client,
}

impl ChatCompletionsClient {
    pub fn new(config: SummaryConfig) -> Result<Self, RaceSpaceError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_s))
            .build()
            .map_err(|e| RaceSpaceError::TextGenerationTransport { source: e })?;
        Ok(Self { config, http })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

impl TextGenerator for ChatCompletionsClient {
    fn generate(&self, request: &PromptRequest) -> Result<String, RaceSpaceError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or(RaceSpaceError::MissingApiKey)?;

        let prompt = request.render();
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &self.config.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            temperature: self.config.temperature,
        };

        debug!("Requesting AI analysis from {}", self.endpoint());
        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .map_err(|e| RaceSpaceError::TextGenerationTransport { source: e })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RaceSpaceError::TextGenerationStatus {
                status: status.as_u16(),
            });
        }

        let reply: ChatResponse = response
            .json()
            .map_err(|e| RaceSpaceError::TextGenerationTransport { source: e })?;
        reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(RaceSpaceError::EmptyTextGeneration)
    }
}
