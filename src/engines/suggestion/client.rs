//! Language-model client used by the suggestion pipeline and the crossover advisor

use crate::config::SuggestionConfig;
use crate::error::{Result, SearchError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Outcome of one submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    /// Transport or service failure; never raised as an error
    Fail,
}

impl Reply {
    pub fn text(self) -> Option<String> {
        match self {
            Reply::Text(text) => Some(text),
            Reply::Fail => None,
        }
    }
}

pub trait SuggestionClient: Send + Sync {
    fn submit(&self, prompt: &str, model: &str) -> Reply;
}

impl<C: SuggestionClient + ?Sized> SuggestionClient for Arc<C> {
    fn submit(&self, prompt: &str, model: &str) -> Reply {
        (**self).submit(prompt, model)
    }
}

/// Chat-completions request body
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completions response body, only the parts we read
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Blocking client for any OpenAI-compatible chat-completions endpoint
pub struct OpenAiClient {
    http: reqwest::blocking::Client,
    endpoint: String,
    api_key: String,
}

impl OpenAiClient {
    pub fn new(endpoint: &str, api_key: &str, config: &SuggestionConfig) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Build from config, reading the key from the configured variable
    pub fn from_config(config: &SuggestionConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            SearchError::Configuration(format!(
                "environment variable {} is not set",
                config.api_key_env
            ))
        })?;
        Self::new(&config.endpoint, &api_key, config)
    }

    fn request(&self, prompt: &str, model: &str) -> Result<String> {
        let body = ChatRequest {
            model,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: Some(prompt.to_string()),
            }],
        };

        let response: ChatResponse = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()?
            .error_for_status()?
            .json()?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| SearchError::Suggestion("response carried no content".to_string()))
    }
}

impl SuggestionClient for OpenAiClient {
    fn submit(&self, prompt: &str, model: &str) -> Reply {
        match self.request(prompt, model) {
            Ok(text) => {
                log::debug!("Received {} chars from {}", text.len(), model);
                Reply::Text(text)
            }
            Err(e) => {
                log::warn!("Suggestion request to {} failed: {}", model, e);
                Reply::Fail
            }
        }
    }
}
