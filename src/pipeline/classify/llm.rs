use serde::{Deserialize, Serialize};

use super::LlmError;

/// Default request timeout. Classification holds a queue slot, so a slow
/// provider must fail fast enough for the keyword tier to take over.
pub const LLM_TIMEOUT_SECS: u64 = 30;

/// Chat-completion abstraction (allows mocking)
pub trait TextGenerator: Send + Sync {
    fn complete(
        &self,
        system: &str,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, LlmError>;
}

/// OpenRouter HTTP client for hosted chat completions.
pub struct OpenRouterClient {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OpenRouterClient {
    pub fn new(base_url: &str, api_key: &str, model: &str, timeout_secs: u64) -> Result<Self, LlmError> {
        if api_key.trim().is_empty() {
            return Err(LlmError::MissingApiKey);
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| LlmError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            client,
            timeout_secs,
        })
    }
}

/// Request body for /chat/completions
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Response body from /chat/completions
#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

impl TextGenerator for OpenRouterClient {
    fn complete(
        &self,
        system: &str,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens,
            temperature,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    LlmError::Connection(self.base_url.clone())
                } else if e.is_timeout() {
                    LlmError::Timeout(self.timeout_secs)
                } else {
                    LlmError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        match status.as_u16() {
            429 => return Err(LlmError::RateLimited),
            402 => return Err(LlmError::PaymentRequired),
            _ if !status.is_success() => {
                let body = response.text().unwrap_or_default();
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    body,
                });
            }
            _ => {}
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| LlmError::MalformedResponse("empty choices array".into()))
    }
}

/// Mock generator for testing. Plays back a queue of canned results and
/// records every prompt it was asked to complete.
pub struct MockTextGenerator {
    responses: std::sync::Mutex<Vec<Result<String, LlmError>>>,
    pub prompts: std::sync::Mutex<Vec<String>>,
}

impl MockTextGenerator {
    pub fn with_response(response: &str) -> Self {
        Self::with_results(vec![Ok(response.to_string())])
    }

    pub fn failing(error: LlmError) -> Self {
        Self::with_results(vec![Err(error)])
    }

    pub fn with_results(results: Vec<Result<String, LlmError>>) -> Self {
        Self {
            // Stored reversed so pop() plays them back in order
            responses: std::sync::Mutex::new(results.into_iter().rev().collect()),
            prompts: std::sync::Mutex::new(Vec::new()),
        }
    }
}

impl TextGenerator for MockTextGenerator {
    fn complete(
        &self,
        _system: &str,
        prompt: &str,
        _max_tokens: u32,
        _temperature: f32,
    ) -> Result<String, LlmError> {
        self.prompts
            .lock()
            .map_err(|_| LlmError::HttpClient("mock poisoned".into()))?
            .push(prompt.to_string());

        let mut responses = self
            .responses
            .lock()
            .map_err(|_| LlmError::HttpClient("mock poisoned".into()))?;

        match responses.pop() {
            Some(result) => result,
            None => Err(LlmError::HttpClient("mock exhausted".into())),
        }
    }
}
