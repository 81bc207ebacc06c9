use std::env;
use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::debug;

use docqa_core::config::HostedGenerationConfig;
use docqa_core::traits::Generator;
use docqa_core::{Error, Result};

/// Client for an OpenAI-compatible `/chat/completions` endpoint. The prompt is
/// sent as a single user message with temperature 0.
pub struct HostedGenerator {
    client: Client,
    url: String,
    model: String,
    api_key: String,
    max_tokens: usize,
    name: String,
}

impl HostedGenerator {
    /// Read the API key from the environment variable named by `api_key_env`.
    pub fn from_config(config: &HostedGenerationConfig) -> Result<Self> {
        let api_key = env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::InvalidConfig(format!("environment variable {} is not set", config.api_key_env)))?;
        Self::new(config, api_key)
    }

    pub fn new(config: &HostedGenerationConfig, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::generation(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            api_key,
            max_tokens: config.max_tokens,
            name: format!("hosted:{}", config.model),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn request<'a>(&'a self, prompt: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            temperature: 0.0,
            max_tokens: self.max_tokens,
            messages: vec![ChatMessage { role: "user", content: prompt }],
        }
    }
}

impl Generator for HostedGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    fn generate(&self, prompt: &str) -> Result<String> {
        let start = Instant::now();
        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", self.api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth).map_err(|_| Error::InvalidConfig("API key is not a valid header value".into()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let resp = self
            .client
            .post(&self.url)
            .headers(headers)
            .json(&self.request(prompt))
            .send()
            .map_err(|e| Error::generation(format!("request to {} failed: {e}", self.url)))?;
        let status = resp.status();
        let body = resp
            .text()
            .map_err(|e| Error::generation(format!("failed to read response body: {e}")))?;
        if !status.is_success() {
            return Err(Error::generation(format!("{} returned {}: {}", self.url, status, body)));
        }
        let answer = parse_response(&body)?;
        debug!(elapsed_ms = start.elapsed().as_millis() as u64, "hosted generation finished");
        Ok(answer)
    }
}

/// Extract the first choice's message content from a chat completion body.
pub fn parse_response(body: &str) -> Result<String> {
    let parsed: ChatResponse =
        serde_json::from_str(body).map_err(|e| Error::generation(format!("unexpected response: {e}")))?;
    parsed
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content.unwrap_or_default())
        .ok_or_else(|| Error::generation("response contained no choices"))
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    max_tokens: usize,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
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
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_has_single_user_message_at_zero_temperature() {
        let config = HostedGenerationConfig { base_url: "http://localhost:8080/v1/".into(), ..Default::default() };
        let generator = HostedGenerator::new(&config, "sk-test".into()).unwrap();
        assert_eq!(generator.url(), "http://localhost:8080/v1/chat/completions");
        let body = serde_json::to_value(generator.request("Question: hi")).unwrap();
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["temperature"], 0.0);
        assert_eq!(body["max_tokens"], 256);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "Question: hi");
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn parses_first_choice() {
        let body = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"YES"}},{"index":1,"message":{"role":"assistant","content":"NO"}}]}"#;
        assert_eq!(parse_response(body).unwrap(), "YES");
    }

    #[test]
    fn empty_choices_is_an_error() {
        assert!(matches!(parse_response(r#"{"choices":[]}"#), Err(Error::Generation(_))));
        assert!(matches!(parse_response("not json"), Err(Error::Generation(_))));
    }

    #[test]
    fn null_content_becomes_empty_text() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#;
        assert_eq!(parse_response(body).unwrap(), "");
    }
}
