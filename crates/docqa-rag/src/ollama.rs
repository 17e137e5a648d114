use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use docqa_core::config::GenerationConfig;
use docqa_core::error::{Error, Result};
use docqa_core::traits::Generator;
use docqa_core::types::GenerationRequest;

/// Chat client for a local Ollama server.
pub struct OllamaGenerator {
    client: reqwest::Client,
    url: String,
    model: String,
    timeout: Duration,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

impl OllamaGenerator {
    /// The client ignores proxy environment variables; the server is local.
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let timeout = config.timeout();
        let client = reqwest::Client::builder()
            .no_proxy()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::InvalidConfig(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            url: format!("{}/api/chat", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            timeout,
        })
    }

    fn map_transport(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::GenerationTimeout(self.timeout)
        } else if e.is_decode() {
            Error::GenerationProtocol(format!("malformed response: {}", e))
        } else {
            Error::GenerationConnectivity(format!("{}: {}", self.url, e))
        }
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let user = request.user_message();
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage { role: "system", content: &request.system_instruction },
                ChatMessage { role: "user", content: &user },
            ],
            stream: false,
        };
        let response = self.client.post(&self.url).json(&body).send().await.map_err(|e| self.map_transport(e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::GenerationProtocol(format!("Ollama returned {}: {}", status, text)));
        }
        let bytes = response.bytes().await.map_err(|e| self.map_transport(e))?;
        let parsed: ChatResponse = serde_json::from_slice(&bytes)
            .map_err(|e| Error::GenerationProtocol(format!("malformed response: {}", e)))?;
        debug!(model = %self.model, chars = parsed.message.content.chars().count(), "generation received");
        Ok(parsed.message.content)
    }
}
