use crate::advice::error::AdviceError;
use crate::advice::AdviceGenerator;
use async_trait::async_trait;
use log::warn;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_CHAT_URL: &str = "http://localhost:11434/v1/chat/completions";
pub const DEFAULT_CHAT_MODEL: &str = "AQIModel";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

/// [`AdviceGenerator`] for any OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone)]
pub struct ChatCompletionsClient {
    url: String,
    model: String,
    api_key: Option<String>,
    client: Client,
}

impl ChatCompletionsClient {
    pub fn new(
        url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AdviceError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(AdviceError::ClientBuild)?;
        Ok(Self {
            url: url.into(),
            model: model.into(),
            api_key: None,
            client,
        })
    }

    /// Sends `key` as a bearer token with every request.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }
}

/// The trimmed content of the first choice.
fn first_choice(body: &str) -> Result<String, AdviceError> {
    let response: ChatResponse = serde_json::from_str(body)?;
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content.trim().to_string())
        .ok_or(AdviceError::EmptyCompletion)
}

#[async_trait]
impl AdviceGenerator for ChatCompletionsClient {
    async fn generate(&self, prompt: &str) -> Result<String, AdviceError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let mut request = self.client.post(&self.url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request
            .send()
            .await
            .map_err(|e| AdviceError::NetworkRequest(self.url.clone(), e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("HTTP error for {}: {:?}", self.url, e);
                return Err(if let Some(status) = e.status() {
                    AdviceError::HttpStatus {
                        url: self.url.clone(),
                        status,
                        source: e,
                    }
                } else {
                    AdviceError::NetworkRequest(self.url.clone(), e)
                });
            }
        };

        let text = response
            .text()
            .await
            .map_err(|e| AdviceError::NetworkRequest(self.url.clone(), e))?;
        first_choice(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_shape() {
        let body = ChatRequest {
            model: "AQIModel",
            messages: vec![ChatMessage {
                role: "user",
                content: "AQI: Good",
            }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "AQIModel");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "AQI: Good");
    }

    #[test]
    fn first_choice_content_is_trimmed() -> Result<(), AdviceError> {
        let body = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"\n Stay indoors. \n"}},{"index":1,"message":{"role":"assistant","content":"ignored"}}]}"#;
        assert_eq!(first_choice(body)?, "Stay indoors.");
        Ok(())
    }

    #[test]
    fn empty_or_invalid_responses() {
        assert!(matches!(
            first_choice(r#"{"choices":[]}"#),
            Err(AdviceError::EmptyCompletion)
        ));
        assert!(matches!(
            first_choice("<html>"),
            Err(AdviceError::JsonParse(_))
        ));
    }
}
