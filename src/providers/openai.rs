use async_trait::async_trait;
use log::{debug, error};
use reqwest::{Client, RequestBuilder, header};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{ReviewEngine, ReviewPoll, map_request_error, map_status_error};
use crate::errors::ProviderError;

/// Prefix of the user message carrying the text under review
pub const REVIEW_MESSAGE_PREFIX: &str =
    "Review and improve this translation, focusing on natural language flow and accuracy: ";

/// OpenAI Assistants client used as a review engine
#[derive(Debug)]
pub struct OpenAIAssistant {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// Assistant that performs the review
    assistant_id: String,
    /// API base URL
    endpoint: String,
    /// Per-request timeout, reported in timeout errors
    timeout: Duration,
}

/// Object carrying only an id (thread, message, run)
#[derive(Debug, Deserialize)]
pub struct OpenAIObject {
    pub id: String,
}

/// Message creation body
#[derive(Debug, Serialize)]
pub struct MessageRequest {
    role: String,
    content: String,
}

/// Run creation body
#[derive(Debug, Serialize)]
pub struct RunRequest {
    assistant_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    additional_instructions: Option<String>,
}

/// Run status
#[derive(Debug, Deserialize)]
pub struct RunStatus {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub last_error: Option<RunError>,
}

/// Error attached to a failed run
#[derive(Debug, Deserialize)]
pub struct RunError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

/// Message listing
#[derive(Debug, Deserialize)]
pub struct MessageList {
    pub data: Vec<ThreadMessage>,
}

/// A message of a thread
#[derive(Debug, Deserialize)]
pub struct ThreadMessage {
    pub role: String,
    pub content: Vec<MessageContent>,
}

/// Content block of a message
#[derive(Debug, Deserialize)]
pub struct MessageContent {
    #[serde(rename = "type")]
    pub content_type: String,
    #[serde(default)]
    pub text: Option<MessageText>,
}

/// Text content value
#[derive(Debug, Deserialize)]
pub struct MessageText {
    pub value: String,
}

impl OpenAIAssistant {
    /// Create a new assistant client
    pub fn new(
        api_key: impl Into<String>,
        assistant_id: impl Into<String>,
        endpoint: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            assistant_id: assistant_id.into(),
            endpoint: endpoint.into(),
            timeout,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint.trim_end_matches('/'), path)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header("OpenAI-Beta", "assistants=v2")
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ProviderError> {
        let response = self
            .authorized(builder)
            .send()
            .await
            .map_err(|e| map_request_error(e, self.timeout.as_millis() as u64))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("OpenAI API error ({}): {}", status, error_text);
            return Err(map_status_error(status.as_u16(), error_text));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))
    }

    /// Text of the latest assistant message of a thread
    pub async fn latest_reply(&self, thread_id: &str) -> Result<Option<String>, ProviderError> {
        let builder = self
            .client
            .get(self.url(&format!("threads/{}/messages", thread_id)))
            .query(&[("order", "desc"), ("limit", "1")]);
        let messages: MessageList = self.send(builder).await?;
        Ok(Self::extract_reply(&messages))
    }

    /// Extract assistant text from a message listing
    pub fn extract_reply(messages: &MessageList) -> Option<String> {
        let message = messages.data.iter().find(|m| m.role == "assistant")?;
        let text: String = message
            .content
            .iter()
            .filter(|c| c.content_type == "text")
            .filter_map(|c| c.text.as_ref().map(|t| t.value.as_str()))
            .collect::<Vec<_>>()
            .join("\n");

        if text.trim().is_empty() { None } else { Some(text) }
    }
}

#[async_trait]
impl ReviewEngine for OpenAIAssistant {
    fn name(&self) -> &str {
        "openai"
    }

    async fn open_session(&self) -> Result<String, ProviderError> {
        let builder = self.client.post(self.url("threads")).json(&serde_json::json!({}));
        let thread: OpenAIObject = self.send(builder).await?;
        debug!("Created review thread {}", thread.id);
        Ok(thread.id)
    }

    async fn submit(
        &self,
        session_id: &str,
        text: &str,
        instructions: &str,
    ) -> Result<String, ProviderError> {
        let message = MessageRequest {
            role: "user".to_string(),
            content: format!("{}{}", REVIEW_MESSAGE_PREFIX, text),
        };
        let builder = self
            .client
            .post(self.url(&format!("threads/{}/messages", session_id)))
            .json(&message);
        let _: OpenAIObject = self.send(builder).await?;

        let run = RunRequest {
            assistant_id: self.assistant_id.clone(),
            additional_instructions: Some(instructions.to_string()).filter(|s| !s.is_empty()),
        };
        let builder = self
            .client
            .post(self.url(&format!("threads/{}/runs", session_id)))
            .json(&run);
        let run: OpenAIObject = self.send(builder).await?;
        debug!("Started review run {} on thread {}", run.id, session_id);
        Ok(run.id)
    }

    async fn poll(&self, session_id: &str, run_id: &str) -> Result<ReviewPoll, ProviderError> {
        let builder = self
            .client
            .get(self.url(&format!("threads/{}/runs/{}", session_id, run_id)));
        let run: RunStatus = self.send(builder).await?;
        debug!("Review run {} status: {}", run.id, run.status);

        match run.status.as_str() {
            "completed" => match self.latest_reply(session_id).await? {
                Some(text) => Ok(ReviewPoll::Completed(text)),
                None => Ok(ReviewPoll::Failed {
                    reason: "run completed without a reply".to_string(),
                    partial: None,
                }),
            },
            "incomplete" => Ok(ReviewPoll::Failed {
                reason: "run ended incomplete".to_string(),
                partial: self.latest_reply(session_id).await?,
            }),
            "failed" | "cancelled" | "expired" | "requires_action" => {
                let reason = run
                    .last_error
                    .map(|e| format!("{}: {}", e.code, e.message))
                    .unwrap_or_else(|| format!("run {}", run.status));
                Ok(ReviewPoll::Failed { reason, partial: None })
            }
            _ => Ok(ReviewPoll::Pending { partial: None }),
        }
    }

    async fn abandon(&self, session_id: &str, run_id: &str) -> Result<(), ProviderError> {
        let builder = self
            .client
            .post(self.url(&format!("threads/{}/runs/{}/cancel", session_id, run_id)));
        let _: RunStatus = self.send(builder).await?;
        Ok(())
    }
}
