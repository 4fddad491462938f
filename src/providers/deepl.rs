use async_trait::async_trait;
use log::{debug, error};
use reqwest::{Client, header};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{TranslationEngine, map_request_error, map_status_error};
use crate::errors::ProviderError;

/// DeepL client for the v2 translate API
#[derive(Debug)]
pub struct DeepL {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API base URL (free and pro accounts use different hosts)
    endpoint: String,
    /// Request timeout, reported in timeout errors
    timeout: Duration,
}

/// Translate request body
#[derive(Debug, Serialize)]
pub struct DeepLRequest {
    /// Texts to translate
    text: Vec<String>,

    /// Target language code (e.g. "SV", "EN-GB")
    target_lang: String,

    /// Keep the original formatting of the text
    #[serde(skip_serializing_if = "Option::is_none")]
    preserve_formatting: Option<bool>,
}

impl DeepLRequest {
    /// Create a request for a single text
    pub fn new(text: impl Into<String>, target_lang: impl Into<String>) -> Self {
        Self {
            text: vec![text.into()],
            target_lang: target_lang.into(),
            preserve_formatting: Some(true),
        }
    }
}

/// Translate response body
#[derive(Debug, Deserialize)]
pub struct DeepLResponse {
    /// One translation per submitted text
    pub translations: Vec<DeepLTranslation>,
}

/// A single translation
#[derive(Debug, Deserialize)]
pub struct DeepLTranslation {
    /// Language DeepL detected in the source
    #[serde(default)]
    pub detected_source_language: Option<String>,
    /// Translated text
    pub text: String,
}

impl DeepL {
    /// Create a new DeepL client
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            timeout,
        }
    }

    fn api_url(&self) -> String {
        format!("{}/v2/translate", self.endpoint.trim_end_matches('/'))
    }

    /// Send a translate request
    pub async fn complete(&self, request: &DeepLRequest) -> Result<DeepLResponse, ProviderError> {
        let response = self
            .client
            .post(self.api_url())
            .header(header::AUTHORIZATION, format!("DeepL-Auth-Key {}", self.api_key))
            .json(request)
            .send()
            .await
            .map_err(|e| map_request_error(e, self.timeout.as_millis() as u64))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("DeepL API error ({}): {}", status, error_text);
            return Err(match status.as_u16() {
                456 => ProviderError::ApiError {
                    status_code: 456,
                    message: format!("quota exceeded: {}", error_text),
                },
                code => map_status_error(code, error_text),
            });
        }

        response
            .json::<DeepLResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))
    }

    /// Extract the first translation from a response
    pub fn extract_text(response: &DeepLResponse) -> Result<String, ProviderError> {
        response
            .translations
            .first()
            .map(|t| t.text.clone())
            .ok_or_else(|| ProviderError::ParseError("response contained no translations".to_string()))
    }
}

#[async_trait]
impl TranslationEngine for DeepL {
    fn name(&self) -> &str {
        "deepl"
    }

    async fn translate(&self, text: &str, target_language: &str) -> Result<String, ProviderError> {
        debug!("Translating {} chars to {} with DeepL", text.chars().count(), target_language);
        let request = DeepLRequest::new(text, target_language);
        let response = self.complete(&request).await?;
        Self::extract_text(&response)
    }
}
