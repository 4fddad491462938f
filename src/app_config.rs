use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::time::Duration;
use url::Url;

use crate::errors::ConfigurationError;
use crate::language_utils;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Target language code (DeepL form, e.g. "SV", "EN-GB")
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Owner recorded on cache entries and stored content
    #[serde(default = "default_owner")]
    pub owner: String,

    /// Translation engine config
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Review engine config
    #[serde(default)]
    pub review: ReviewConfig,

    /// Pipeline tuning
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Storage location
    #[serde(default)]
    pub storage: StorageConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation engine type
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    // @provider: DeepL
    #[default]
    DeepL,
    // @provider: Offline echo engine for dry runs
    Mock,
}

impl TranslationProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::DeepL => "DeepL",
            Self::Mock => "Mock",
        }
    }
}

impl std::fmt::Display for TranslationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DeepL => write!(f, "deepl"),
            Self::Mock => write!(f, "mock"),
        }
    }
}

impl std::str::FromStr for TranslationProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "deepl" => Ok(Self::DeepL),
            "mock" => Ok(Self::Mock),
            _ => Err(anyhow!("Invalid translation provider: {}", s)),
        }
    }
}

/// Review engine type
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReviewProvider {
    // @provider: OpenAI Assistants
    #[default]
    OpenAI,
    // @provider: Review stage switched off
    Disabled,
    // @provider: Offline reviewer for dry runs
    Mock,
}

impl std::fmt::Display for ReviewProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpenAI => write!(f, "openai"),
            Self::Disabled => write!(f, "disabled"),
            Self::Mock => write!(f, "mock"),
        }
    }
}

impl std::str::FromStr for ReviewProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "disabled" | "none" | "off" => Ok(Self::Disabled),
            "mock" => Ok(Self::Mock),
            _ => Err(anyhow!("Invalid review provider: {}", s)),
        }
    }
}

/// How aggressively the reviewer may rewrite a translation
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStyle {
    Conservative,
    #[default]
    Balanced,
    Creative,
}

impl ReviewStyle {
    /// Style line handed to the reviewer
    pub fn instructions(&self) -> &'static str {
        match self {
            Self::Conservative => "Make minimal changes while fixing only clear errors.",
            Self::Balanced => "Make moderate improvements while maintaining the original style.",
            Self::Creative => "Enhance the text significantly while keeping the core meaning.",
        }
    }
}

impl std::str::FromStr for ReviewStyle {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "conservative" => Ok(Self::Conservative),
            "balanced" => Ok(Self::Balanced),
            "creative" => Ok(Self::Creative),
            _ => Err(anyhow!("Invalid review style: {}", s)),
        }
    }
}

/// Translation engine configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    // @field: Engine type
    #[serde(default)]
    pub provider: TranslationProvider,

    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "default_deepl_endpoint")]
    pub endpoint: String,

    // @field: Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Total attempts per segment, first call included
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Delay before the second attempt, in milliseconds
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Factor applied to the delay after each failed attempt
    #[serde(default = "default_retry_multiplier")]
    pub retry_multiplier: f64,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            provider: TranslationProvider::default(),
            api_key: String::new(),
            endpoint: default_deepl_endpoint(),
            timeout_secs: default_timeout_secs(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            retry_multiplier: default_retry_multiplier(),
        }
    }
}

impl TranslationConfig {
    /// Per-request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Review engine configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ReviewConfig {
    // @field: Engine type
    #[serde(default)]
    pub provider: ReviewProvider,

    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Assistant identifier the review runs against
    #[serde(default = "String::new")]
    pub assistant_id: String,

    // @field: Service URL
    #[serde(default = "default_openai_endpoint")]
    pub endpoint: String,

    // @field: Rewrite style
    #[serde(default)]
    pub style: ReviewStyle,

    /// Custom instructions appended to the default reviewer guidance
    #[serde(default)]
    pub instructions: Option<String>,

    /// Upper bound on the whole review of one segment
    #[serde(default = "default_review_wait_secs")]
    pub max_wait_secs: u64,

    /// Delay between two status polls
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            provider: ReviewProvider::default(),
            api_key: String::new(),
            assistant_id: String::new(),
            endpoint: default_openai_endpoint(),
            style: ReviewStyle::default(),
            instructions: None,
            max_wait_secs: default_review_wait_secs(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

/// Segmentation, concurrency and gating settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PipelineConfig {
    /// Maximum characters per translation segment
    #[serde(default = "default_max_segment_chars")]
    pub max_segment_chars: usize,

    /// Maximum characters per editing page
    #[serde(default = "default_page_chars")]
    pub page_chars: usize,

    /// Maximum in-flight external calls across the whole run
    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: usize,

    /// Documents of a batch processed at the same time
    #[serde(default = "default_concurrent_documents")]
    pub concurrent_documents: usize,

    #[serde(default = "default_true")]
    pub use_cache: bool,

    #[serde(default = "default_true")]
    pub smart_review: bool,

    /// Segments scoring below this skip the review stage
    #[serde(default = "default_complexity_threshold")]
    pub complexity_threshold: f64,

    /// Characters of normalized text that enter a cache fingerprint
    #[serde(default = "default_fingerprint_sample_chars")]
    pub fingerprint_sample_chars: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_segment_chars: default_max_segment_chars(),
            page_chars: default_page_chars(),
            concurrent_requests: default_concurrent_requests(),
            concurrent_documents: default_concurrent_documents(),
            use_cache: true,
            smart_review: true,
            complexity_threshold: default_complexity_threshold(),
            fingerprint_sample_chars: default_fingerprint_sample_chars(),
        }
    }
}

/// Storage configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct StorageConfig {
    /// SQLite database file; the user data directory is used when unset
    #[serde(default)]
    pub database_path: Option<String>,

    /// Keep everything in memory (nothing survives the process)
    #[serde(default)]
    pub in_memory: bool,
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

/// Upper bound accepted for `translation.retry_count`
pub const MAX_RETRY_COUNT: u32 = 10;

/// Upper bound accepted for `translation.retry_multiplier`
pub const MAX_RETRY_MULTIPLIER: f64 = 10.0;

fn default_target_language() -> String {
    "SV".to_string()
}

fn default_owner() -> String {
    "local".to_string()
}

fn default_deepl_endpoint() -> String {
    "https://api-free.deepl.com".to_string()
}

fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000 // 1 second base backoff time, doubled on each retry
}

fn default_retry_multiplier() -> f64 {
    2.0
}

fn default_review_wait_secs() -> u64 {
    25
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_max_segment_chars() -> usize {
    4000
}

fn default_page_chars() -> usize {
    3000
}

fn default_concurrent_requests() -> usize {
    4
}

fn default_concurrent_documents() -> usize {
    2
}

fn default_complexity_threshold() -> f64 {
    40.0
}

fn default_fingerprint_sample_chars() -> usize {
    500
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Fill empty credentials from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Fill empty credentials from an arbitrary lookup
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let fill = |slot: &mut String, name: &str| {
            if slot.is_empty() {
                if let Some(value) = lookup(name).filter(|v| !v.trim().is_empty()) {
                    *slot = value.trim().to_string();
                }
            }
        };

        fill(&mut self.translation.api_key, "DEEPL_API_KEY");
        fill(&mut self.review.api_key, "OPENAI_API_KEY");
        fill(&mut self.review.assistant_id, "OPENAI_ASSISTANT_ID");
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        language_utils::normalize_target_code(&self.target_language).map_err(|e| {
            ConfigurationError::InvalidSetting {
                field: "target_language".to_string(),
                reason: e.to_string(),
            }
        })?;

        if self.translation.provider == TranslationProvider::DeepL {
            if self.translation.api_key.is_empty() {
                return Err(ConfigurationError::MissingCredential("DeepL API key".to_string()));
            }
            validate_endpoint("translation.endpoint", &self.translation.endpoint)?;
        }

        if self.translation.timeout_secs == 0 {
            return Err(invalid("translation.timeout_secs", "must be greater than zero"));
        }
        if !(1..=MAX_RETRY_COUNT).contains(&self.translation.retry_count) {
            return Err(invalid(
                "translation.retry_count",
                &format!("must be between 1 and {}", MAX_RETRY_COUNT),
            ));
        }
        let multiplier = self.translation.retry_multiplier;
        if !multiplier.is_finite() || !(1.0..=MAX_RETRY_MULTIPLIER).contains(&multiplier) {
            return Err(invalid(
                "translation.retry_multiplier",
                &format!("must be between 1.0 and {}", MAX_RETRY_MULTIPLIER),
            ));
        }
        if self.review.provider != ReviewProvider::Disabled && self.review.max_wait_secs == 0 {
            return Err(invalid("review.max_wait_secs", "must be greater than zero"));
        }

        if self.review.provider == ReviewProvider::OpenAI {
            if self.review.api_key.is_empty() {
                return Err(ConfigurationError::MissingCredential("OpenAI API key".to_string()));
            }
            if self.review.assistant_id.is_empty() {
                return Err(ConfigurationError::MissingEngineIdentifier(
                    "OpenAI assistant id".to_string(),
                ));
            }
            validate_endpoint("review.endpoint", &self.review.endpoint)?;
        }

        let pipeline = &self.pipeline;
        if pipeline.max_segment_chars == 0 {
            return Err(invalid("pipeline.max_segment_chars", "must be greater than zero"));
        }
        if pipeline.page_chars == 0 {
            return Err(invalid("pipeline.page_chars", "must be greater than zero"));
        }
        if pipeline.concurrent_requests == 0 || pipeline.concurrent_documents == 0 {
            return Err(invalid("pipeline.concurrent_requests", "concurrency must be at least 1"));
        }
        if pipeline.fingerprint_sample_chars == 0 {
            return Err(invalid("pipeline.fingerprint_sample_chars", "must be greater than zero"));
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> ConfigurationError {
    ConfigurationError::InvalidSetting {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_endpoint(field: &str, endpoint: &str) -> Result<(), ConfigurationError> {
    Url::parse(endpoint)
        .map(|_| ())
        .map_err(|e| invalid(field, &format!("'{}' is not a valid URL: {}", endpoint, e)))
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            target_language: default_target_language(),
            owner: default_owner(),
            translation: TranslationConfig::default(),
            review: ReviewConfig::default(),
            pipeline: PipelineConfig::default(),
            storage: StorageConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
