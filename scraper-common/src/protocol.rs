//! Request and response bodies for the control-plane REST API.
//!
//! # Flow
//!
//! 1. Worker calls `register?customId=...` and receives a [`RegisterResponse`]
//! 2. Worker polls `getNextWorkItem` (see [`crate::WorkItemEnvelope`])
//! 3. While a work item runs, the worker posts `workItemProgress`
//! 4. Handlers push [`ScrapeTarget`]s, [`ScrapeRecord`]s, [`ScrapingError`]s
//!    and [`HealthCheckInfo`]
//! 5. Each work item ends with `workItemCompleted` or a [`WorkItemFailure`]

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::WorkItemId;

/// Response of the `register` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    /// Scraper configuration; absent when the custom id is unknown.
    #[serde(default)]
    pub scraper: Option<ScraperConfig>,
    /// Whether an operator finished configuring the scraper.
    #[serde(default)]
    pub configured: bool,
}

/// Scraper configuration stored by the control-plane.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScraperConfig {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub enabled: bool,
    /// Free-form settings interpreted by the concrete scraper.
    #[serde(default)]
    pub custom_settings: Map<String, Value>,
}

impl ScraperConfig {
    /// Look up a string custom setting.
    pub fn setting_str(&self, key: &str) -> Option<&str> {
        self.custom_settings.get(key).and_then(Value::as_str)
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!("expected string or number, got {}", other))),
    }
}

/// Discovered URL metadata sent to `receiveScraperTargets`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeTarget {
    pub source_id: String,
    pub metadata: Value,
}

/// Extracted content sent to `receiveScraperRecords`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeRecord {
    pub id: String,
    pub metadata: Value,
    /// Unix timestamp in seconds.
    pub created_on: f64,
    #[serde(default)]
    pub files: Vec<String>,
}

impl ScrapeRecord {
    /// Build a record stamped with the current time.
    pub fn new(id: impl Into<String>, metadata: Value) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: id.into(),
            metadata,
            created_on: now.timestamp_millis() as f64 / 1000.0,
            files: vec![],
        }
    }
}

/// A non-fatal problem found while scraping, sent to `receiveScrapingErrors`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapingError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub message: String,
}

/// Health of the scraped source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthState {
    Green,
    Amber,
    Red,
    /// Unknown.
    Grey,
}

/// Body of `receiveHealthcheckInfo`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckInfo {
    pub scraper_id: String,
    pub metadata: HealthCheckMetadata,
    pub state: HealthState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckMetadata {
    pub message: String,
}

impl HealthCheckInfo {
    pub fn new(scraper_id: impl Into<String>, state: HealthState, message: impl Into<String>) -> Self {
        Self {
            scraper_id: scraper_id.into(),
            metadata: HealthCheckMetadata {
                message: message.into(),
            },
            state,
        }
    }
}

/// Body of `workItemFailed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItemFailure {
    pub work_item_id: WorkItemId,
    pub msgs: Vec<FailureMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureMessage {
    pub msg: String,
    /// Rendered cause chain, one cause per line.
    #[serde(default)]
    pub stacktrace: Option<String>,
}

/// Body of `sendEmail`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailMessage {
    pub email_addresses_to: Vec<String>,
    pub subject: String,
    pub content: String,
}
