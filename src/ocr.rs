// 🛰️ OCR Client - cloud document analysis (submit, then poll)
// One request in flight per call; polling is bounded and cannot be cancelled

use crate::config::{Credentials, OcrSettings};
use crate::error::{Result, TipError};
use crate::table::Table;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
pub const OPERATION_LOCATION_HEADER: &str = "operation-location";

// ============================================================================
// WIRE TYPES
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResult {
    #[serde(default)]
    pub tables: Vec<Table>,

    /// Only counted; page content is not used
    #[serde(default)]
    pub pages: Vec<serde_json::Value>,
}

impl AnalyzeResult {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Body of a poll response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationStatus {
    pub status: String,

    #[serde(default)]
    pub error: Option<serde_json::Value>,

    #[serde(default)]
    pub analyze_result: Option<AnalyzeResult>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollState {
    Running,
    Succeeded(AnalyzeResult),
    Failed(String),
}

impl OperationStatus {
    /// Anything other than `succeeded` or `failed` counts as still running.
    pub fn into_state(self) -> PollState {
        match self.status.as_str() {
            "succeeded" => PollState::Succeeded(self.analyze_result.unwrap_or_default()),
            "failed" => PollState::Failed(failure_reason(self.error.as_ref())),
            _ => PollState::Running,
        }
    }
}

fn failure_reason(error: Option<&serde_json::Value>) -> String {
    match error {
        Some(serde_json::Value::String(s)) if !s.is_empty() => s.clone(),
        Some(value) => value
            .get("message")
            .and_then(|m| m.as_str())
            .map(String::from)
            .unwrap_or_else(|| value.to_string()),
        None => "Unknown error".to_string(),
    }
}

// ============================================================================
// POLLING
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl PollPolicy {
    pub fn from_settings(settings: &OcrSettings) -> Self {
        PollPolicy {
            max_attempts: settings.max_poll_attempts,
            interval: Duration::from_millis(settings.poll_interval_ms),
        }
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::from_settings(&OcrSettings::default())
    }
}

/// Wait, check, repeat, up to `max_attempts` checks.
///
/// A failed check ends polling with its error; there is no retry and no
/// partial result.
pub async fn poll_until_done<F, Fut>(policy: &PollPolicy, mut check: F) -> Result<AnalyzeResult>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<OperationStatus>>,
{
    for attempt in 1..=policy.max_attempts {
        tokio::time::sleep(policy.interval).await;

        match check(attempt).await?.into_state() {
            PollState::Succeeded(result) => {
                info!(attempt, tables = result.tables.len(), "analysis succeeded");
                return Ok(result);
            }
            PollState::Failed(reason) => {
                warn!(attempt, %reason, "analysis failed");
                return Err(TipError::UpstreamAnalysisFailed(reason));
            }
            PollState::Running => debug!(attempt, "analysis still running"),
        }
    }

    Err(TipError::PollingTimeout {
        attempts: policy.max_attempts,
    })
}

// ============================================================================
// ANALYZER
// ============================================================================

/// The external OCR collaborator: image bytes in, detected tables out.
#[async_trait]
pub trait DocumentAnalyzer: Send + Sync {
    async fn analyze(&self, image: Vec<u8>, mime_type: &str) -> Result<AnalyzeResult>;

    /// Model name reported in response metadata
    fn model(&self) -> &str;
}

/// Azure Document Intelligence, prebuilt layout model.
pub struct AzureLayoutClient {
    client: Client,
    credentials: Credentials,
    model: String,
    api_version: String,
    policy: PollPolicy,
}

impl AzureLayoutClient {
    pub fn new(credentials: Credentials, settings: &OcrSettings) -> Self {
        AzureLayoutClient {
            client: Client::new(),
            credentials,
            model: settings.model.clone(),
            api_version: settings.api_version.clone(),
            policy: PollPolicy::from_settings(settings),
        }
    }

    /// # Errors
    /// `Configuration` when endpoint or key is missing.
    pub fn from_settings(settings: &OcrSettings) -> Result<Self> {
        Ok(Self::new(settings.credentials()?, settings))
    }

    pub fn analyze_url(&self) -> String {
        format!(
            "{}/formrecognizer/documentModels/{}:analyze?api-version={}",
            self.credentials.endpoint, self.model, self.api_version
        )
    }

    /// POST the image; returns the polling URL.
    async fn submit(&self, image: Vec<u8>, mime_type: &str) -> Result<String> {
        let response = self
            .client
            .post(self.analyze_url())
            .header(CONTENT_TYPE, mime_type)
            .header(SUBSCRIPTION_KEY_HEADER, &self.credentials.api_key)
            .body(image)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(TipError::UpstreamRequestFailed { status, body });
        }

        response
            .headers()
            .get(OPERATION_LOCATION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .ok_or(TipError::MissingOperationLocation)
    }

    async fn fetch_status(&self, location: &str) -> Result<OperationStatus> {
        let response = self
            .client
            .get(location)
            .header(SUBSCRIPTION_KEY_HEADER, &self.credentials.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            return Err(TipError::UpstreamRequestFailed {
                status,
                body: format!("Polling failed with status {status}"),
            });
        }

        Ok(response.json::<OperationStatus>().await?)
    }
}

#[async_trait]
impl DocumentAnalyzer for AzureLayoutClient {
    async fn analyze(&self, image: Vec<u8>, mime_type: &str) -> Result<AnalyzeResult> {
        info!(bytes = image.len(), mime_type, model = %self.model, "submitting image for analysis");
        let location = self.submit(image, mime_type).await?;
        let location = location.as_str();

        poll_until_done(&self.policy, move |_| self.fetch_status(location)).await
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// TESTS
// ============================================================================
