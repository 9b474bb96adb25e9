//! browser-tools screenshot source
//!
//! Fetches `GET <base>/takeScreenshot` and accepts the reply only when it
//! reports `success: true` and carries non-empty `screenshotBase64`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::ScreenshotSource;
use crate::error::{AcquireError, AcquireResult};

/// Upper bound on one screenshot request
pub const SCREENSHOT_TIMEOUT: Duration = Duration::from_secs(5);

/// Reason used when a reply has no usable image
const NO_SCREENSHOT_DATA: &str = "reply did not contain screenshot data";

/// Parsed reply of the screenshot endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceReply {
    /// Image data was delivered
    Success {
        /// Base64 image data
        image: String,
    },
    /// Anything else
    Failure {
        /// Why the reply was rejected
        reason: String,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReply {
    #[serde(default)]
    success:           Option<bool>,
    #[serde(default)]
    screenshot_base64: Option<String>,
    #[serde(default)]
    error:             Option<String>,
}

impl SourceReply {
    /// Classifies a reply body
    pub fn parse(body: &str) -> Self {
        let raw: RawReply = match serde_json::from_str(body) {
            Ok(raw) => raw,
            Err(e) => {
                return SourceReply::Failure {
                    reason: format!("invalid reply: {}", e),
                };
            }
        };

        match raw {
            RawReply {
                success: Some(true),
                screenshot_base64: Some(image),
                ..
            } if !image.is_empty() => SourceReply::Success { image },
            RawReply {
                error: Some(reason),
                ..
            } if !reason.is_empty() => SourceReply::Failure { reason },
            _ => SourceReply::Failure {
                reason: NO_SCREENSHOT_DATA.to_string(),
            },
        }
    }
}

/// Screenshot source backed by a browser-tools server
#[derive(Debug, Clone)]
pub struct BrowserToolsSource {
    http:     Client,
    endpoint: String,
    timeout:  Duration,
}

impl BrowserToolsSource {
    /// Creates a source for the given base URL
    pub fn new(base_url: &str) -> AcquireResult<Self> {
        let http = Client::builder().build().map_err(|e| AcquireError::Request {
            url:    base_url.to_string(),
            reason: format!("failed to build HTTP client: {}", e),
        })?;
        Ok(Self::with_http_client(base_url, http))
    }

    /// Creates a source on top of an existing HTTP client
    pub fn with_http_client(base_url: &str, http: Client) -> Self {
        Self {
            http,
            endpoint: format!("{}/takeScreenshot", base_url.trim_end_matches('/')),
            timeout: SCREENSHOT_TIMEOUT,
        }
    }

    /// Overrides the request bound
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Full URL that is fetched
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn transport_error(&self, e: reqwest::Error) -> AcquireError {
        if e.is_timeout() {
            AcquireError::Timeout {
                url:         self.endpoint.clone(),
                duration_ms: self.timeout.as_millis() as u64,
            }
        } else {
            AcquireError::Request {
                url:    self.endpoint.clone(),
                reason: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl ScreenshotSource for BrowserToolsSource {
    fn name(&self) -> &str {
        "browser-tools"
    }

    async fn acquire(&self) -> AcquireResult<String> {
        debug!(endpoint = %self.endpoint, "Requesting screenshot from browser-tools");

        let response = self
            .http
            .get(&self.endpoint)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AcquireError::UnexpectedStatus {
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        match SourceReply::parse(&body) {
            SourceReply::Success { image } => Ok(image),
            SourceReply::Failure { reason } => Err(AcquireError::Rejected { reason }),
        }
    }
}
