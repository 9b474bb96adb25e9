//! Mock vision backend for testing
//!
//! `MockVisionClient` implements [`VisionAnalyzer`] without network access.
//! It returns a fixed analysis text, can simulate backend latency, can inject
//! an error, and records every call it receives.
//!
//! # Examples
//!
//! ```
//! use vision_tools_mcp::vision::{MockVisionClient, VisionAnalyzer};
//!
//! #[tokio::main]
//! async fn main() {
//!     let vision = MockVisionClient::with_text("A cat.");
//!     let analysis = vision.analyze("Zm9v", None, None).await.unwrap();
//!     assert_eq!(analysis, "A cat.");
//!     assert_eq!(vision.call_count().await, 1);
//! }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use tokio::{sync::Mutex, time::sleep};

use super::{VisionAnalyzer, resolve_prompt};
use crate::error::{VisionError, VisionResult};

/// Text returned by [`MockVisionClient::new`]
pub const MOCK_ANALYSIS: &str = "Mock analysis: a synthetic test image.";

/// One recorded `analyze` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzeCall {
    /// Image data as received
    pub image_base64: String,
    /// Prompt after defaulting
    pub prompt:       String,
    /// Model hint as received
    pub model_hint:   Option<String>,
}

/// Mock vision backend
#[derive(Debug)]
pub struct MockVisionClient {
    /// Text returned on success
    text:            String,
    /// Optional delay before answering
    delay:           Option<Duration>,
    /// Optional error returned instead of text
    error_injection: Option<VisionError>,
    /// Calls received so far
    calls:           Mutex<Vec<AnalyzeCall>>,
}

impl MockVisionClient {
    /// Creates a mock returning [`MOCK_ANALYSIS`]
    pub fn new() -> Self {
        Self::with_text(MOCK_ANALYSIS)
    }

    /// Creates a mock returning the given text
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text:            text.into(),
            delay:           None,
            error_injection: None,
            calls:           Mutex::new(Vec::new()),
        }
    }

    /// Sleeps for `delay` before every answer
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fails every call with `error`
    pub fn with_error(mut self, error: VisionError) -> Self {
        self.error_injection = Some(error);
        self
    }

    /// Returns all calls received so far
    pub async fn calls(&self) -> Vec<AnalyzeCall> {
        self.calls.lock().await.clone()
    }

    /// Number of calls received so far
    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }
}

impl Default for MockVisionClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VisionAnalyzer for MockVisionClient {
    async fn analyze(
        &self,
        image_base64: &str,
        prompt: Option<&str>,
        model_hint: Option<&str>,
    ) -> VisionResult<String> {
        self.calls.lock().await.push(AnalyzeCall {
            image_base64: image_base64.to_string(),
            prompt:       resolve_prompt(prompt).to_string(),
            model_hint:   model_hint.map(str::to_string),
        });

        if let Some(delay) = self.delay {
            sleep(delay).await;
        }

        match &self.error_injection {
            Some(error) => Err(error.clone()),
            None => Ok(self.text.clone()),
        }
    }
}
