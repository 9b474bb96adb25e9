//! Mock screenshot source for testing
//!
//! `MockScreenshotSource` hands out a fixed image (by default a 1x1 PNG) or
//! a fixed error, optionally after a delay, and counts how often it was
//! asked.

use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use tokio::time::sleep;

use super::ScreenshotSource;
use crate::error::{AcquireError, AcquireResult};

/// 1x1 transparent PNG, base64
pub const MOCK_SCREENSHOT_PNG: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

/// Mock screenshot source
#[derive(Debug)]
pub struct MockScreenshotSource {
    outcome: AcquireResult<String>,
    delay:   Option<Duration>,
    calls:   AtomicUsize,
}

impl MockScreenshotSource {
    /// Creates a source returning [`MOCK_SCREENSHOT_PNG`]
    pub fn new() -> Self {
        Self::with_image(MOCK_SCREENSHOT_PNG)
    }

    /// Creates a source returning the given image
    pub fn with_image(image_base64: impl Into<String>) -> Self {
        Self {
            outcome: Ok(image_base64.into()),
            delay:   None,
            calls:   AtomicUsize::new(0),
        }
    }

    /// Creates a source that always fails with `error`
    pub fn failing(error: AcquireError) -> Self {
        Self {
            outcome: Err(error),
            delay:   None,
            calls:   AtomicUsize::new(0),
        }
    }

    /// Sleeps for `delay` before every answer
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of acquisitions attempted so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockScreenshotSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScreenshotSource for MockScreenshotSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn acquire(&self) -> AcquireResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            sleep(delay).await;
        }

        self.outcome.clone()
    }
}
