//! Screenshot acquisition and analysis
//!
//! A screenshot is taken from the primary source (browser-tools over HTTP).
//! When that fails the fallback source is tried; the native fallback is not
//! available yet and always fails, but the two-stage order is kept so a real
//! implementation can drop in. The acquired image is then handed to the
//! vision backend.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::{
    error::{AcquireError, AcquireResult, ScreenshotError, ScreenshotResult},
    vision::VisionAnalyzer,
};

pub mod browser_tools;
pub mod mock;
pub mod native;

pub use browser_tools::{BrowserToolsSource, SourceReply};
pub use mock::MockScreenshotSource;
pub use native::NativeSource;

/// A place screenshots can be obtained from
#[async_trait]
pub trait ScreenshotSource: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Obtains one screenshot as base64 image data
    async fn acquire(&self) -> AcquireResult<String>;
}

/// A captured screenshot and its analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedScreenshot {
    /// Raw image as base64
    pub image_base64: String,
    /// Text returned by the vision backend
    pub analysis:     String,
}

/// Captures screenshots and runs them through the vision backend
#[derive(Clone)]
pub struct ScreenshotClient {
    primary:  Arc<dyn ScreenshotSource>,
    fallback: Arc<dyn ScreenshotSource>,
    vision:   Arc<dyn VisionAnalyzer>,
}

impl ScreenshotClient {
    /// Creates a client from explicit sources
    pub fn new(
        primary: Arc<dyn ScreenshotSource>,
        fallback: Arc<dyn ScreenshotSource>,
        vision: Arc<dyn VisionAnalyzer>,
    ) -> Self {
        Self {
            primary,
            fallback,
            vision,
        }
    }

    /// Creates the production pairing: browser-tools first, native second
    pub fn with_browser_tools(
        browser_tools_url: &str,
        vision: Arc<dyn VisionAnalyzer>,
    ) -> AcquireResult<Self> {
        let primary = Arc::new(BrowserToolsSource::new(browser_tools_url)?);
        Ok(Self::new(primary, Arc::new(NativeSource::new()), vision))
    }

    /// Obtains a screenshot from the first source that delivers one
    pub async fn acquire(&self) -> ScreenshotResult<String> {
        info!("Attempting to capture screenshot");

        let primary = match self.primary.acquire().await {
            Ok(image) => {
                info!(source = self.primary.name(), "Captured screenshot");
                return Ok(image);
            }
            Err(e) => {
                warn!(source = self.primary.name(), error = %e, "Screenshot source failed");
                e
            }
        };

        let fallback = match self.fallback.acquire().await {
            Ok(image) => {
                info!(source = self.fallback.name(), "Captured screenshot with fallback source");
                return Ok(image);
            }
            Err(e) => {
                error!(source = self.fallback.name(), error = %e, "Fallback screenshot source failed");
                e
            }
        };

        Err(ScreenshotError::NoSourceAvailable { primary, fallback })
    }

    /// Captures a screenshot and analyzes it
    ///
    /// Returns both the raw image and the analysis; no partial result is
    /// produced on failure.
    pub async fn capture_and_analyze(
        &self,
        prompt: Option<&str>,
        model_hint: Option<&str>,
    ) -> ScreenshotResult<CapturedScreenshot> {
        let image_base64 = self.acquire().await?;
        let analysis = self
            .vision
            .analyze(&image_base64, prompt, model_hint)
            .await
            .map_err(ScreenshotError::Analysis)?;

        Ok(CapturedScreenshot {
            image_base64,
            analysis,
        })
    }
}

impl std::fmt::Debug for ScreenshotClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScreenshotClient")
            .field("primary", &self.primary.name())
            .field("fallback", &self.fallback.name())
            .finish_non_exhaustive()
    }
}

/// Convenience for sources that have nothing to offer
pub(crate) fn not_implemented(method: &str) -> AcquireError {
    AcquireError::NotImplemented {
        method: method.to_string(),
    }
}
