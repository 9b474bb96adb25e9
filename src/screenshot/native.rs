//! Native screenshot source
//!
//! Capturing the local display directly is not available in this build.
//! The source exists so the fallback stage of [`ScreenshotClient`] has a
//! concrete occupant; it always reports itself as unimplemented.
//!
//! [`ScreenshotClient`]: super::ScreenshotClient

use async_trait::async_trait;
use tracing::debug;

use super::{ScreenshotSource, not_implemented};
use crate::error::AcquireResult;

/// Fallback source for direct display capture
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeSource;

impl NativeSource {
    /// Creates the native source
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ScreenshotSource for NativeSource {
    fn name(&self) -> &str {
        "native"
    }

    async fn acquire(&self) -> AcquireResult<String> {
        debug!("Trying native screenshot capture");
        Err(not_implemented("Native"))
    }
}
