//! vision-tools-mcp: image and screenshot analysis server
//!
//! Speaks newline-delimited JSON on stdin/stdout; diagnostics go to stderr.

use std::sync::Arc;

use anyhow::Result;
use tokio::io::{BufReader, stdin, stdout};
use tracing::{info, warn};
use vision_tools_mcp::{
    config::ServerConfig,
    dispatch::Dispatcher,
    logging,
    screenshot::ScreenshotClient,
    vision::{AnthropicVisionClient, VisionAnalyzer},
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let config = ServerConfig::from_env();
    logging::init(&config.log)?;

    info!("vision-tools-mcp server starting...");
    info!("Transport: stdio (newline-delimited JSON)");
    info!(screenshot_endpoint = %config.screenshot_endpoint(), "Screenshot source configured");

    if config.vision.api_key.is_none() {
        warn!("ANTHROPIC_API_KEY is not set; analysis requests will fail until it is provided");
    }

    let vision: Arc<dyn VisionAnalyzer> = Arc::new(AnthropicVisionClient::new(config.vision.clone())?);
    info!(model = %config.vision.model, "Vision backend initialized");

    let screenshots =
        Arc::new(ScreenshotClient::with_browser_tools(&config.browser_tools_url, Arc::clone(&vision))?);

    let dispatcher = Dispatcher::new(vision, screenshots);
    info!("Waiting for requests...");

    let responses = dispatcher.run(BufReader::new(stdin()), stdout()).await?;

    info!(responses, "Exiting.");
    Ok(())
}
