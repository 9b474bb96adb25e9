//! Dispatcher test harness
//!
//! Builds dispatchers over mock or HTTP-backed clients and drives them with
//! in-memory input, returning the parsed response lines.

#![allow(dead_code)]

use std::sync::Arc;

use serde_json::Value;
use vision_tools_mcp::{
    dispatch::Dispatcher,
    screenshot::{NativeSource, ScreenshotClient, ScreenshotSource},
    vision::VisionAnalyzer,
};

/// Builds a dispatcher with `primary` as the screenshot source and the
/// native source as fallback
pub fn dispatcher(vision: Arc<dyn VisionAnalyzer>, primary: Arc<dyn ScreenshotSource>) -> Dispatcher {
    let screenshots = Arc::new(ScreenshotClient::new(
        primary,
        Arc::new(NativeSource::new()),
        Arc::clone(&vision),
    ));
    Dispatcher::new(vision, screenshots)
}

/// Feeds `lines` (newline-joined) through the dispatcher
pub async fn run_lines(dispatcher: &Dispatcher, lines: &[&str]) -> Vec<Value> {
    let input = lines.join("\n") + "\n";
    let mut output = Vec::new();

    dispatcher
        .run(input.as_bytes(), &mut output)
        .await
        .expect("in-memory streams do not fail");

    String::from_utf8(output)
        .expect("responses are UTF-8")
        .lines()
        .map(|line| serde_json::from_str(line).expect("every response line is JSON"))
        .collect()
}

/// HTTP client that ignores proxy settings, for talking to local mock servers
pub fn direct_http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("build HTTP client")
}
