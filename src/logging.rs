//! Diagnostic logging to stderr
//!
//! stdout carries the protocol, so the subscriber always writes to stderr.

use std::borrow::Cow;

use anyhow::{Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{LogConfig, LogFormat};

/// Maximum number of characters of a protocol line echoed into the log
pub const LOG_PREVIEW_CHARS: usize = 100;

/// Filter used when `RUST_LOG` is not set
pub fn default_directive(config: &LogConfig) -> &'static str {
    if config.development {
        "vision_tools_mcp=debug"
    } else {
        "vision_tools_mcp=info"
    }
}

/// Installs the global tracing subscriber
///
/// Respects `RUST_LOG`; otherwise falls back to [`default_directive`].
pub fn init(config: &LogConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(config)));

    let builder = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_line_number(false);

    let installed = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    };

    installed.map_err(|e| anyhow!("failed to initialize logging: {}", e))
}

/// Shortens a line for logging, appending `...` when cut
pub fn preview(line: &str) -> Cow<'_, str> {
    match line.char_indices().nth(LOG_PREVIEW_CHARS) {
        Some((cut, _)) => Cow::Owned(format!("{}...", &line[..cut])),
        None => Cow::Borrowed(line),
    }
}
