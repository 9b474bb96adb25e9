//! Vision analysis clients
//!
//! This module provides:
//!
//! - `VisionAnalyzer`: trait for anything that turns an image and a prompt
//!   into text
//! - `AnthropicVisionClient`: the Claude Messages API implementation
//! - `MockVisionClient`: canned analyzer for tests and offline runs
//! - Helpers for prompt defaulting and image payload preparation

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};

use crate::error::VisionResult;

pub mod anthropic;
pub mod mock;

pub use anthropic::AnthropicVisionClient;
pub use mock::MockVisionClient;

/// Prompt used when the caller supplies none
pub const DEFAULT_PROMPT: &str = "What do you see in this image? Describe it in detail.";

/// Backend model every analysis runs against
pub const DEFAULT_MODEL: &str = "claude-3-opus-20240229";

/// Response token cap sent with every analysis
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Media type assumed when nothing else is known
pub const FALLBACK_MEDIA_TYPE: &str = "image/jpeg";

/// Core trait for vision backends
///
/// Implementations perform at most one backend call per `analyze` and never
/// retry.
#[async_trait]
pub trait VisionAnalyzer: Send + Sync {
    /// Analyzes base64 image data with a prompt
    ///
    /// # Arguments
    ///
    /// - `image_base64` - Image data, optionally prefixed with a
    ///   `data:image/<type>;base64,` URI header
    /// - `prompt` - Question about the image; `None` or blank selects
    ///   [`DEFAULT_PROMPT`]
    /// - `model_hint` - Advisory; does not change the backend model
    ///
    /// # Returns
    ///
    /// All text segments of the backend reply joined by newlines, or an empty
    /// string when the reply has none.
    async fn analyze(
        &self,
        image_base64: &str,
        prompt: Option<&str>,
        model_hint: Option<&str>,
    ) -> VisionResult<String>;
}

/// Returns the prompt to send, substituting the default for blank input
pub fn resolve_prompt(prompt: Option<&str>) -> &str {
    match prompt {
        Some(text) if !text.trim().is_empty() => text,
        _ => DEFAULT_PROMPT,
    }
}

/// Image data ready to be embedded in a backend request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload<'a> {
    /// MIME type announced to the backend
    pub media_type: &'static str,
    /// Bare base64 data
    pub data:       &'a str,
}

/// Strips a `data:image/<type>;base64,` header and settles the media type
///
/// The header's type wins when it names a supported format. Otherwise the
/// leading bytes are sniffed, and [`FALLBACK_MEDIA_TYPE`] is used when that
/// finds nothing either.
pub fn prepare_image(image_base64: &str) -> ImagePayload<'_> {
    let (declared, data) = match split_data_uri(image_base64) {
        Some((subtype, data)) => (supported_media_type(subtype), data),
        None => (None, image_base64),
    };

    let media_type = declared
        .or_else(|| sniff_media_type(data))
        .unwrap_or(FALLBACK_MEDIA_TYPE);

    ImagePayload { media_type, data }
}

fn split_data_uri(value: &str) -> Option<(&str, &str)> {
    let rest = value.strip_prefix("data:image/")?;
    let (subtype, data) = rest.split_once(";base64,")?;
    if subtype.is_empty() || !subtype.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    Some((subtype, data))
}

fn supported_media_type(subtype: &str) -> Option<&'static str> {
    match subtype.to_ascii_lowercase().as_str() {
        "jpeg" | "jpg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

fn sniff_media_type(data: &str) -> Option<&'static str> {
    let bytes = data.as_bytes();
    let len = bytes.len().min(16) / 4 * 4;
    let head = STANDARD.decode(&bytes[..len]).ok()?;

    if head.starts_with(&[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a]) {
        Some("image/png")
    } else if head.starts_with(&[0xff, 0xd8, 0xff]) {
        Some("image/jpeg")
    } else if head.starts_with(b"GIF87a") || head.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if head.len() >= 12 && head.starts_with(b"RIFF") && &head[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}
