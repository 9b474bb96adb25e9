//! Claude Messages API vision client

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, error, info};

use super::{ImagePayload, VisionAnalyzer, prepare_image, resolve_prompt};
use crate::{
    config::{ENV_ANTHROPIC_API_KEY, VisionConfig},
    error::{VisionError, VisionResult},
};

/// API version header value
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Vision client backed by the Anthropic Messages API
///
/// The credential is supplied at construction; a client built without one
/// fails every analysis with [`VisionError::BackendFailure`].
#[derive(Debug, Clone)]
pub struct AnthropicVisionClient {
    http:   Client,
    config: VisionConfig,
}

impl AnthropicVisionClient {
    /// Creates a client with a default HTTP client
    pub fn new(config: VisionConfig) -> VisionResult<Self> {
        let http = Client::builder().build().map_err(|e| VisionError::Other {
            message: format!("failed to build HTTP client: {}", e),
        })?;
        Ok(Self::with_http_client(config, http))
    }

    /// Creates a client on top of an existing HTTP client
    pub fn with_http_client(config: VisionConfig, http: Client) -> Self {
        Self { http, config }
    }

    /// Endpoint that receives analysis requests
    pub fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.config.base_url)
    }

    /// Builds the JSON body for one analysis
    pub fn build_request_body(&self, image: &ImagePayload<'_>, prompt: &str) -> Value {
        json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "temperature": 0,
            "messages": [{
                "role": "user",
                "content": [
                    {
                        "type": "image",
                        "source": {
                            "type": "base64",
                            "media_type": image.media_type,
                            "data": image.data,
                        }
                    },
                    {
                        "type": "text",
                        "text": prompt
                    }
                ]
            }]
        })
    }
}

#[async_trait]
impl VisionAnalyzer for AnthropicVisionClient {
    async fn analyze(
        &self,
        image_base64: &str,
        prompt: Option<&str>,
        model_hint: Option<&str>,
    ) -> VisionResult<String> {
        let Some(api_key) = self.config.api_key.as_deref() else {
            return Err(VisionError::BackendFailure {
                message: format!("{} is not set", ENV_ANTHROPIC_API_KEY),
            });
        };

        if let Some(hint) = model_hint.filter(|hint| *hint != self.config.model) {
            debug!(hint, model = %self.config.model, "Model hint is advisory, using fixed model");
        }

        let prompt = resolve_prompt(prompt);
        let image = prepare_image(image_base64);
        let body = self.build_request_body(&image, prompt);

        info!(media_type = image.media_type, "Analyzing image with Claude Vision API");

        let response = self
            .http
            .post(self.messages_url())
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Vision API request failed");
                VisionError::Other {
                    message: e.to_string(),
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let err = error_from_response(status, &text);
            error!(status = status.as_u16(), error = %err, "Vision API returned an error");
            return Err(err);
        }

        let reply: MessagesResponse = response.json().await.map_err(|e| VisionError::Other {
            message: format!("invalid response body: {}", e),
        })?;

        let analysis = reply.joined_text();
        info!(chars = analysis.len(), "Image analysis complete");
        Ok(analysis)
    }
}

/// Maps a non-success backend reply to a [`VisionError`]
///
/// 429 keeps the structured body verbatim; everything else carries the
/// backend's `error.message` or "Unknown error".
pub fn error_from_response(status: StatusCode, body: &str) -> VisionError {
    let parsed: Option<Value> = serde_json::from_str(body).ok();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let body = match parsed {
            Some(value) => value.to_string(),
            None if !body.trim().is_empty() => body.trim().to_string(),
            None => "{}".to_string(),
        };
        return VisionError::RateLimited {
            status: status.as_u16(),
            body,
        };
    }

    let message = parsed
        .as_ref()
        .and_then(|value| value.pointer("/error/message"))
        .and_then(Value::as_str)
        .filter(|message| !message.is_empty())
        .map(|message| format!("{} {}", status.as_u16(), message))
        .unwrap_or_else(|| "Unknown error".to_string());

    VisionError::BackendFailure { message }
}

/// Successful Messages API reply
#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Unsupported,
}

impl MessagesResponse {
    fn joined_text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                ContentBlock::Unsupported => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
