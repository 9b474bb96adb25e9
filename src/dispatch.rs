//! Request dispatcher for the line protocol
//!
//! Reads one JSON request per line, routes it by `method`, and writes
//! exactly one JSON response line per input line. Lines are
//! handled strictly one after another, so responses come out in input
//! order. A bad or failing request never stops the loop; only the end of
//! input does.

use std::{any::Any, panic::AssertUnwindSafe, sync::Arc};

use futures::FutureExt;
use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info, warn};

use crate::{
    error::VisionError,
    logging::preview,
    model::{
        AnalysisResult, AnalyzeImageParams, CaptureScreenshotParams, ErrorCode, Method, Request,
        Response, ScreenshotResult,
    },
    screenshot::ScreenshotClient,
    vision::VisionAnalyzer,
};

/// Routes protocol lines to the vision and screenshot handlers
#[derive(Clone)]
pub struct Dispatcher {
    vision:      Arc<dyn VisionAnalyzer>,
    screenshots: Arc<ScreenshotClient>,
}

impl Dispatcher {
    /// Creates a dispatcher over explicitly constructed clients
    pub fn new(vision: Arc<dyn VisionAnalyzer>, screenshots: Arc<ScreenshotClient>) -> Self {
        Self {
            vision,
            screenshots,
        }
    }

    /// Serves requests until `reader` reaches end of input
    ///
    /// Returns the number of responses written. Only I/O failures on the
    /// streams themselves end the loop early.
    pub async fn run<R, W>(&self, mut reader: R, mut writer: W) -> std::io::Result<u64>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut buf = Vec::new();
        let mut responses = 0u64;

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }

            let raw = trim_line_ending(&buf);
            let response = match std::str::from_utf8(raw) {
                Ok(line) => {
                    info!(line = %preview(line), "Received line");
                    let response = self.handle_line(line).await;
                    encode_response(&response, line)
                }
                Err(e) => {
                    warn!(error = %e, "Received line that is not valid UTF-8");
                    encode_response(
                        &Response::failure(
                            Value::Null,
                            ErrorCode::ParseError,
                            format!("Parse error: {}", e),
                        ),
                        "",
                    )
                }
            };

            debug!(response = %preview(&response), "Sending response");
            writer.write_all(response.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
            responses += 1;
        }

        info!(responses, "Input stream closed");
        Ok(responses)
    }

    /// Produces the response for one request line
    pub async fn handle_line(&self, line: &str) -> Response {
        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Failed to parse request line");
                return Response::failure(
                    Value::Null,
                    ErrorCode::ParseError,
                    format!("Parse error: {}", e),
                );
            }
        };

        let request = Request::from_value(value);
        let id = request.id.clone();

        match AssertUnwindSafe(self.route(request)).catch_unwind().await {
            Ok(response) => response,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(message = %message, "Handler panicked");
                Response::failure(id, ErrorCode::InternalError, format!("Internal error: {}", message))
            }
        }
    }

    async fn route(&self, request: Request) -> Response {
        let Some(method) = request.method() else {
            warn!(method = %request.method_display(), "Unknown method");
            return Response::failure(
                request.id.clone(),
                ErrorCode::MethodNotFound,
                format!("Method not found: {}", request.method_display()),
            );
        };

        debug!(%method, id = %request.id, "Dispatching request");
        match method {
            Method::AnalyzeImage => self.analyze_image(request).await,
            Method::CaptureScreenshot => self.capture_screenshot(request).await,
        }
    }

    async fn analyze_image(&self, request: Request) -> Response {
        let params: AnalyzeImageParams = match request.params() {
            Ok(params) => params,
            Err(e) => return invalid_params(request.id, e),
        };

        let Some(image) = params.image_base64.filter(|image| !image.is_empty()) else {
            let err = VisionError::MissingImage;
            return Response::failure(request.id, err.rpc_code(), err.to_string());
        };

        match self
            .vision
            .analyze(&image, params.prompt.as_deref(), params.model.as_deref())
            .await
        {
            Ok(analysis) => Response::success(request.id, &AnalysisResult { analysis }),
            Err(e) => {
                error!(
                    error = %e,
                    rate_limited = e.is_rate_limited(),
                    hint = e.remediation_hint(),
                    "Error in analyzeImage"
                );
                Response::failure(request.id, e.rpc_code(), format!("Error analyzing image: {}", e))
            }
        }
    }

    async fn capture_screenshot(&self, request: Request) -> Response {
        let params: CaptureScreenshotParams = match request.params() {
            Ok(params) => params,
            Err(e) => return invalid_params(request.id, e),
        };

        match self
            .screenshots
            .capture_and_analyze(params.prompt.as_deref(), params.model.as_deref())
            .await
        {
            Ok(captured) => Response::success(
                request.id,
                &ScreenshotResult {
                    screenshot_base64: captured.image_base64,
                    analysis:          captured.analysis,
                },
            ),
            Err(e) => {
                error!(error = %e, hint = e.remediation_hint(), "Error in captureScreenshot");
                Response::failure(
                    request.id,
                    e.rpc_code(),
                    format!("Error capturing screenshot: {}", e),
                )
            }
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("screenshots", &self.screenshots)
            .finish_non_exhaustive()
    }
}

fn invalid_params(id: Value, e: serde_json::Error) -> Response {
    warn!(error = %e, "Invalid params");
    Response::failure(id, ErrorCode::InvalidParams, format!("Invalid params: {}", e))
}

/// Serializes a response, falling back to an internal error line
///
/// The fallback re-reads the request line to recover its id.
fn encode_response(response: &Response, line: &str) -> String {
    serde_json::to_string(response).unwrap_or_else(|e| {
        error!(error = %e, "Failed to serialize response");
        json!({
            "id": recover_id(line),
            "error": {
                "code": ErrorCode::InternalError.code(),
                "message": format!("Internal error: {}", e),
            }
        })
        .to_string()
    })
}

/// Best-effort `id` of a request line; `null` when it cannot be parsed
pub fn recover_id(line: &str) -> Value {
    serde_json::from_str::<Value>(line)
        .ok()
        .and_then(|value| value.get("id").cloned())
        .unwrap_or(Value::Null)
}

fn trim_line_ending(buf: &[u8]) -> &[u8] {
    let buf = buf.strip_suffix(b"\n").unwrap_or(buf);
    buf.strip_suffix(b"\r").unwrap_or(buf)
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "Unknown error".to_string()
    }
}
