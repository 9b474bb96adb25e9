//! Data models and type definitions for vision-tools-mcp
//!
//! This module defines the wire types of the line protocol:
//! - Requests and responses exchanged over stdin/stdout
//! - The fixed error-code convention
//! - Per-method parameter and result structures

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

/// Method name for image analysis
pub const ANALYZE_IMAGE: &str = "analyzeImage";

/// Method name for screenshot capture and analysis
pub const CAPTURE_SCREENSHOT: &str = "captureScreenshot";

/// Operations understood by the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Analyze caller-supplied image data
    AnalyzeImage,
    /// Capture a screenshot, then analyze it
    CaptureScreenshot,
}

impl Method {
    /// Looks up a method by its wire name
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            ANALYZE_IMAGE => Some(Method::AnalyzeImage),
            CAPTURE_SCREENSHOT => Some(Method::CaptureScreenshot),
            _ => None,
        }
    }

    /// Returns the wire name of the method
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::AnalyzeImage => ANALYZE_IMAGE,
            Method::CaptureScreenshot => CAPTURE_SCREENSHOT,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Response error codes (JSON-RPC numbering)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Input line is not valid JSON
    ParseError,
    /// `method` does not match a known operation
    MethodNotFound,
    /// Required parameter missing or malformed
    InvalidParams,
    /// Handler failed while processing
    InternalError,
}

impl ErrorCode {
    /// Numeric code written to the wire
    pub const fn code(self) -> i64 {
        match self {
            ErrorCode::ParseError => -32700,
            ErrorCode::MethodNotFound => -32601,
            ErrorCode::InvalidParams => -32602,
            ErrorCode::InternalError => -32603,
        }
    }
}

/// A decoded request line
///
/// Fields are kept loosely typed so that a request with an odd shape still
/// yields an `id` to echo and a `method` to report.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// Caller-chosen identifier, echoed verbatim (`null` when absent)
    pub id:     Value,
    /// Requested operation (`null` when absent)
    pub method: Value,
    /// Method parameters (`null` when absent)
    pub params: Value,
}

impl Request {
    /// Builds a request from any parsed JSON value
    ///
    /// Non-object values produce a request with every field set to `null`.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(mut map) => Self {
                id:     map.remove("id").unwrap_or(Value::Null),
                method: map.remove("method").unwrap_or(Value::Null),
                params: map.remove("params").unwrap_or(Value::Null),
            },
            _ => Self {
                id:     Value::Null,
                method: Value::Null,
                params: Value::Null,
            },
        }
    }

    /// Resolves the requested method, if it is a known one
    pub fn method(&self) -> Option<Method> {
        self.method.as_str().and_then(Method::parse)
    }

    /// Human-readable method name for error messages
    pub fn method_display(&self) -> String {
        match &self.method {
            Value::String(name) => name.clone(),
            other => other.to_string(),
        }
    }

    /// Decodes the parameters into a typed structure
    ///
    /// Absent or `null` params decode as `T::default()`.
    pub fn params<T>(&self) -> Result<T, serde_json::Error>
    where
        T: DeserializeOwned + Default,
    {
        if self.params.is_null() {
            Ok(T::default())
        } else {
            serde_json::from_value(self.params.clone())
        }
    }
}

/// Error object carried by a failed response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcError {
    /// Numeric error code
    pub code:    i64,
    /// Human-readable description
    pub message: String,
}

/// Either a result or an error, never both
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Successful result object
    Result(Value),
    /// Error object
    Error(RpcError),
}

/// A single response line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Identifier of the originating request (`null` if unknown)
    pub id:      Value,
    /// Result or error payload
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl Response {
    /// Creates a successful response
    ///
    /// A result that cannot be converted to JSON turns into an internal
    /// error response for the same id.
    pub fn success<T: Serialize>(id: Value, result: &T) -> Self {
        match serde_json::to_value(result) {
            Ok(value) => Self {
                id,
                outcome: Outcome::Result(value),
            },
            Err(e) => Self::failure(id, ErrorCode::InternalError, format!("Internal error: {}", e)),
        }
    }

    /// Creates an error response
    pub fn failure(id: Value, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            id,
            outcome: Outcome::Error(RpcError {
                code:    code.code(),
                message: message.into(),
            }),
        }
    }

    /// Returns the error object, if this is an error response
    pub fn error(&self) -> Option<&RpcError> {
        match &self.outcome {
            Outcome::Error(error) => Some(error),
            Outcome::Result(_) => None,
        }
    }

    /// Returns the result object, if this is a successful response
    pub fn result(&self) -> Option<&Value> {
        match &self.outcome {
            Outcome::Result(value) => Some(value),
            Outcome::Error(_) => None,
        }
    }
}

/// Parameters of `analyzeImage`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeImageParams {
    /// Base64 image data, optionally with a `data:` URI prefix (required)
    #[serde(default)]
    pub image_base64: Option<String>,
    /// Analysis prompt
    #[serde(default)]
    pub prompt:       Option<String>,
    /// Model hint (advisory)
    #[serde(default)]
    pub model:        Option<String>,
}

/// Parameters of `captureScreenshot`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureScreenshotParams {
    /// Analysis prompt
    #[serde(default)]
    pub prompt: Option<String>,
    /// Model hint (advisory)
    #[serde(default)]
    pub model:  Option<String>,
}

/// Result of `analyzeImage`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Text returned by the vision backend
    pub analysis: String,
}

/// Result of `captureScreenshot`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenshotResult {
    /// Captured image as base64
    pub screenshot_base64: String,
    /// Text returned by the vision backend
    pub analysis:          String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_method_parse() {
        assert_eq!(Method::parse("analyzeImage"), Some(Method::AnalyzeImage));
        assert_eq!(Method::parse("captureScreenshot"), Some(Method::CaptureScreenshot));
        assert_eq!(Method::parse("AnalyzeImage"), None);
        assert_eq!(Method::parse(""), None);
    }

    #[test]
    fn test_method_display() {
        assert_eq!(format!("{}", Method::AnalyzeImage), "analyzeImage");
        assert_eq!(Method::CaptureScreenshot.as_str(), "captureScreenshot");
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(ErrorCode::ParseError.code(), -32700);
        assert_eq!(ErrorCode::MethodNotFound.code(), -32601);
        assert_eq!(ErrorCode::InvalidParams.code(), -32602);
        assert_eq!(ErrorCode::InternalError.code(), -32603);
    }

    #[test]
    fn test_request_from_object() {
        let request = Request::from_value(json!({
            "id": 7,
            "method": "analyzeImage",
            "params": {"image_base64": "Zm9v"}
        }));

        assert_eq!(request.id, json!(7));
        assert_eq!(request.method(), Some(Method::AnalyzeImage));
        assert_eq!(request.params["image_base64"], "Zm9v");
    }

    #[test]
    fn test_request_from_non_object() {
        let request = Request::from_value(json!([1, 2, 3]));

        assert!(request.id.is_null());
        assert!(request.method.is_null());
        assert_eq!(request.method(), None);
        assert_eq!(request.method_display(), "null");
    }

    #[test]
    fn test_request_method_display_non_string() {
        let request = Request::from_value(json!({"id": 1, "method": 42}));
        assert_eq!(request.method_display(), "42");
        assert_eq!(request.method(), None);
    }

    #[test]
    fn test_request_params_default_when_absent() {
        let request = Request::from_value(json!({"id": 1, "method": "captureScreenshot"}));
        let params: CaptureScreenshotParams = request.params().unwrap();
        assert_eq!(params, CaptureScreenshotParams::default());
    }

    #[test]
    fn test_request_params_wrong_type() {
        let request = Request::from_value(json!({
            "method": "analyzeImage",
            "params": {"image_base64": 12}
        }));
        assert!(request.params::<AnalyzeImageParams>().is_err());
    }

    #[test]
    fn test_analyze_params_null_fields() {
        let params: AnalyzeImageParams =
            serde_json::from_value(json!({"image_base64": "Zm9v", "prompt": null})).unwrap();
        assert_eq!(params.image_base64.as_deref(), Some("Zm9v"));
        assert_eq!(params.prompt, None);
        assert_eq!(params.model, None);
    }

    #[test]
    fn test_success_response_serialization() {
        let response = Response::success(
            json!(1),
            &AnalysisResult {
                analysis: "A cat.".to_string(),
            },
        );

        let line = serde_json::to_string(&response).unwrap();
        assert_eq!(line, r#"{"id":1,"result":{"analysis":"A cat."}}"#);
    }

    #[test]
    fn test_error_response_serialization() {
        let response = Response::failure(Value::Null, ErrorCode::ParseError, "Parse error: boom");

        let line = serde_json::to_string(&response).unwrap();
        assert_eq!(line, r#"{"id":null,"error":{"code":-32700,"message":"Parse error: boom"}}"#);
    }

    #[test]
    fn test_screenshot_result_fields() {
        let response = Response::success(
            json!("req-2"),
            &ScreenshotResult {
                screenshot_base64: "iVBORw0KGgo=".to_string(),
                analysis:          "A browser window".to_string(),
            },
        );

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["id"], "req-2");
        assert_eq!(value["result"]["screenshot_base64"], "iVBORw0KGgo=");
        assert_eq!(value["result"]["analysis"], "A browser window");
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_response_deserialization() {
        let response: Response =
            serde_json::from_str(r#"{"id":3,"error":{"code":-32601,"message":"nope"}}"#).unwrap();

        assert_eq!(response.id, json!(3));
        let error = response.error().unwrap();
        assert_eq!(error.code, -32601);
        assert_eq!(error.message, "nope");
        assert!(response.result().is_none());
    }
}
