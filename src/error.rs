//! Error types for vision analysis and screenshot acquisition
//!
//! Each component has its own error enum. The dispatcher inspects these via
//! `rpc_code()` to pick the response error code, and logs
//! `remediation_hint()` next to the failure.

use crate::model::ErrorCode;

/// Result type alias for vision backend calls
pub type VisionResult<T> = Result<T, VisionError>;

/// Result type alias for a single screenshot source
pub type AcquireResult<T> = Result<T, AcquireError>;

/// Result type alias for capture-and-analyze
pub type ScreenshotResult<T> = Result<T, ScreenshotError>;

/// Failure of the vision backend
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VisionError {
    /// No image data was supplied
    #[error("Missing required parameter: image_base64")]
    MissingImage,

    /// Backend rejected the call for rate or quota reasons
    #[error("Claude API error: {status} {body}")]
    RateLimited {
        /// HTTP status reported by the backend
        status: u16,
        /// Structured error body, verbatim
        body:   String,
    },

    /// Backend answered with a non-success status
    #[error("Failed to analyze image: {message}")]
    BackendFailure {
        /// Backend message, or "Unknown error"
        message: String,
    },

    /// Transport or decoding failure
    #[error("Failed to analyze image: {message}")]
    Other {
        /// Description of the failure
        message: String,
    },
}

impl VisionError {
    /// Response code the dispatcher uses for this error
    pub fn rpc_code(&self) -> ErrorCode {
        match self {
            VisionError::MissingImage => ErrorCode::InvalidParams,
            VisionError::RateLimited { .. }
            | VisionError::BackendFailure { .. }
            | VisionError::Other { .. } => ErrorCode::InternalError,
        }
    }

    /// Returns true for rate-limit or quota failures
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, VisionError::RateLimited { .. })
    }

    /// Returns an actionable hint for operators reading the logs
    pub fn remediation_hint(&self) -> &str {
        match self {
            VisionError::MissingImage => {
                "Send the image as base64 in params.image_base64 (a data: URI prefix is accepted)."
            }
            VisionError::RateLimited { .. } => {
                "The vision backend is rate limiting this API key. Wait before resending the \
                 request or raise the account's rate limits."
            }
            VisionError::BackendFailure { .. } => {
                "Check that ANTHROPIC_API_KEY is set and valid and that the image is a supported \
                 JPEG, PNG, GIF or WebP."
            }
            VisionError::Other { .. } => {
                "The vision backend could not be reached or returned an unreadable reply. Check \
                 network connectivity and ANTHROPIC_BASE_URL."
            }
        }
    }
}

/// Failure of a single screenshot source
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AcquireError {
    /// Source did not answer within the bound
    #[error("Request to {url} timed out after {duration_ms}ms")]
    Timeout {
        /// Endpoint that was called
        url:         String,
        /// Timeout that elapsed
        duration_ms: u64,
    },

    /// Source could not be reached or its reply could not be read
    #[error("Request to {url} failed: {reason}")]
    Request {
        /// Endpoint that was called
        url:    String,
        /// Underlying transport error
        reason: String,
    },

    /// Source answered with a non-success HTTP status
    #[error("Screenshot source returned HTTP {status}")]
    UnexpectedStatus {
        /// HTTP status code
        status: u16,
    },

    /// Source answered but did not deliver image data
    #[error("Failed to get screenshot data from browser-tools: {reason}")]
    Rejected {
        /// Why the reply was not accepted
        reason: String,
    },

    /// Acquisition method is not available in this build
    #[error("{method} screenshot capture not implemented")]
    NotImplemented {
        /// Name of the acquisition method
        method: String,
    },
}

/// Failure of capture-and-analyze
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScreenshotError {
    /// Every acquisition path failed
    #[error(
        "Screenshot capture failed: Failed to capture screenshot using any available method \
         (primary: {primary}; fallback: {fallback})"
    )]
    NoSourceAvailable {
        /// Error of the primary source
        primary:  AcquireError,
        /// Error of the fallback source
        fallback: AcquireError,
    },

    /// A screenshot was acquired but its analysis failed
    #[error("Screenshot capture failed: {0}")]
    Analysis(#[from] VisionError),
}

impl ScreenshotError {
    /// Response code the dispatcher uses for this error
    pub fn rpc_code(&self) -> ErrorCode {
        ErrorCode::InternalError
    }

    /// Returns an actionable hint for operators reading the logs
    pub fn remediation_hint(&self) -> &str {
        match self {
            ScreenshotError::NoSourceAvailable { .. } => {
                "Start the browser-tools server and make sure BROWSER_TOOLS_URL points at it \
                 (default http://localhost:3025)."
            }
            ScreenshotError::Analysis(inner) => inner.remediation_hint(),
        }
    }
}
