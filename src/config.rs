//! Environment-driven server configuration
//!
//! Everything is read once at startup. Lookups go through an injectable
//! provider so tests can supply their own variables instead of touching the
//! process environment.

use std::env;

use crate::vision::{DEFAULT_MAX_TOKENS, DEFAULT_MODEL};

/// Default base URL of the browser-tools screenshot source
pub const DEFAULT_BROWSER_TOOLS_URL: &str = "http://localhost:3025";

/// Default base URL of the Anthropic API
pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";

/// Screenshot source base URL
pub const ENV_BROWSER_TOOLS_URL: &str = "BROWSER_TOOLS_URL";
/// Vision backend credential
pub const ENV_ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
/// Vision backend base URL
pub const ENV_ANTHROPIC_BASE_URL: &str = "ANTHROPIC_BASE_URL";
/// `development` turns on debug logging
pub const ENV_RUNTIME: &str = "VISION_TOOLS_ENV";
/// `json` switches log output to JSON lines
pub const ENV_LOG_FORMAT: &str = "VISION_TOOLS_LOG_FORMAT";

/// Output format of the stderr log
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Logging settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogConfig {
    /// Debug-level logging enabled
    pub development: bool,
    /// Output format
    pub format:      LogFormat,
}

/// Vision backend settings
#[derive(Clone, PartialEq, Eq)]
pub struct VisionConfig {
    /// API credential; calls fail when absent
    pub api_key:    Option<String>,
    /// Base URL without trailing slash
    pub base_url:   String,
    /// Backend model identifier
    pub model:      String,
    /// Response token cap
    pub max_tokens: u32,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            api_key:    None,
            base_url:   DEFAULT_ANTHROPIC_BASE_URL.to_string(),
            model:      DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

// Keeps the credential out of logs.
impl std::fmt::Debug for VisionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisionConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

/// Complete server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Screenshot source base URL without trailing slash
    pub browser_tools_url: String,
    /// Vision backend settings
    pub vision:            VisionConfig,
    /// Logging settings
    pub log:               LogConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            browser_tools_url: DEFAULT_BROWSER_TOOLS_URL.to_string(),
            vision:            VisionConfig::default(),
            log:               LogConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Reads the configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_env_with(|key| env::var(key).ok())
    }

    /// Reads the configuration through a custom variable provider
    ///
    /// Empty or whitespace-only values count as unset.
    pub fn from_env_with<F>(env_provider: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| {
            env_provider(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let browser_tools_url = lookup(ENV_BROWSER_TOOLS_URL)
            .map(|url| trim_base_url(&url))
            .unwrap_or_else(|| DEFAULT_BROWSER_TOOLS_URL.to_string());

        let vision = VisionConfig {
            api_key: lookup(ENV_ANTHROPIC_API_KEY),
            base_url: lookup(ENV_ANTHROPIC_BASE_URL)
                .map(|url| trim_base_url(&url))
                .unwrap_or_else(|| DEFAULT_ANTHROPIC_BASE_URL.to_string()),
            ..VisionConfig::default()
        };

        let log = LogConfig {
            development: lookup(ENV_RUNTIME)
                .is_some_and(|value| value.eq_ignore_ascii_case("development")),
            format:      match lookup(ENV_LOG_FORMAT) {
                Some(value) if value.eq_ignore_ascii_case("json") => LogFormat::Json,
                _ => LogFormat::Text,
            },
        };

        Self {
            browser_tools_url,
            vision,
            log,
        }
    }

    /// Full URL of the screenshot endpoint
    pub fn screenshot_endpoint(&self) -> String {
        format!("{}/takeScreenshot", self.browser_tools_url)
    }
}

fn trim_base_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}
