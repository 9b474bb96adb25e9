//! HTTP backend integration tests
//!
//! Runs the real vision and screenshot clients against a mockito server,
//! checking the requests they send and how they classify replies.

mod common;

use std::{net::TcpListener, sync::Arc, time::Duration};

use common::harness::{direct_http_client, dispatcher, run_lines};
use mockito::{Matcher, Server};
use serde_json::json;
use vision_tools_mcp::{
    config::VisionConfig,
    error::{AcquireError, VisionError},
    screenshot::{BrowserToolsSource, ScreenshotSource},
    vision::{AnthropicVisionClient, DEFAULT_PROMPT, VisionAnalyzer},
};

const TEXT_REPLY: &str = r#"{
    "id": "msg_01",
    "type": "message",
    "role": "assistant",
    "content": [
        {"type": "text", "text": "A cat"},
        {"type": "text", "text": "sitting on a mat."}
    ],
    "stop_reason": "end_turn"
}"#;

fn vision_client(base_url: &str) -> AnthropicVisionClient {
    let config = VisionConfig {
        api_key: Some("sk-test-key".to_string()),
        base_url: base_url.to_string(),
        ..VisionConfig::default()
    };
    AnthropicVisionClient::with_http_client(config, direct_http_client())
}

fn browser_tools(base_url: &str) -> BrowserToolsSource {
    BrowserToolsSource::with_http_client(base_url, direct_http_client())
}

#[tokio::test]
async fn test_vision_request_shape_and_text_join() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/messages")
        .match_header("x-api-key", "sk-test-key")
        .match_header("anthropic-version", "2023-06-01")
        .match_body(Matcher::Json(json!({
            "model": "claude-3-opus-20240229",
            "max_tokens": 1024,
            "temperature": 0,
            "messages": [{
                "role": "user",
                "content": [
                    {
                        "type": "image",
                        "source": {
                            "type": "base64",
                            "media_type": "image/png",
                            "data": "iVBORw0KGgoAAAAN"
                        }
                    },
                    {"type": "text", "text": DEFAULT_PROMPT}
                ]
            }]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(TEXT_REPLY)
        .expect(1)
        .create_async()
        .await;

    let analysis = vision_client(&server.url())
        .analyze("data:image/png;base64,iVBORw0KGgoAAAAN", None, Some("claude"))
        .await
        .expect("analysis should succeed");

    assert_eq!(analysis, "A cat\nsitting on a mat.");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_vision_reply_without_text_is_empty_string() {
    let mut server = Server::new_async().await;
    let _m = server
        .mock("POST", "/v1/messages")
        .match_body(Matcher::Regex("Anything\\?".to_string()))
        .with_status(200)
        .with_body(r#"{"content":[]}"#)
        .create_async()
        .await;

    let analysis = vision_client(&server.url())
        .analyze("Zm9v", Some("Anything?"), None)
        .await
        .unwrap();

    assert_eq!(analysis, "");
}

#[tokio::test]
async fn test_vision_rate_limit_is_not_retried() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/messages")
        .with_status(429)
        .with_body(
            r#"{"type":"error","error":{"type":"rate_limit_error","message":"Number of requests has exceeded your rate limit"}}"#,
        )
        .expect(1)
        .create_async()
        .await;

    let err = vision_client(&server.url())
        .analyze("Zm9v", None, None)
        .await
        .unwrap_err();

    match &err {
        VisionError::RateLimited { status, body } => {
            assert_eq!(*status, 429);
            assert!(body.contains("rate_limit_error"));
        }
        other => panic!("expected RateLimited, got {:?}", other),
    }
    assert!(err.to_string().starts_with("Claude API error: 429 "));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_vision_backend_failure_message() {
    let mut server = Server::new_async().await;
    let _m = server
        .mock("POST", "/v1/messages")
        .with_status(401)
        .with_body(
            r#"{"type":"error","error":{"type":"authentication_error","message":"invalid x-api-key"}}"#,
        )
        .create_async()
        .await;

    let err = vision_client(&server.url())
        .analyze("Zm9v", None, None)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        VisionError::BackendFailure {
            message: "401 invalid x-api-key".to_string(),
        }
    );
}

#[tokio::test]
async fn test_vision_unreadable_success_body() {
    let mut server = Server::new_async().await;
    let _m = server
        .mock("POST", "/v1/messages")
        .with_status(200)
        .with_body("not json")
        .create_async()
        .await;

    let err = vision_client(&server.url())
        .analyze("Zm9v", None, None)
        .await
        .unwrap_err();

    assert!(matches!(err, VisionError::Other { .. }));
}

#[tokio::test]
async fn test_browser_tools_success() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/takeScreenshot")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success":true,"screenshotBase64":"iVBORw0KGgo="}"#)
        .expect(1)
        .create_async()
        .await;

    let image = browser_tools(&server.url()).acquire().await.unwrap();

    assert_eq!(image, "iVBORw0KGgo=");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_browser_tools_rejected_reply() {
    let mut server = Server::new_async().await;
    let _m = server
        .mock("GET", "/takeScreenshot")
        .with_status(200)
        .with_body(r#"{"success":false}"#)
        .create_async()
        .await;

    let err = browser_tools(&server.url()).acquire().await.unwrap_err();
    assert!(matches!(err, AcquireError::Rejected { .. }));
}

#[tokio::test]
async fn test_browser_tools_http_error() {
    let mut server = Server::new_async().await;
    let _m = server
        .mock("GET", "/takeScreenshot")
        .with_status(500)
        .with_body("{}")
        .create_async()
        .await;

    let err = browser_tools(&server.url()).acquire().await.unwrap_err();
    assert_eq!(err, AcquireError::UnexpectedStatus { status: 500 });
}

#[tokio::test]
async fn test_browser_tools_timeout() {
    // Connections queue in the backlog but are never answered.
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind silent listener");
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let source = browser_tools(&base_url).with_timeout(Duration::from_millis(200));
    let err = source.acquire().await.unwrap_err();

    match err {
        AcquireError::Timeout { duration_ms, .. } => assert_eq!(duration_ms, 200),
        other => panic!("expected Timeout, got {:?}", other),
    }
    drop(listener);
}

#[tokio::test]
async fn test_full_capture_pipeline_over_http() {
    let mut screenshots = Server::new_async().await;
    let _screenshot = screenshots
        .mock("GET", "/takeScreenshot")
        .with_status(200)
        .with_body(r#"{"success":true,"screenshotBase64":"/9j/4AAQSkZJRgAB"}"#)
        .create_async()
        .await;

    let mut vision_server = Server::new_async().await;
    let analysis = vision_server
        .mock("POST", "/v1/messages")
        .match_body(Matcher::PartialJson(json!({
            "messages": [{
                "content": [
                    {
                        "type": "image",
                        "source": {"media_type": "image/jpeg", "data": "/9j/4AAQSkZJRgAB"}
                    },
                    {"type": "text", "text": "What is on screen?"}
                ]
            }]
        })))
        .with_status(200)
        .with_body(TEXT_REPLY)
        .expect(1)
        .create_async()
        .await;

    let vision: Arc<dyn VisionAnalyzer> = Arc::new(vision_client(&vision_server.url()));
    let dispatcher = dispatcher(vision, Arc::new(browser_tools(&screenshots.url())));

    let responses = run_lines(
        &dispatcher,
        &[r#"{"id":"cap","method":"captureScreenshot","params":{"prompt":"What is on screen?"}}"#],
    )
    .await;

    assert_eq!(
        responses[0],
        json!({
            "id": "cap",
            "result": {
                "screenshot_base64": "/9j/4AAQSkZJRgAB",
                "analysis": "A cat\nsitting on a mat."
            }
        })
    );
    analysis.assert_async().await;
}

#[tokio::test]
async fn test_rate_limit_surfaces_as_internal_error_response() {
    let mut vision_server = Server::new_async().await;
    let _m = vision_server
        .mock("POST", "/v1/messages")
        .with_status(429)
        .with_body(r#"{"type":"error","error":{"type":"rate_limit_error","message":"slow down"}}"#)
        .create_async()
        .await;

    let vision: Arc<dyn VisionAnalyzer> = Arc::new(vision_client(&vision_server.url()));
    let dispatcher = dispatcher(vision, Arc::new(browser_tools("http://127.0.0.1:1")));

    let responses = run_lines(
        &dispatcher,
        &[r#"{"id":1,"method":"analyzeImage","params":{"image_base64":"Zm9v"}}"#],
    )
    .await;

    assert_eq!(responses[0]["error"]["code"], -32603);
    let message = responses[0]["error"]["message"].as_str().unwrap();
    assert!(message.starts_with("Error analyzing image: Claude API error: 429"));
}
