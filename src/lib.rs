//! vision-tools-mcp: image and screenshot analysis over a line protocol
//!
//! This library provides a newline-delimited JSON-RPC server that forwards
//! images to a multimodal vision backend (Claude) and can fetch screenshots
//! from a local browser-tools server before analyzing them.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod model;
pub mod screenshot;
pub mod vision;
