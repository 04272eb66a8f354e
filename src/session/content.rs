//! Typed views over tool server result content.

use crate::{Error, Result};
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tool as advertised by the server's listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerToolDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// JSON Schema describing the tool's input parameters.
    #[serde(default, rename = "inputSchema")]
    pub input_schema: Value,
}

/// First content item of a tool invocation result: textual content is
/// unwrapped, anything else stays an opaque structured value.
#[derive(Debug, Clone, PartialEq)]
pub enum InvocationContent {
    Text(String),
    Other(Value),
}

impl InvocationContent {
    /// Render the content as text for surfaces and tool results.
    pub fn into_text(self) -> Result<String> {
        match self {
            InvocationContent::Text(text) => Ok(text),
            InvocationContent::Other(value) => Ok(serde_json::to_string(&value)?),
        }
    }
}

pub(crate) fn decode_invocation_content(item: &Value) -> InvocationContent {
    if item.get("type").and_then(Value::as_str) == Some("text") {
        if let Some(text) = item.get("text").and_then(Value::as_str) {
            return InvocationContent::Text(text.to_string());
        }
    }
    InvocationContent::Other(item.clone())
}

/// Content of a resource read: text as-is, blobs decoded to raw bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceContent {
    Text(String),
    Binary(Vec<u8>),
}

pub(crate) fn decode_resource_content(uri: &str, item: &Value) -> Result<ResourceContent> {
    if let Some(text) = item.get("text").and_then(Value::as_str) {
        return Ok(ResourceContent::Text(text.to_string()));
    }
    if let Some(blob) = item.get("blob").and_then(Value::as_str) {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(blob)
            .map_err(|e| Error::content(format!("undecodable blob in resource {uri}: {e}")))?;
        return Ok(ResourceContent::Binary(bytes));
    }
    Err(Error::content(format!(
        "unexpected content type in resource {uri}"
    )))
}
