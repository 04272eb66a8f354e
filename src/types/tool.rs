//! Tool call types and the advertised function-call schema.

use crate::surface::{ChoiceSurface, Stage};
use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A model-issued request to invoke a named capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    /// Opaque structured argument payload; each tool deserializes its own
    /// typed view via [`ToolCallParams::arguments`].
    pub arguments: serde_json::Value,
}

/// Immutable per-invocation bundle handed to a tool.
///
/// Created once per tool call by the conversation loop and dropped after the
/// call returns; tools never mutate it.
#[derive(Clone)]
pub struct ToolCallParams {
    pub call: ToolCall,
    /// Caller credentials, forwarded to every backend touched by the call.
    pub api_key: String,
    pub conversation_id: String,
    /// Append-only progress surface shown to the user while the tool runs.
    pub stage: Arc<dyn Stage>,
    /// Side channel for attachments tied to the conversation turn.
    pub choice: Arc<dyn ChoiceSurface>,
}

impl ToolCallParams {
    /// Deserialize the call's argument payload into the tool's typed view.
    pub fn arguments<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.call.arguments.clone()).map_err(|e| {
            Error::arguments(format!("invalid arguments for `{}`: {e}", self.call.name))
        })
    }
}

impl std::fmt::Debug for ToolCallParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolCallParams")
            .field("call", &self.call)
            .field("conversation_id", &self.conversation_id)
            .finish_non_exhaustive()
    }
}

/// Function-call schema advertised to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    #[serde(rename = "type")]
    pub schema_type: String, // "function"
    pub function: FunctionSchema,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionSchema {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value, // JSON Schema
}

impl ToolSchema {
    pub fn function(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            schema_type: "function".to_string(),
            function: FunctionSchema {
                name: name.into(),
                description: description.into(),
                parameters,
            },
        }
    }
}
