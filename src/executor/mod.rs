//! Tool capability trait, the uniform execution contract, and the registry.
//!
//! Every concrete tool implements [`Tool::invoke`]; the provided
//! [`Tool::execute`] wrapper is the contract the conversation loop relies
//! on: it always returns a well-formed tool-role message correlated to the
//! originating call, and never propagates an error.

use crate::types::message::ChatMessage;
use crate::types::tool::{ToolCallParams, ToolSchema};
use crate::Result;
use std::collections::HashMap;
use std::sync::Arc;

/// What a tool's core logic returns: plain text, or a fully-formed message
/// (used when the tool needs to attach custom content).
#[derive(Debug, Clone)]
pub enum ToolOutput {
    Text(String),
    Message(ChatMessage),
}

impl From<String> for ToolOutput {
    fn from(text: String) -> Self {
        ToolOutput::Text(text)
    }
}

/// A named capability the model can invoke.
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Stable tool name advertised to the model.
    fn name(&self) -> &str;

    /// Description suitable for model consumption.
    fn description(&self) -> &str;

    /// JSON Schema of the tool's arguments.
    fn parameters(&self) -> serde_json::Value;

    /// Whether the tool's raw output is echoed to the user-visible stage.
    fn show_in_stage(&self) -> bool {
        true
    }

    /// The tool's core logic. Errors raised here are contained by
    /// [`execute`](Tool::execute).
    async fn invoke(&self, params: &ToolCallParams) -> Result<ToolOutput>;

    /// Uniform execution contract: normalize the result or the failure into
    /// a tool-role chat message. Never fails.
    async fn execute(&self, params: &ToolCallParams) -> ChatMessage {
        match self.invoke(params).await {
            // A structured message is used verbatim; its correlation fields
            // are authoritative.
            Ok(ToolOutput::Message(message)) => message,
            Ok(ToolOutput::Text(text)) => {
                ChatMessage::tool(self.name(), &params.call.id).with_content(text)
            }
            Err(error) => ChatMessage::tool(self.name(), &params.call.id)
                .with_content(format!("ERROR during tool call execution:\n {error}")),
        }
    }

    /// The function-call schema advertised to the model.
    fn schema(&self) -> ToolSchema {
        ToolSchema::function(self.name(), self.description(), self.parameters())
    }
}

/// Closed set of tools selected by name.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under its own name; a later registration under the
    /// same name replaces the earlier one.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Advertised schemas of every registered tool.
    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.tools.values().map(|tool| tool.schema()).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
