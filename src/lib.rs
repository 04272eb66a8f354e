//! # agent-tools-rust
//!
//! 这是会话代理的工具执行层：将模型发起的工具调用分发到不同后端并把结果转换为聊天消息。
//!
//! Tool Execution Runtime for conversational agents - dispatches model-issued
//! tool calls to one of several backends (a remote model deployment, an
//! external tool server, a local retrieval pipeline), executes them, and
//! converts the result into a chat message the conversation can consume.
//!
//! ## Overview
//!
//! The runtime is built around four cores:
//!
//! - **Execution contract**: every tool honors one wrapper that normalizes
//!   results and errors into a tool-role chat message, so a failing tool
//!   never aborts the conversation.
//! - **Tool server session**: a connect/handshake/ping lifecycle over a
//!   bidirectional transport, with list-tools, call-tool and read-resource
//!   operations and best-effort teardown.
//! - **Streaming aggregation**: shared consumption of incremental completion
//!   responses, forwarding deltas to the progress surface while accumulating
//!   the final text and attachments.
//! - **Retrieval pipeline**: document chunking, embedding, a flat L2 vector
//!   index and a per-conversation document cache feeding a second model call.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use agent_tools_rust::executor::{Tool, ToolRegistry};
//! use agent_tools_rust::surface::{RecordingChoice, RecordingStage};
//! use agent_tools_rust::types::tool::{ToolCall, ToolCallParams};
//!
//! # async fn run(registry: ToolRegistry) -> agent_tools_rust::Result<()> {
//! let params = ToolCallParams {
//!     call: ToolCall {
//!         id: "call_1".into(),
//!         name: "rag_tool".into(),
//!         arguments: serde_json::json!({
//!             "request": "What is Paris known for?",
//!             "file_url": "files/bucket/guide.txt",
//!         }),
//!     },
//!     api_key: "user-key".into(),
//!     conversation_id: "conv-42".into(),
//!     stage: Arc::new(RecordingStage::new()),
//!     choice: Arc::new(RecordingChoice::new()),
//! };
//!
//! let tool = registry.get(&params.call.name).expect("unknown tool");
//! let message = tool.execute(&params).await; // never fails
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`executor`] | Tool capability trait, execution contract, registry |
//! | [`session`] | External tool server session and its transport |
//! | [`streaming`] | Streaming response aggregation |
//! | [`retrieval`] | Text splitting, vector index, document cache |
//! | [`tools`] | Concrete tools (deployment, server, interpreter, RAG) |
//! | [`client`] | Chat-completion backend boundary |
//! | [`embeddings`] | Embedding backend boundary |
//! | [`extract`] | Document text extraction |
//! | [`storage`] | File storage backend boundary |
//! | [`surface`] | Stage and choice attachment surfaces |
//! | [`types`] | Core type definitions (messages, tool calls, schemas) |

pub mod client;
pub mod config;
pub mod embeddings;
pub mod executor;
pub mod extract;
pub mod retrieval;
pub mod session;
pub mod storage;
pub mod streaming;
pub mod surface;
pub mod tools;
pub mod types;

/// Error type for the library
pub mod error;
pub use error::Error;

// Re-export main types for convenience
pub use executor::{Tool, ToolOutput, ToolRegistry};
pub use session::ToolServerSession;
pub use streaming::{aggregate_stream, StreamedCompletion};
pub use types::{
    message::{Attachment, ChatMessage, MessageRole},
    tool::{ToolCall, ToolCallParams, ToolSchema},
};

use futures::Stream;
use std::pin::Pin;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// A unified pinned, boxed stream that emits `Result<T>`
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = Result<T>> + Send + 'a>>;

/// Minimal prelude for application code.
pub mod prelude {
    pub use crate::client::{CompletionClient, CompletionRequest};
    pub use crate::executor::{Tool, ToolOutput, ToolRegistry};
    pub use crate::session::ToolServerSession;
    pub use crate::surface::{ChoiceSurface, Stage};
    pub use crate::types::message::{Attachment, ChatMessage, MessageRole};
    pub use crate::types::tool::{ToolCall, ToolCallParams};
    pub use crate::{Error, Result};
}
