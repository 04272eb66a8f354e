//! Concrete tool implementations.

pub mod deployment;
pub mod interpreter;
pub mod rag;
pub mod server;

pub use deployment::DeploymentTool;
pub use interpreter::{CodeInterpreterTool, ExecutionResult, ProducedFile};
pub use rag::RagTool;
pub use server::ServerTool;
