//! Tool backed by an external tool server.

use crate::executor::{Tool, ToolOutput};
use crate::session::{ServerToolDescriptor, ToolServerSession};
use crate::types::tool::ToolCallParams;
use crate::Result;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

/// One advertised server tool, bound to the shared session it was
/// discovered on. Name, description and parameter schema all come from the
/// server's listing.
pub struct ServerTool {
    session: Arc<Mutex<ToolServerSession>>,
    descriptor: ServerToolDescriptor,
}

impl ServerTool {
    pub fn new(session: Arc<Mutex<ToolServerSession>>, descriptor: ServerToolDescriptor) -> Self {
        Self { session, descriptor }
    }

    /// One [`ServerTool`] per tool the connected session advertises.
    pub async fn discover(session: Arc<Mutex<ToolServerSession>>) -> Result<Vec<ServerTool>> {
        let descriptors = session.lock().await.list_tools().await?;
        Ok(descriptors
            .into_iter()
            .map(|descriptor| ServerTool::new(session.clone(), descriptor))
            .collect())
    }
}

#[async_trait::async_trait]
impl Tool for ServerTool {
    fn name(&self) -> &str {
        &self.descriptor.name
    }

    fn description(&self) -> &str {
        &self.descriptor.description
    }

    fn parameters(&self) -> Value {
        self.descriptor.input_schema.clone()
    }

    async fn invoke(&self, params: &ToolCallParams) -> Result<ToolOutput> {
        let content = self
            .session
            .lock()
            .await
            .invoke_tool(&self.descriptor.name, params.call.arguments.clone())
            .await?;

        let text = match content {
            Some(content) => content.into_text()?,
            None => String::new(),
        };
        params.stage.append_content(&text);
        Ok(ToolOutput::Text(text))
    }
}
