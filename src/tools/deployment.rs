//! Tool backed by a remote model deployment.

use crate::client::{CompletionClient, CompletionRequest};
use crate::executor::{Tool, ToolOutput};
use crate::streaming::aggregate_stream;
use crate::types::message::ChatMessage;
use crate::types::tool::ToolCallParams;
use crate::{Error, Result};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Exposes one remote deployment as a tool: the `prompt` argument becomes
/// the user message, every other argument is forwarded to the deployment as
/// extra configuration, and the streamed reply (text plus attachments) is
/// the tool result.
pub struct DeploymentTool {
    client: Arc<dyn CompletionClient>,
    deployment: String,
    name: String,
    description: String,
    parameters: Value,
}

impl DeploymentTool {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        deployment: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Value,
    ) -> Self {
        Self {
            client,
            deployment: deployment.into(),
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

#[async_trait::async_trait]
impl Tool for DeploymentTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> Value {
        self.parameters.clone()
    }

    async fn invoke(&self, params: &ToolCallParams) -> Result<ToolOutput> {
        let mut arguments: Map<String, Value> = params.arguments()?;
        let prompt = arguments
            .remove("prompt")
            .and_then(|v| v.as_str().map(str::to_string))
            .ok_or_else(|| {
                Error::arguments(format!("`{}` requires a `prompt` argument", self.name))
            })?;

        let mut request =
            CompletionRequest::new(self.deployment.clone(), vec![ChatMessage::user(prompt)]);
        if !arguments.is_empty() {
            request = request.with_configuration(Value::Object(arguments));
        }

        let stream = self.client.stream_chat(request, &params.api_key).await?;
        let completion = aggregate_stream(stream, params.stage.as_ref()).await?;

        let message = ChatMessage::tool(&self.name, &params.call.id)
            .with_content(completion.text)
            .with_attachments(completion.attachments);
        Ok(ToolOutput::Message(message))
    }
}
