//! Code-execution tool backed by an external tool server.
//!
//! Invokes the server's execute-tool, transfers produced files into the
//! caller's storage namespace, and echoes a truncated execution summary to
//! the model.

use crate::executor::{Tool, ToolOutput};
use crate::session::{InvocationContent, ResourceContent, ToolServerSession};
use crate::storage::FileStorage;
use crate::types::message::Attachment;
use crate::types::tool::ToolCallParams;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Each output fragment is cut to this many characters before being
/// returned to the model.
const OUTPUT_FRAGMENT_LIMIT: usize = 200;

const FILES_INSTRUCTIONS: &str =
    "Generated files have been provided to the user, DON'T include links to them in response!";

/// Structured result of a code execution on the tool server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    #[serde(default)]
    pub output: Vec<String>,
    #[serde(default)]
    pub files: Vec<ProducedFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

/// A file produced by the execution, resolvable through the server's
/// resource-read interface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProducedFile {
    pub name: String,
    pub mime_type: String,
    pub uri: String,
}

#[derive(Debug, Deserialize)]
struct InterpreterArguments {
    code: String,
    #[serde(default)]
    session_id: Option<String>,
}

/// Code-execution tool. Advertises the schema of the named execute-tool on
/// the server; absence of that tool is a configuration error at startup.
pub struct CodeInterpreterTool {
    session: Arc<Mutex<ToolServerSession>>,
    descriptor: crate::session::ServerToolDescriptor,
    storage: Arc<dyn FileStorage>,
}

impl CodeInterpreterTool {
    pub async fn create(
        session: Arc<Mutex<ToolServerSession>>,
        tool_name: &str,
        storage: Arc<dyn FileStorage>,
    ) -> Result<Self> {
        let descriptors = session.lock().await.list_tools().await?;
        let descriptor = descriptors
            .into_iter()
            .find(|descriptor| descriptor.name == tool_name)
            .ok_or_else(|| {
                Error::configuration(format!(
                    "tool server does not expose a `{tool_name}` tool"
                ))
            })?;
        Ok(Self {
            session,
            descriptor,
            storage,
        })
    }

    async fn transfer_files(&self, result: &ExecutionResult, params: &ToolCallParams) -> Result<()> {
        let home = self.storage.appdata_home(&params.api_key).await?;
        for file in &result.files {
            let resource = self.session.lock().await.read_resource(&file.uri).await?;
            let data = file_bytes(resource, &file.mime_type)?;

            let url = format!("files/{}/{}", home, file.name);
            self.storage.upload(&url, data, &params.api_key).await?;

            let attachment = Attachment::file(url, file.mime_type.clone(), file.name.clone());
            params.stage.add_attachment(attachment.clone());
            params.choice.add_attachment(attachment);
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Tool for CodeInterpreterTool {
    fn name(&self) -> &str {
        &self.descriptor.name
    }

    fn description(&self) -> &str {
        &self.descriptor.description
    }

    fn parameters(&self) -> Value {
        self.descriptor.input_schema.clone()
    }

    fn show_in_stage(&self) -> bool {
        false
    }

    async fn invoke(&self, params: &ToolCallParams) -> Result<ToolOutput> {
        let args: InterpreterArguments = params.arguments()?;
        let stage = params.stage.as_ref();

        stage.append_content("## Request arguments: \n");
        stage.append_content(&format!("```python\n{}\n```\n", args.code));
        match &args.session_id {
            Some(session_id) => stage.append_content(&format!("**session_id**: {session_id}\n")),
            None => stage.append_content("New session will be created\n"),
        }
        stage.append_content("## Response: \n");

        let content = self
            .session
            .lock()
            .await
            .invoke_tool(&self.descriptor.name, params.call.arguments.clone())
            .await?;
        let raw = match content {
            Some(InvocationContent::Text(text)) => text,
            Some(InvocationContent::Other(value)) => serde_json::to_string(&value)?,
            None => {
                return Err(Error::content("tool server returned no execution result"));
            }
        };
        let mut result: ExecutionResult = serde_json::from_str(&raw)
            .map_err(|e| Error::protocol(format!("malformed execution result: {e}")))?;

        if !result.files.is_empty() {
            self.transfer_files(&result, params).await?;
            result.instructions = Some(FILES_INSTRUCTIONS.to_string());
        }

        result.output = result
            .output
            .into_iter()
            .map(|fragment| truncate_chars(fragment, OUTPUT_FRAGMENT_LIMIT))
            .collect();

        stage.append_content(&format!(
            "```json\n{}\n```\n",
            serde_json::to_string_pretty(&result)?
        ));
        Ok(ToolOutput::Text(serde_json::to_string(&result)?))
    }
}

/// Text-ish mimes arrive as UTF-8 resources; everything else is binary (or
/// base64 text that the caller must decode).
fn file_bytes(resource: ResourceContent, mime_type: &str) -> Result<Vec<u8>> {
    match resource {
        ResourceContent::Binary(bytes) => Ok(bytes),
        ResourceContent::Text(text) if is_textual_mime(mime_type) => Ok(text.into_bytes()),
        ResourceContent::Text(text) => {
            use base64::Engine as _;
            base64::engine::general_purpose::STANDARD
                .decode(text.as_bytes())
                .map_err(|e| Error::content(format!("undecodable file content: {e}")))
        }
    }
}

fn is_textual_mime(mime_type: &str) -> bool {
    mime_type.starts_with("text/")
        || matches!(mime_type, "application/json" | "application/xml")
}

fn truncate_chars(text: String, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text;
    }
    text.chars().take(limit).collect()
}
