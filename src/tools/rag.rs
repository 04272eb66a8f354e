//! Retrieval-augmented generation tool.
//!
//! Answers a request against a document: chunk, embed and index the
//! document (cached per conversation), retrieve the nearest chunks for the
//! request, and stream a completion restricted to that context.

use crate::client::{CompletionClient, CompletionRequest};
use crate::embeddings::Embedder;
use crate::executor::{Tool, ToolOutput};
use crate::extract::TextExtractor;
use crate::retrieval::{DocumentCache, DocumentEntry, FlatL2Index, RecursiveTextSplitter};
use crate::streaming::aggregate_stream;
use crate::types::message::ChatMessage;
use crate::types::tool::ToolCallParams;
use crate::Result;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

const SYSTEM_PROMPT: &str = "You are a helpful assistant that answers questions based on provided document context.

You will receive:
- CONTEXT: Retrieved relevant excerpts from a document
- REQUEST: The user's question or search query

Instructions:
- Answer the request using only the information in the provided context
- If the context doesn't contain enough information to answer, clearly state that
- Be concise and direct in your response";

const TOOL_NAME: &str = "rag_tool";

const TOOL_DESCRIPTION: &str = "Performs semantic search on documents to find and answer questions based on relevant content. \
Supports: PDF, TXT, CSV, HTML. \
Use this tool when user asks questions about document content, needs specific information from large files, \
or wants to search for particular topics/keywords. \
Don't use it when: user wants to read entire document sequentially. \
HOW IT WORKS: Splits document into chunks, finds top 3 most relevant sections using semantic search, \
then generates answer based only on those sections.";

#[derive(Debug, Deserialize)]
struct RagArguments {
    request: String,
    file_url: String,
}

pub struct RagTool {
    client: Arc<dyn CompletionClient>,
    deployment: String,
    embedder: Arc<dyn Embedder>,
    extractor: Arc<dyn TextExtractor>,
    cache: DocumentCache,
    splitter: RecursiveTextSplitter,
}

impl RagTool {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        deployment: impl Into<String>,
        embedder: Arc<dyn Embedder>,
        extractor: Arc<dyn TextExtractor>,
        cache: DocumentCache,
    ) -> Self {
        Self {
            client,
            deployment: deployment.into(),
            embedder,
            extractor,
            cache,
            splitter: RecursiveTextSplitter::default(),
        }
    }

    /// Build (or fetch) the document's index and chunks. `Ok(None)` means
    /// the document yielded no text.
    async fn document_entry(
        &self,
        params: &ToolCallParams,
        file_url: &str,
    ) -> Result<Option<Arc<DocumentEntry>>> {
        let key = DocumentCache::document_key(&params.conversation_id, file_url);
        if let Some(entry) = self.cache.get(&key) {
            return Ok(Some(entry));
        }

        let text = self.extractor.extract(file_url, &params.api_key).await?;
        if text.is_empty() {
            return Ok(None);
        }

        let chunks = self.splitter.split_text(&text);
        let vectors = self.embedder.embed_batch(&chunks).await?;
        let mut index = FlatL2Index::new(self.embedder.dimensions());
        index.add(vectors)?;
        Ok(Some(self.cache.insert(key, DocumentEntry { index, chunks })))
    }
}

#[async_trait::async_trait]
impl Tool for RagTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        TOOL_DESCRIPTION
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "request": {
                    "type": "string",
                    "description": "The search query or question to search for in the document"
                },
                "file_url": {
                    "type": "string",
                    "description": "File URL"
                },
            },
            "required": ["request", "file_url"],
        })
    }

    fn show_in_stage(&self) -> bool {
        false
    }

    async fn invoke(&self, params: &ToolCallParams) -> Result<ToolOutput> {
        let args: RagArguments = params.arguments()?;
        let stage = params.stage.as_ref();

        stage.append_content("## Request arguments: \n");
        stage.append_content(&format!("**Request**: {}\n", args.request));
        stage.append_content(&format!("**Document URL**: {}\n", args.file_url));

        let Some(entry) = self.document_entry(params, &args.file_url).await? else {
            // Missing content is informational, not a failure.
            stage.append_content("## Response: \n");
            let content = "Error: File content not found.";
            stage.append_content(&format!("{content}\n"));
            return Ok(ToolOutput::Text(content.to_string()));
        };

        let query = self.embedder.embed(&args.request).await?;
        let k = entry.chunks.len().min(3);
        let neighbors = entry.index.search(&query, k)?;
        let retrieved: Vec<&str> = neighbors
            .iter()
            .map(|neighbor| entry.chunks[neighbor.index].as_str())
            .collect();

        let augmented = augment(&args.request, &retrieved);
        stage.append_content("## RAG Request: \n");
        stage.append_content(&format!("```text\n{augmented}\n```\n"));
        stage.append_content("## Response: \n");

        let request = CompletionRequest::new(
            self.deployment.clone(),
            vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(augmented),
            ],
        );
        let stream = self.client.stream_chat(request, &params.api_key).await?;
        let completion = aggregate_stream(stream, stage).await?;
        Ok(ToolOutput::Text(completion.text))
    }
}

/// Combine retrieved chunks with the user's request.
fn augment(request: &str, chunks: &[&str]) -> String {
    format!(
        "CONTEXT:\n{}\n---\nREQUEST: {}",
        chunks.join("\n\n"),
        request
    )
}
