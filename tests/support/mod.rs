//! Shared fixtures for the integration suites: a scripted tool-server
//! transport, deterministic retrieval collaborators and recording stubs for
//! the HTTP boundaries.

#![allow(dead_code)]

use agent_tools_rust::client::{
    ChatChunk, ChunkChoice, ChunkStream, CompletionClient, CompletionRequest, CustomContent,
    MessageDelta,
};
use agent_tools_rust::embeddings::Embedder;
use agent_tools_rust::extract::TextExtractor;
use agent_tools_rust::session::{Connector, Transport};
use agent_tools_rust::storage::{DownloadedFile, FileStorage};
use agent_tools_rust::surface::{RecordingChoice, RecordingStage};
use agent_tools_rust::types::message::Attachment;
use agent_tools_rust::types::tool::{ToolCall, ToolCallParams};
use agent_tools_rust::{Error, Result};
use futures::stream;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Call counters shared between a scripted transport and the test body.
#[derive(Default)]
pub struct TransportLog {
    pub requests: Mutex<Vec<String>>,
    pub end_session_calls: AtomicUsize,
    pub close_calls: AtomicUsize,
}

impl TransportLog {
    pub fn method_count(&self, method: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.as_str() == method)
            .count()
    }
}

/// In-memory transport answering JSON-RPC methods from a response table.
///
/// Methods without an entry succeed with an empty result; an entry mapped to
/// an error value is returned as a JSON-RPC error response.
pub struct ScriptedTransport {
    responses: HashMap<String, Value>,
    log: Arc<TransportLog>,
    fail_teardown: bool,
}

#[async_trait::async_trait]
impl Transport for ScriptedTransport {
    async fn exchange(&mut self, message: Value) -> Result<Option<Value>> {
        let method = message["method"].as_str().unwrap_or_default().to_string();
        self.log.requests.lock().unwrap().push(method.clone());
        if message.get("id").is_none() {
            return Ok(None);
        }
        let id = message["id"].clone();
        match self.responses.get(&method) {
            Some(Value::String(s)) if s == "__fail__" => {
                Err(Error::protocol(format!("`{method}` scripted to fail")))
            }
            Some(result) => Ok(Some(json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": result,
            }))),
            None => Ok(Some(json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": {},
            }))),
        }
    }

    async fn end_session(&mut self) -> Result<()> {
        self.log.end_session_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_teardown {
            return Err(Error::protocol("end_session scripted to fail"));
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.log.close_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_teardown {
            return Err(Error::protocol("close scripted to fail"));
        }
        Ok(())
    }
}

/// Connector handing out [`ScriptedTransport`]s over one shared log.
pub struct ScriptedConnector {
    responses: HashMap<String, Value>,
    log: Arc<TransportLog>,
    fail_teardown: bool,
}

impl ScriptedConnector {
    pub fn new() -> Self {
        Self {
            responses: HashMap::new(),
            log: Arc::new(TransportLog::default()),
            fail_teardown: false,
        }
    }

    /// Script `method` to answer with `result`.
    pub fn respond(mut self, method: &str, result: Value) -> Self {
        self.responses.insert(method.to_string(), result);
        self
    }

    /// Script `method` to answer with a JSON-RPC error.
    pub fn fail(mut self, method: &str) -> Self {
        self.responses
            .insert(method.to_string(), Value::String("__fail__".into()));
        self
    }

    /// Make both teardown steps fail.
    pub fn fail_teardown(mut self) -> Self {
        self.fail_teardown = true;
        self
    }

    pub fn log(&self) -> Arc<TransportLog> {
        self.log.clone()
    }
}

#[async_trait::async_trait]
impl Connector for ScriptedConnector {
    async fn connect(&self, _url: &str) -> Result<Box<dyn Transport>> {
        Ok(Box::new(ScriptedTransport {
            responses: self.responses.clone(),
            log: self.log.clone(),
            fail_teardown: self.fail_teardown,
        }))
    }
}

/// Deterministic embedder: a unit-normalized bag-of-words over hash
/// buckets, so lexically-overlapping texts land close in the index.
pub struct BagOfWordsEmbedder {
    dimensions: usize,
    pub batch_calls: AtomicUsize,
}

impl BagOfWordsEmbedder {
    pub fn new() -> Self {
        Self {
            dimensions: 16,
            batch_calls: AtomicUsize::new(0),
        }
    }

    fn vector(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let bucket: usize = word
                .to_ascii_lowercase()
                .bytes()
                .fold(0usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize))
                % self.dimensions;
            vector[bucket] += 1.0;
        }
        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

#[async_trait::async_trait]
impl Embedder for BagOfWordsEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }
}

/// Extractor returning a fixed text and counting how often it ran.
pub struct FixedExtractor {
    text: String,
    pub calls: AtomicUsize,
}

impl FixedExtractor {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl TextExtractor for FixedExtractor {
    async fn extract(&self, _file_url: &str, _api_key: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.text.clone())
    }
}

/// Extractor that fails every call.
pub struct FailingExtractor;

#[async_trait::async_trait]
impl TextExtractor for FailingExtractor {
    async fn extract(&self, file_url: &str, _api_key: &str) -> Result<String> {
        Err(Error::storage(format!("download of `{file_url}` failed")))
    }
}

/// Completion client replaying canned chunks and recording every request.
pub struct ReplayCompletionClient {
    chunks: Vec<ChatChunk>,
    pub requests: Mutex<Vec<CompletionRequest>>,
}

impl ReplayCompletionClient {
    pub fn new(chunks: Vec<ChatChunk>) -> Self {
        Self {
            chunks,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Client answering every request with one text chunk.
    pub fn with_text(text: &str) -> Self {
        Self::new(vec![text_chunk(text)])
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> CompletionRequest {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait::async_trait]
impl CompletionClient for ReplayCompletionClient {
    async fn stream_chat(&self, request: CompletionRequest, _api_key: &str) -> Result<ChunkStream> {
        self.requests.lock().unwrap().push(request);
        let chunks: Vec<Result<ChatChunk>> = self.chunks.iter().cloned().map(Ok).collect();
        Ok(Box::pin(stream::iter(chunks)))
    }
}

pub fn text_chunk(text: &str) -> ChatChunk {
    ChatChunk {
        choices: vec![ChunkChoice {
            delta: Some(MessageDelta {
                content: Some(text.to_string()),
                custom_content: None,
            }),
        }],
    }
}

pub fn attachment_chunk(attachments: Vec<Attachment>) -> ChatChunk {
    ChatChunk {
        choices: vec![ChunkChoice {
            delta: Some(MessageDelta {
                content: None,
                custom_content: Some(CustomContent { attachments }),
            }),
        }],
    }
}

/// In-memory storage recording uploads under their URL.
pub struct MemoryStorage {
    pub home: String,
    pub files: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new(home: impl Into<String>) -> Self {
        Self {
            home: home.into(),
            files: Mutex::new(HashMap::new()),
        }
    }

    pub fn uploaded(&self, url: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(url).cloned()
    }
}

#[async_trait::async_trait]
impl FileStorage for MemoryStorage {
    async fn download(&self, url: &str, _api_key: &str) -> Result<DownloadedFile> {
        let bytes = self
            .uploaded(url)
            .ok_or_else(|| Error::storage(format!("no such file: {url}")))?;
        Ok(DownloadedFile {
            filename: url.rsplit('/').next().unwrap_or("file").to_string(),
            bytes,
        })
    }

    async fn upload(&self, url: &str, bytes: Vec<u8>, _api_key: &str) -> Result<()> {
        self.files.lock().unwrap().insert(url.to_string(), bytes);
        Ok(())
    }

    async fn appdata_home(&self, _api_key: &str) -> Result<String> {
        Ok(self.home.clone())
    }
}

/// Call params over fresh recording surfaces.
pub fn call_params(
    call_id: &str,
    tool_name: &str,
    arguments: Value,
    conversation_id: &str,
) -> (ToolCallParams, Arc<RecordingStage>, Arc<RecordingChoice>) {
    let stage = Arc::new(RecordingStage::new());
    let choice = Arc::new(RecordingChoice::new());
    let params = ToolCallParams {
        call: ToolCall {
            id: call_id.to_string(),
            name: tool_name.to_string(),
            arguments,
        },
        api_key: "test-key".to_string(),
        conversation_id: conversation_id.to_string(),
        stage: stage.clone(),
        choice: choice.clone(),
    };
    (params, stage, choice)
}
