//! reqwest-backed completion client speaking SSE.

use super::{ChatChunk, ChunkStream, CompletionClient, CompletionRequest};
use crate::config;
use crate::{Error, Result};
use futures::{stream, StreamExt};
use serde_json::json;

/// Production completion client: POSTs a deployment-addressed chat request
/// and decodes the `data: `-framed SSE response into [`ChatChunk`]s.
pub struct HttpCompletionClient {
    client: reqwest::Client,
    base_url: String,
    api_version: Option<String>,
}

impl HttpCompletionClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config::http_timeout_from_env())
            .build()
            .map_err(|e| Error::configuration(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_version: None,
        })
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = Some(api_version.into());
        self
    }

    pub fn from_config(cfg: &crate::config::RuntimeConfig) -> Result<Self> {
        let mut client = Self::new(cfg.endpoint.clone())?;
        if let Some(version) = &cfg.api_version {
            client = client.with_api_version(version.clone());
        }
        Ok(client)
    }

    fn request_body(request: &CompletionRequest) -> Result<serde_json::Value> {
        let mut body = json!({
            "messages": request.messages,
            "stream": request.stream,
        });
        if let Some(configuration) = &request.configuration {
            body["custom_fields"] = json!({ "configuration": configuration });
        }
        Ok(body)
    }
}

#[async_trait::async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn stream_chat(&self, request: CompletionRequest, api_key: &str) -> Result<ChunkStream> {
        let url = format!(
            "{}/openai/deployments/{}/chat/completions",
            self.base_url, request.deployment
        );
        let mut http_request = self
            .client
            .post(&url)
            .header("Api-Key", api_key)
            .json(&Self::request_body(&request)?);
        if let Some(version) = &self.api_version {
            http_request = http_request.query(&[("api-version", version.as_str())]);
        }

        let response = http_request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::completion(format!(
                "deployment `{}` returned HTTP {status}: {body}",
                request.deployment
            )));
        }

        let bytes = response
            .bytes_stream()
            .map(|item| item.map_err(Error::from));
        Ok(decode_sse(Box::pin(bytes)))
    }
}

/// Decode an SSE byte stream into chunks: frames split on blank lines,
/// `data: ` prefix stripped, `[DONE]` terminates the stream.
fn decode_sse(input: crate::BoxStream<'static, bytes::Bytes>) -> ChunkStream {
    let stream = stream::unfold((input, String::new()), |(mut input, mut buf)| async move {
        loop {
            if let Some(idx) = buf.find("\n\n") {
                let frame = buf[..idx].to_string();
                buf = buf[idx + 2..].to_string();
                match parse_frame(&frame) {
                    FrameOutcome::Chunk(chunk) => return Some((Ok(chunk), (input, buf))),
                    FrameOutcome::Done => return None,
                    FrameOutcome::Skip => continue,
                }
            }

            match input.next().await {
                Some(Ok(bytes)) => {
                    buf.push_str(&String::from_utf8_lossy(&bytes));
                    continue;
                }
                Some(Err(e)) => return Some((Err(e), (input, buf))),
                None => {
                    // EOF: try the remaining buffer once.
                    let frame = std::mem::take(&mut buf);
                    return match parse_frame(&frame) {
                        FrameOutcome::Chunk(chunk) => Some((Ok(chunk), (input, buf))),
                        _ => None,
                    };
                }
            }
        }
    });
    Box::pin(stream)
}

enum FrameOutcome {
    Chunk(ChatChunk),
    Done,
    Skip,
}

fn parse_frame(frame: &str) -> FrameOutcome {
    let trimmed = frame.trim();
    if trimmed.is_empty() || trimmed.starts_with(':') {
        return FrameOutcome::Skip;
    }
    let payload = trimmed
        .strip_prefix("data: ")
        .or_else(|| trimmed.strip_prefix("data:"))
        .unwrap_or(trimmed)
        .trim();
    if payload == "[DONE]" {
        return FrameOutcome::Done;
    }
    match serde_json::from_str::<ChatChunk>(payload) {
        Ok(chunk) => FrameOutcome::Chunk(chunk),
        Err(_) => FrameOutcome::Skip,
    }
}
