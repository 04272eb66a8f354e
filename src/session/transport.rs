//! Bidirectional transport boundary for the tool server session.

use crate::{Error, Result};
use serde_json::Value;
use url::Url;

/// One bidirectional message transport to a tool server.
///
/// `exchange` sends a single protocol message and resolves with the server's
/// reply, or `None` when the message expects no reply (notifications).
#[async_trait::async_trait]
pub trait Transport: Send {
    async fn exchange(&mut self, message: Value) -> Result<Option<Value>>;

    /// Release the logical session established over this transport, if any.
    /// Acquired by the handshake, so released before [`Transport::close`].
    async fn end_session(&mut self) -> Result<()>;

    /// Tear down the underlying connection.
    async fn close(&mut self) -> Result<()>;
}

/// Opens transports; the session keeps one connector so tests can swap in
/// an in-memory implementation.
#[async_trait::async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<Box<dyn Transport>>;
}

/// Streamable-HTTP transport: every message is POSTed to the server URL; a
/// session id issued by the server is echoed on subsequent requests and the
/// session is DELETEd on teardown.
pub struct HttpTransport {
    client: reqwest::Client,
    url: Url,
    session_id: Option<String>,
}

const SESSION_HEADER: &str = "Mcp-Session-Id";

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn exchange(&mut self, message: Value) -> Result<Option<Value>> {
        let mut request = self
            .client
            .post(self.url.clone())
            .header(reqwest::header::ACCEPT, "application/json, text/event-stream")
            .json(&message);
        if let Some(id) = &self.session_id {
            request = request.header(SESSION_HEADER, id);
        }

        let response = request.send().await?;
        if let Some(id) = response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            self.session_id = Some(id.to_string());
        }

        let status = response.status();
        if !status.is_success() {
            return Err(Error::protocol(format!(
                "tool server returned HTTP {status}"
            )));
        }
        // Notifications are acknowledged without a body.
        if status == reqwest::StatusCode::ACCEPTED || message.get("id").is_none() {
            return Ok(None);
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let body = response.text().await?;
        if content_type.starts_with("text/event-stream") {
            return Ok(Some(first_sse_payload(&body)?));
        }
        Ok(Some(serde_json::from_str(&body)?))
    }

    async fn end_session(&mut self) -> Result<()> {
        if let Some(id) = self.session_id.take() {
            self.client
                .delete(self.url.clone())
                .header(SESSION_HEADER, id)
                .send()
                .await?
                .error_for_status()
                .map_err(Error::from)?;
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        // The HTTP connection pool is released with the client; nothing to
        // flush at this layer.
        Ok(())
    }
}

/// Servers answering a single request over SSE frame the reply as the first
/// `data:` event.
fn first_sse_payload(body: &str) -> Result<Value> {
    body.lines()
        .filter_map(|line| {
            let trimmed = line.trim();
            trimmed
                .strip_prefix("data: ")
                .or_else(|| trimmed.strip_prefix("data:"))
        })
        .find_map(|payload| serde_json::from_str(payload.trim()).ok())
        .ok_or_else(|| Error::protocol("tool server event stream carried no payload"))
}

/// Connector producing [`HttpTransport`]s.
pub struct HttpConnector {
    timeout: std::time::Duration,
}

impl HttpConnector {
    pub fn new() -> Self {
        Self {
            timeout: crate::config::http_timeout_from_env(),
        }
    }

    pub fn with_timeout(timeout: std::time::Duration) -> Self {
        Self { timeout }
    }
}

impl Default for HttpConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Connector for HttpConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn Transport>> {
        let url = Url::parse(url)
            .map_err(|e| Error::connection(format!("invalid tool server url `{url}`: {e}")))?;
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| Error::connection(format!("failed to create HTTP client: {e}")))?;
        Ok(Box::new(HttpTransport {
            client,
            url,
            session_id: None,
        }))
    }
}
