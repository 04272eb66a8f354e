//! 外部工具服务器会话：连接、握手、存活探测与生命周期管理。
//!
//! External tool server session. Manages a single bidirectional session to a
//! remote tool server: connect, list tools, invoke a tool, fetch a resource,
//! close.
//!
//! ## Lifecycle
//!
//! ```text
//! Disconnected ──connect()──▶ Connecting ──handshake+ping──▶ Connected ──close()──▶ Closed
//!        ▲                        │
//!        └────── probe failed ────┘   (torn down, retryable)
//! ```
//!
//! `connect` is idempotent while `Connected`. The operations `list_tools`,
//! `invoke_tool` and `read_resource` require `Connected` and fail with
//! [`Error::NotConnected`] otherwise. `close` is best-effort: it releases
//! the handshaked session and the transport in reverse order of
//! acquisition, logs (and swallows) failures in either step, and always
//! ends in `Closed` with internal handles cleared.

pub mod content;
pub mod transport;

pub use content::{InvocationContent, ResourceContent, ServerToolDescriptor};
pub use transport::{Connector, HttpConnector, Transport};

use crate::{Error, Result};
use futures::future::BoxFuture;
use serde_json::{json, Value};
use tracing::{debug, warn};

/// Connection state of a [`ToolServerSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
    /// Terminal: a closed session is not reused.
    Closed,
}

const PROTOCOL_VERSION: &str = "2025-03-26";

/// JSON-RPC channel over a [`Transport`]: request ids, handshake, error
/// unwrapping.
struct RpcChannel {
    transport: Box<dyn Transport>,
    next_id: u64,
}

impl RpcChannel {
    fn new(transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            next_id: 1,
        }
    }

    async fn request(&mut self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id;
        self.next_id += 1;
        let message = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        let response = self
            .transport
            .exchange(message)
            .await?
            .ok_or_else(|| Error::protocol(format!("no response to `{method}`")))?;
        if let Some(error) = response.get("error") {
            return Err(Error::protocol(format!("`{method}` failed: {error}")));
        }
        Ok(response.get("result").cloned().unwrap_or(Value::Null))
    }

    async fn notify(&mut self, method: &str, params: Value) -> Result<()> {
        let message = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
        });
        self.transport.exchange(message).await?;
        Ok(())
    }

    /// Protocol handshake: `initialize` exchange followed by the
    /// `initialized` notification.
    async fn handshake(&mut self) -> Result<()> {
        self.request(
            "initialize",
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {},
                "clientInfo": {
                    "name": env!("CARGO_PKG_NAME"),
                    "version": env!("CARGO_PKG_VERSION"),
                },
            }),
        )
        .await?;
        self.notify("notifications/initialized", json!({})).await
    }

    async fn ping(&mut self) -> Result<()> {
        self.request("ping", json!({})).await.map(|_| ())
    }
}

/// A single session to an external tool server.
///
/// Owned exclusively by the tool (or tool group) that created it; not
/// shared across unrelated tools.
pub struct ToolServerSession {
    url: String,
    connector: Box<dyn Connector>,
    state: SessionState,
    channel: Option<RpcChannel>,
}

impl ToolServerSession {
    /// Session over the production streamable-HTTP transport.
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_connector(url, Box::new(HttpConnector::new()))
    }

    pub fn with_connector(url: impl Into<String>, connector: Box<dyn Connector>) -> Self {
        Self {
            url: url.into(),
            connector,
            state: SessionState::Disconnected,
            channel: None,
        }
    }

    /// Create and connect in one step.
    pub async fn connect_to(url: impl Into<String>) -> Result<Self> {
        let mut session = Self::new(url);
        session.connect().await?;
        Ok(session)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Open the transport, perform the handshake and verify liveness with a
    /// ping. A no-op when already connected. On probe failure everything
    /// opened so far is torn down and the session returns to
    /// `Disconnected`, so it is never left half-open.
    pub async fn connect(&mut self) -> Result<()> {
        match self.state {
            SessionState::Connected => return Ok(()),
            SessionState::Closed => {
                return Err(Error::connection("session is closed"));
            }
            SessionState::Disconnected | SessionState::Connecting => {}
        }
        self.state = SessionState::Connecting;

        let transport = match self.connector.connect(&self.url).await {
            Ok(transport) => transport,
            Err(e) => {
                self.state = SessionState::Disconnected;
                return Err(Error::connection(format!(
                    "failed to reach tool server at {}: {e}",
                    self.url
                )));
            }
        };

        let mut channel = RpcChannel::new(transport);
        if let Err(e) = channel.handshake().await {
            Self::teardown(channel).await;
            self.state = SessionState::Disconnected;
            return Err(Error::connection(format!("handshake failed: {e}")));
        }
        if let Err(e) = channel.ping().await {
            Self::teardown(channel).await;
            self.state = SessionState::Disconnected;
            return Err(Error::connection(format!("liveness probe failed: {e}")));
        }

        debug!(url = %self.url, "tool server session established");
        self.channel = Some(channel);
        self.state = SessionState::Connected;
        Ok(())
    }

    /// List the tools the server exposes. Requires `Connected`.
    pub async fn list_tools(&mut self) -> Result<Vec<ServerToolDescriptor>> {
        let channel = self.channel_mut()?;
        let result = channel.request("tools/list", json!({})).await?;
        let tools = result
            .get("tools")
            .and_then(Value::as_array)
            .ok_or_else(|| Error::protocol("tools/list result carried no tool array"))?;
        tools
            .iter()
            .map(|tool| {
                serde_json::from_value(tool.clone())
                    .map_err(|e| Error::protocol(format!("malformed tool descriptor: {e}")))
            })
            .collect()
    }

    /// Invoke a named tool and return the first content item of the result,
    /// or `None` when the result carried no content. Requires `Connected`.
    pub async fn invoke_tool(
        &mut self,
        name: &str,
        arguments: Value,
    ) -> Result<Option<InvocationContent>> {
        let channel = self.channel_mut()?;
        let result = channel
            .request("tools/call", json!({"name": name, "arguments": arguments}))
            .await?;
        let first = result
            .get("content")
            .and_then(Value::as_array)
            .and_then(|items| items.first());
        Ok(first.map(content::decode_invocation_content))
    }

    /// Read a resource by URI. Requires `Connected`. Fails with a content
    /// error for an empty content list or an unrecognized content kind.
    pub async fn read_resource(&mut self, uri: &str) -> Result<ResourceContent> {
        let channel = self.channel_mut()?;
        let result = channel
            .request("resources/read", json!({"uri": uri}))
            .await?;
        let first = result
            .get("contents")
            .and_then(Value::as_array)
            .and_then(|items| items.first())
            .ok_or_else(|| Error::content(format!("no content in resource: {uri}")))?;
        content::decode_resource_content(uri, first)
    }

    /// Best-effort teardown. Never fails; always leaves the session
    /// `Closed` with handles cleared.
    pub async fn close(&mut self) {
        if let Some(channel) = self.channel.take() {
            Self::teardown(channel).await;
        }
        self.state = SessionState::Closed;
    }

    /// Release the two layers in reverse order of acquisition: the logical
    /// session first, then the transport. A failure in either step is
    /// logged and does not prevent the other from running.
    async fn teardown(channel: RpcChannel) {
        let mut transport = channel.transport;
        if let Err(e) = transport.end_session().await {
            warn!("error releasing tool server session: {e}");
        }
        if let Err(e) = transport.close().await {
            warn!("error closing tool server transport: {e}");
        }
    }

    /// Scoped acquisition: connect on entry, guaranteed [`close`] on exit,
    /// including when `f` fails.
    ///
    /// [`close`]: ToolServerSession::close
    pub async fn scope<T, F>(&mut self, f: F) -> Result<T>
    where
        F: for<'a> FnOnce(&'a mut ToolServerSession) -> BoxFuture<'a, Result<T>>,
    {
        self.connect().await?;
        let result = f(self).await;
        self.close().await;
        result
    }

    fn channel_mut(&mut self) -> Result<&mut RpcChannel> {
        if self.state != SessionState::Connected {
            return Err(Error::NotConnected);
        }
        self.channel.as_mut().ok_or(Error::NotConnected)
    }
}
