use thiserror::Error;

/// Unified error type for the tool execution runtime.
///
/// Aggregates low-level failures into the categories the runtime acts on:
/// session-lifecycle failures are fatal to the session, protocol-state
/// failures are usage errors surfaced immediately, content failures are
/// user-facing, and everything else is contained at the execution-contract
/// boundary.
#[derive(Debug, Error)]
pub enum Error {
    /// Handshake or liveness-probe failure. Fatal to the session.
    #[error("tool server connection failed: {0}")]
    Connection(String),

    /// Operation attempted while the session is not in the `Connected` state.
    #[error("tool server session not connected")]
    NotConnected,

    /// Unexpected wire shape or an error response from the tool server.
    #[error("tool server protocol error: {0}")]
    Protocol(String),

    /// Missing, empty or unrecognized resource/document content.
    #[error("content error: {0}")]
    Content(String),

    /// Chat-completion backend failure.
    #[error("completion error: {0}")]
    Completion(String),

    /// Embedding backend failure or vector dimension mismatch.
    #[error("embedding error: {0}")]
    Embedding(String),

    /// File storage backend failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// Invalid runtime or tool wiring.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Tool call arguments that do not match the tool's schema.
    #[error("invalid tool arguments: {0}")]
    Arguments(String),

    #[error("network transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub fn connection(msg: impl Into<String>) -> Self {
        Error::Connection(msg.into())
    }

    pub fn protocol(msg: impl Into<String>) -> Self {
        Error::Protocol(msg.into())
    }

    pub fn content(msg: impl Into<String>) -> Self {
        Error::Content(msg.into())
    }

    pub fn completion(msg: impl Into<String>) -> Self {
        Error::Completion(msg.into())
    }

    pub fn embedding(msg: impl Into<String>) -> Self {
        Error::Embedding(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Error::Storage(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Error::Configuration(msg.into())
    }

    pub fn arguments(msg: impl Into<String>) -> Self {
        Error::Arguments(msg.into())
    }
}
