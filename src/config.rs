//! Runtime configuration read from the environment.
//!
//! Follows the same convention as the HTTP layer: every knob has a sensible
//! default and an `AGENT_TOOLS_*` environment override, so embedding
//! applications can tune the runtime without code changes.

use std::env;
use std::time::Duration;

/// Settings shared by the runtime's HTTP-backed collaborators.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Base URL of the chat-completion / file-storage endpoint.
    pub endpoint: String,
    /// Optional API version sent as a query parameter on completion calls.
    pub api_version: Option<String>,
    /// Deployment identifier used by the retrieval tool's second model call.
    pub rag_deployment: String,
    /// URL of the external tool server, if one is configured.
    pub tool_server_url: Option<String>,
    /// Timeout applied to every outbound HTTP request.
    pub http_timeout: Duration,
}

impl RuntimeConfig {
    pub fn from_env() -> Self {
        Self {
            endpoint: env::var("AGENT_TOOLS_ENDPOINT")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            api_version: env::var("AGENT_TOOLS_API_VERSION").ok(),
            rag_deployment: env::var("AGENT_TOOLS_RAG_DEPLOYMENT")
                .unwrap_or_else(|_| "gpt-4o".to_string()),
            tool_server_url: env::var("AGENT_TOOLS_SERVER_URL").ok(),
            http_timeout: http_timeout_from_env(),
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Timeout for outbound HTTP requests (env-overridable).
pub(crate) fn http_timeout_from_env() -> Duration {
    let secs = env::var("AGENT_TOOLS_HTTP_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(30);
    Duration::from_secs(secs)
}
