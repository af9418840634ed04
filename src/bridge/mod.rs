//! The five bridged operations exposed to MCP clients.
//!
//! Every operation validates its argument bag, calls the backend once, and
//! renders the outcome as a [`ToolResponse`]. Failures never escape as Rust
//! errors: they become error payloads for the one request that caused them.

mod schema;

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Map, Value};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::chain::{compile_steps, ChainRequest, UtcpChainClient, DEFAULT_CHAIN_TIMEOUT};
use crate::client::UtcpClientInterface;
use crate::coerce;
use crate::errors::{BridgeError, BridgeResult};
use crate::providers;
use crate::stream::StreamResult;

pub use schema::{tool_definitions, ToolDefinition};

pub const CALL_TOOL: &str = "utcp_call_tool";
pub const SEARCH_TOOLS: &str = "utcp_search_tools";
pub const CALL_TOOL_STREAM: &str = "utcp_call_tool_stream";
pub const REGISTER_PROVIDER: &str = "utcp_register_provider";
pub const RUN_CHAIN: &str = "utcp_run_chain";

pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Result envelope handed back to the front-end: JSON text on success, a
/// human-readable message on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolResponse {
    pub text: String,
    pub is_error: bool,
}

impl ToolResponse {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            text: message.into(),
            is_error: true,
        }
    }
}

impl From<BridgeResult<String>> for ToolResponse {
    fn from(result: BridgeResult<String>) -> Self {
        match result {
            Ok(text) => ToolResponse::success(text),
            Err(e) => ToolResponse::error(e.to_string()),
        }
    }
}

/// Dispatcher over any backend client and chain runner.
pub struct UtcpMcpBridge<C: ?Sized, K: ?Sized> {
    client: Arc<C>,
    chain: Arc<K>,
}

impl<C: ?Sized, K: ?Sized> Clone for UtcpMcpBridge<C, K> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            chain: self.chain.clone(),
        }
    }
}

fn object_args(args: &Value) -> BridgeResult<&Map<String, Value>> {
    args.as_object()
        .ok_or_else(|| BridgeError::InvalidArguments("invalid arguments".to_string()))
}

fn required_string(args: &Map<String, Value>, field: &str) -> BridgeResult<String> {
    match args.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        _ => Err(BridgeError::InvalidArguments(format!(
            "{} must be string",
            field
        ))),
    }
}

/// Race a backend future against the caller's cancellation.
async fn until_cancelled<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = T>,
) -> BridgeResult<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(BridgeError::Cancelled),
        out = fut => Ok(out),
    }
}

/// Pull every chunk, rendering each as JSON text. Any error or cancellation
/// discards what was already collected.
async fn drain(
    stream: &mut dyn StreamResult,
    cancel: &CancellationToken,
) -> BridgeResult<Vec<String>> {
    let mut chunks = Vec::new();
    loop {
        match until_cancelled(cancel, stream.next()).await? {
            Ok(Some(chunk)) => chunks.push(chunk.to_string()),
            Ok(None) => return Ok(chunks),
            Err(e) => return Err(BridgeError::StreamAbort(e)),
        }
    }
}

impl<C, K> UtcpMcpBridge<C, K>
where
    C: UtcpClientInterface + ?Sized,
    K: UtcpChainClient + ?Sized,
{
    pub fn new(client: Arc<C>, chain: Arc<K>) -> Self {
        Self { client, chain }
    }

    /// Route a front-end tool call by name. `None` when the name is not one of
    /// the bridged operations.
    pub async fn dispatch(
        &self,
        name: &str,
        args: &Value,
        cancel: &CancellationToken,
    ) -> Option<ToolResponse> {
        let result = match name {
            CALL_TOOL => self.call_tool(args, cancel).await,
            SEARCH_TOOLS => self.search_tools(args, cancel).await,
            CALL_TOOL_STREAM => self.call_tool_stream(args, cancel).await,
            REGISTER_PROVIDER => self.register_provider(args, cancel).await,
            RUN_CHAIN => self.run_chain(args, cancel).await,
            _ => return None,
        };
        if let Err(e) = &result {
            warn!(operation = name, error = %e, "bridged call failed");
        }
        Some(result.into())
    }

    pub async fn call_tool(&self, args: &Value, cancel: &CancellationToken) -> BridgeResult<String> {
        let args = object_args(args)?;
        let tool_name = required_string(args, "tool_name")?;
        let tool_args = coerce::as_mapping(args.get("arguments"));

        debug!(tool = %tool_name, "call_tool");
        let result = until_cancelled(cancel, self.client.call_tool(&tool_name, tool_args))
            .await?
            .map_err(|e| BridgeError::backend("failed to call tool", e))?;
        Ok(serde_json::to_string(&result)?)
    }

    pub async fn search_tools(&self, args: &Value, cancel: &CancellationToken) -> BridgeResult<String> {
        let args = object_args(args)?;
        let query = required_string(args, "query")?;
        let limit = match coerce::as_int(args.get("limit"), DEFAULT_SEARCH_LIMIT as i64) {
            n if n < 0 => DEFAULT_SEARCH_LIMIT,
            n => n as usize,
        };

        debug!(%query, limit, "search_tools");
        let tools = until_cancelled(cancel, self.client.search_tools(&query, limit))
            .await?
            .map_err(|e| BridgeError::backend("failed to search tools", e))?;
        Ok(serde_json::to_string(&tools)?)
    }

    pub async fn call_tool_stream(
        &self,
        args: &Value,
        cancel: &CancellationToken,
    ) -> BridgeResult<String> {
        let args = object_args(args)?;
        let tool_name = required_string(args, "tool_name")?;
        let tool_args = coerce::as_mapping(args.get("arguments"));

        debug!(tool = %tool_name, "call_tool_stream");
        let mut stream = until_cancelled(cancel, self.client.call_tool_stream(&tool_name, tool_args))
            .await?
            .map_err(|e| BridgeError::backend("stream failed", e))?;

        let drained = drain(stream.as_mut(), cancel).await;
        if let Err(e) = stream.close().await {
            debug!(tool = %tool_name, error = %e, "closing stream failed");
        }
        let chunks = drained?;
        Ok(json!({ "chunks": chunks }).to_string())
    }

    pub async fn register_provider(
        &self,
        args: &Value,
        cancel: &CancellationToken,
    ) -> BridgeResult<String> {
        let args = object_args(args)?;
        let config = match args.get("provider_config") {
            Some(config @ Value::Object(_)) => config.clone(),
            _ => {
                return Err(BridgeError::InvalidArguments(
                    "provider_config must be object".to_string(),
                ))
            }
        };

        let descriptor = providers::decode_value(config)?;
        debug!(provider = %descriptor.name(), provider_type = %descriptor.provider_type(), "register_provider");

        let tools = until_cancelled(
            cancel,
            self.client.register_tool_provider(descriptor.into_provider()),
        )
        .await?
        .map_err(|e| BridgeError::backend("failed to register provider", e))?;

        Ok(serde_json::to_string(&json!({
            "registered_tools": tools,
            "count": tools.len(),
        }))?)
    }

    pub async fn run_chain(&self, args: &Value, cancel: &CancellationToken) -> BridgeResult<String> {
        let args = object_args(args)?;
        let raw_steps = match args.get("steps") {
            Some(Value::Array(steps)) => steps,
            _ => {
                return Err(BridgeError::InvalidArguments(
                    "steps must be an array".to_string(),
                ))
            }
        };
        let timeout = coerce::as_int_milliseconds(args.get("timeout"), DEFAULT_CHAIN_TIMEOUT);
        let steps = compile_steps(raw_steps)?;

        debug!(steps = steps.len(), timeout_ms = timeout.as_millis() as u64, "run_chain");
        let result = until_cancelled(
            cancel,
            self.chain.call_tool_chain(ChainRequest::new(steps, timeout)),
        )
        .await?
        .map_err(|e| BridgeError::backend("chain failed", e))?;
        Ok(serde_json::to_string(&result)?)
    }
}
