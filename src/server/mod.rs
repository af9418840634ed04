//! MCP front-end: newline-delimited JSON-RPC 2.0 over a byte stream.
//!
//! Each `tools/call` runs on its own task with its own cancellation token, so
//! a slow backend call never blocks the read loop. Responses are funnelled
//! through a single writer task to keep lines intact.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::bridge::{tool_definitions, ToolResponse, UtcpMcpBridge};
use crate::chain::UtcpChainClient;
use crate::client::UtcpClientInterface;
use crate::config::BridgeConfig;

pub const PROTOCOL_VERSION: &str = "2024-11-05";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;

type Outbox = mpsc::UnboundedSender<Value>;

fn result_message(id: Value, result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

fn error_message(id: Value, code: i64, message: impl Into<String>) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message.into() },
    })
}

fn call_result(response: &ToolResponse) -> Value {
    json!({
        "content": [{ "type": "text", "text": response.text }],
        "isError": response.is_error,
    })
}

fn is_bridged(name: &str) -> bool {
    tool_definitions().iter().any(|def| def.name == name)
}

async fn write_messages<W>(mut writer: W, mut rx: mpsc::UnboundedReceiver<Value>) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(message) = rx.recv().await {
        let mut line = serde_json::to_vec(&message)?;
        line.push(b'\n');
        writer.write_all(&line).await?;
        writer.flush().await?;
    }
    Ok(())
}

pub struct McpServer<C: ?Sized, K: ?Sized> {
    bridge: UtcpMcpBridge<C, K>,
    server_name: String,
    server_version: String,
    in_flight: Arc<Mutex<HashMap<String, CancellationToken>>>,
}

impl<C, K> McpServer<C, K>
where
    C: UtcpClientInterface + ?Sized + 'static,
    K: UtcpChainClient + ?Sized + 'static,
{
    pub fn new(bridge: UtcpMcpBridge<C, K>, config: &BridgeConfig) -> Self {
        Self {
            bridge,
            server_name: config.server_name.clone(),
            server_version: config.server_version.clone(),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Serve the process's stdin and stdout until stdin closes.
    pub async fn serve_stdio(&self) -> Result<()> {
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Read requests from `reader` until end of input, answering on `writer`.
    /// Calls still running at end of input are allowed to finish.
    pub async fn serve<R, W>(&self, reader: R, writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        info!(name = %self.server_name, version = %self.server_version, "MCP server ready");
        let (tx, rx) = mpsc::unbounded_channel();
        let writer_task = tokio::spawn(write_messages(writer, rx));

        let mut reader = BufReader::new(reader);
        let mut line = Vec::new();
        let mut calls = JoinSet::new();
        loop {
            tokio::select! {
                Some(joined) = calls.join_next(), if !calls.is_empty() => {
                    if let Err(e) = joined {
                        error!(error = %e, "tool call task failed");
                    }
                }
                // Partial reads stay in `line`, so losing the race is harmless.
                read = reader.read_until(b'\n', &mut line) => {
                    let eof = read? == 0;
                    if !line.is_empty() {
                        self.handle_line(&line, &tx, &mut calls).await;
                        line.clear();
                    }
                    if eof {
                        break;
                    }
                }
            }
        }

        debug!(pending = calls.len(), "input closed, waiting for in-flight calls");
        while let Some(joined) = calls.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "tool call task failed");
            }
        }
        drop(tx);
        writer_task.await??;
        Ok(())
    }

    async fn handle_line(&self, line: &[u8], tx: &Outbox, calls: &mut JoinSet<()>) {
        if line.iter().all(u8::is_ascii_whitespace) {
            return;
        }

        // Invalid UTF-8 is reported by serde_json like any other malformed JSON.
        let message: Value = match serde_json::from_slice(line) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "unparsable request");
                let _ = tx.send(error_message(Value::Null, PARSE_ERROR, format!("parse error: {e}")));
                return;
            }
        };

        let id = message.get("id").cloned();
        let Some(method) = message.get("method").and_then(Value::as_str) else {
            // Responses to our own requests are never expected; drop them.
            if let Some(id) = id {
                let _ = tx.send(error_message(id, INVALID_REQUEST, "invalid request"));
            }
            return;
        };
        let params = message.get("params").cloned().unwrap_or(Value::Null);

        match id {
            None => self.handle_notification(method, &params).await,
            Some(id) => self.handle_request(id, method, params, tx, calls).await,
        }
    }

    async fn handle_notification(&self, method: &str, params: &Value) {
        match method {
            "notifications/cancelled" => {
                let Some(request_id) = params.get("requestId") else {
                    return;
                };
                if let Some(token) = self.in_flight.lock().await.get(&request_id.to_string()) {
                    debug!(request_id = %request_id, "cancelling call");
                    token.cancel();
                }
            }
            "notifications/initialized" => debug!("client initialized"),
            other => debug!(method = other, "ignoring notification"),
        }
    }

    async fn handle_request(
        &self,
        id: Value,
        method: &str,
        params: Value,
        tx: &Outbox,
        calls: &mut JoinSet<()>,
    ) {
        let reply = match method {
            "initialize" => result_message(id, self.initialize_result(&params)),
            "ping" => result_message(id, json!({})),
            "tools/list" => result_message(id, json!({ "tools": tool_definitions() })),
            "tools/call" => return self.spawn_call(id, params, tx, calls).await,
            other => error_message(id, METHOD_NOT_FOUND, format!("method not found: {other}")),
        };
        let _ = tx.send(reply);
    }

    fn initialize_result(&self, params: &Value) -> Value {
        let version = params
            .get("protocolVersion")
            .and_then(Value::as_str)
            .unwrap_or(PROTOCOL_VERSION);
        json!({
            "protocolVersion": version,
            "capabilities": { "tools": { "listChanged": false } },
            "serverInfo": { "name": self.server_name, "version": self.server_version },
        })
    }

    async fn spawn_call(&self, id: Value, params: Value, tx: &Outbox, calls: &mut JoinSet<()>) {
        let name = match params.get("name").and_then(Value::as_str) {
            Some(name) if is_bridged(name) => name.to_string(),
            Some(name) => {
                let _ = tx.send(error_message(id, INVALID_PARAMS, format!("unknown tool: {name}")));
                return;
            }
            None => {
                let _ = tx.send(error_message(id, INVALID_PARAMS, "tools/call requires a tool name"));
                return;
            }
        };
        let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);

        let key = id.to_string();
        let token = CancellationToken::new();
        self.in_flight.lock().await.insert(key.clone(), token.clone());

        let bridge = self.bridge.clone();
        let in_flight = self.in_flight.clone();
        let tx = tx.clone();
        calls.spawn(async move {
            let response = bridge.dispatch(&name, &arguments, &token).await;
            in_flight.lock().await.remove(&key);
            let message = match response {
                Some(response) => result_message(id, call_result(&response)),
                None => error_message(id, INVALID_PARAMS, format!("unknown tool: {name}")),
            };
            let _ = tx.send(message);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ChainRequest;
    use crate::providers::base::Provider;
    use crate::stream::{boxed_vec_stream, StreamResult};
    use crate::tools::Tool;
    use async_trait::async_trait;
    use tokio::io::AsyncReadExt;

    struct StubClient;

    #[async_trait]
    impl UtcpClientInterface for StubClient {
        async fn register_tool_provider(&self, _prov: Arc<dyn Provider>) -> Result<Vec<Tool>> {
            Ok(Vec::new())
        }

        async fn deregister_tool_provider(&self, _provider_name: &str) -> Result<()> {
            Ok(())
        }

        async fn call_tool(&self, tool_name: &str, args: HashMap<String, Value>) -> Result<Value> {
            if tool_name == "slow.hang" {
                std::future::pending::<()>().await;
            }
            Ok(json!({ "tool": tool_name, "args": args }))
        }

        async fn search_tools(&self, _query: &str, _limit: usize) -> Result<Vec<Tool>> {
            Ok(Vec::new())
        }

        async fn call_tool_stream(
            &self,
            _tool_name: &str,
            _args: HashMap<String, Value>,
        ) -> Result<Box<dyn StreamResult>> {
            Ok(boxed_vec_stream(vec![json!("a")]))
        }
    }

    struct StubChain;

    #[async_trait]
    impl UtcpChainClient for StubChain {
        async fn call_tool_chain(&self, request: ChainRequest) -> Result<Value> {
            Ok(json!({ "steps": request.steps.len() }))
        }
    }

    fn server() -> McpServer<StubClient, StubChain> {
        let bridge = UtcpMcpBridge::new(Arc::new(StubClient), Arc::new(StubChain));
        McpServer::new(bridge, &BridgeConfig::default())
    }

    async fn run(script: &str) -> Vec<Value> {
        let (out_w, mut out_r) = tokio::io::duplex(1 << 20);
        server().serve(script.as_bytes(), out_w).await.unwrap();

        let mut raw = String::new();
        out_r.read_to_string(&mut raw).await.unwrap();
        raw.lines().map(|l| serde_json::from_str(l).unwrap()).collect()
    }

    fn by_id(messages: &[Value], id: i64) -> &Value {
        messages.iter().find(|m| m["id"] == json!(id)).unwrap()
    }

    #[tokio::test]
    async fn handshake_and_listing() {
        let script = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2025-03-26"}}"#, "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#, "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#, "\n",
            r#"{"jsonrpc":"2.0","id":3,"method":"ping"}"#, "\n",
        );
        let messages = run(script).await;
        assert_eq!(messages.len(), 3);

        let init = &by_id(&messages, 1)["result"];
        assert_eq!(init["protocolVersion"], "2025-03-26");
        assert_eq!(init["serverInfo"]["name"], "utcp-bridge");
        assert_eq!(init["capabilities"]["tools"]["listChanged"], false);

        let tools = by_id(&messages, 2)["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 5);
        assert!(tools.iter().all(|t| t["inputSchema"]["type"] == "object"));

        assert_eq!(by_id(&messages, 3)["result"], json!({}));
    }

    #[tokio::test]
    async fn tool_calls_render_text_content() {
        let script = concat!(
            r#"{"jsonrpc":"2.0","id":7,"method":"tools/call","params":{"name":"utcp_call_tool","arguments":{"tool_name":"p.echo","arguments":{"x":1}}}}"#, "\n",
            r#"{"jsonrpc":"2.0","id":8,"method":"tools/call","params":{"name":"utcp_call_tool","arguments":{"tool_name":5}}}"#, "\n",
        );
        let messages = run(script).await;

        let ok = &by_id(&messages, 7)["result"];
        assert_eq!(ok["isError"], false);
        let text = ok["content"][0]["text"].as_str().unwrap();
        assert_eq!(
            serde_json::from_str::<Value>(text).unwrap(),
            json!({"tool": "p.echo", "args": {"x": 1}})
        );

        let bad = &by_id(&messages, 8)["result"];
        assert_eq!(bad["isError"], true);
        assert_eq!(bad["content"][0]["text"], "tool_name must be string");
    }

    #[tokio::test]
    async fn protocol_errors_use_json_rpc_codes() {
        let script = concat!(
            "not json\n",
            r#"{"jsonrpc":"2.0","id":1,"method":"resources/list"}"#, "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"nope"}}"#, "\n",
            r#"{"jsonrpc":"2.0","id":3}"#, "\n",
        );
        let messages = run(script).await;
        assert_eq!(messages.len(), 4);

        let parse = messages.iter().find(|m| m["id"].is_null()).unwrap();
        assert_eq!(parse["error"]["code"], PARSE_ERROR);
        assert_eq!(by_id(&messages, 1)["error"]["code"], METHOD_NOT_FOUND);
        assert_eq!(by_id(&messages, 2)["error"]["code"], INVALID_PARAMS);
        assert_eq!(by_id(&messages, 3)["error"]["code"], INVALID_REQUEST);
    }

    #[tokio::test]
    async fn invalid_utf8_line_does_not_stop_the_server() {
        let (out_w, mut out_r) = tokio::io::duplex(1 << 20);
        let input: &[u8] = b"\xff\xfe garbage\n{\"jsonrpc\":\"2.0\",\"id\":3,\"method\":\"ping\"}\n";
        server().serve(input, out_w).await.unwrap();

        let mut raw = String::new();
        out_r.read_to_string(&mut raw).await.unwrap();
        let messages: Vec<Value> = raw.lines().map(|l| serde_json::from_str(l).unwrap()).collect();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["id"], Value::Null);
        assert_eq!(messages[0]["error"]["code"], PARSE_ERROR);
        assert_eq!(by_id(&messages, 3)["result"], json!({}));
    }

    #[tokio::test]
    async fn final_line_without_newline_is_served() {
        let messages = run(r#"{"jsonrpc":"2.0","id":4,"method":"ping"}"#).await;
        assert_eq!(messages.len(), 1);
        assert_eq!(by_id(&messages, 4)["result"], json!({}));
    }

    #[tokio::test]
    async fn cancelled_notification_aborts_the_call() {
        let script = concat!(
            r#"{"jsonrpc":"2.0","id":"slow","method":"tools/call","params":{"name":"utcp_call_tool","arguments":{"tool_name":"slow.hang"}}}"#, "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/cancelled","params":{"requestId":"slow"}}"#, "\n",
        );
        let messages = run(script).await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["id"], "slow");
        assert_eq!(messages[0]["result"]["isError"], true);
        assert_eq!(messages[0]["result"]["content"][0]["text"], "request cancelled");
    }
}
