pub mod http;
pub mod registry;

use crate::providers::base::Provider;
use crate::stream::StreamResult;
use crate::tools::Tool;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

/// Performs discovery and calls for one transport family.
#[async_trait]
pub trait ClientTransport: Send + Sync {
    async fn register_tool_provider(&self, prov: &dyn Provider) -> Result<Vec<Tool>>;
    async fn deregister_tool_provider(&self, prov: &dyn Provider) -> Result<()>;
    async fn call_tool(
        &self,
        tool_name: &str,
        args: HashMap<String, Value>,
        prov: &dyn Provider,
    ) -> Result<Value>;
    async fn call_tool_stream(
        &self,
        tool_name: &str,
        args: HashMap<String, Value>,
        prov: &dyn Provider,
    ) -> Result<Box<dyn StreamResult>>;
}
