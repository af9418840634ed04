use serde::Serialize;
use serde_json::{json, Value};

use super::{CALL_TOOL, CALL_TOOL_STREAM, REGISTER_PROVIDER, RUN_CHAIN, SEARCH_TOOLS};
use crate::chain::DEFAULT_CHAIN_TIMEOUT;

/// An MCP tool advertised by the bridge.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

fn object_schema(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: CALL_TOOL,
            description: "Call a UTCP tool by name with arguments",
            input_schema: object_schema(
                json!({
                    "tool_name": {"type": "string"},
                    "arguments": {"type": "object"},
                }),
                &["tool_name"],
            ),
        },
        ToolDefinition {
            name: SEARCH_TOOLS,
            description: "Search for available UTCP tools",
            input_schema: object_schema(
                json!({
                    "query": {"type": "string"},
                    "limit": {"type": "integer", "default": super::DEFAULT_SEARCH_LIMIT},
                }),
                &["query"],
            ),
        },
        ToolDefinition {
            name: CALL_TOOL_STREAM,
            description: "Call a UTCP tool with streaming response",
            input_schema: object_schema(
                json!({
                    "tool_name": {"type": "string"},
                    "arguments": {"type": "object"},
                }),
                &["tool_name"],
            ),
        },
        ToolDefinition {
            name: REGISTER_PROVIDER,
            description: "Register a new UTCP tool provider",
            input_schema: object_schema(
                json!({ "provider_config": {"type": "object"} }),
                &["provider_config"],
            ),
        },
        ToolDefinition {
            name: RUN_CHAIN,
            description: "Run a UTCP tool chain",
            input_schema: object_schema(
                json!({
                    "steps": {"type": "array", "items": {"type": "object"}},
                    "timeout": {
                        "type": "integer",
                        "default": DEFAULT_CHAIN_TIMEOUT.as_millis() as u64,
                    },
                }),
                &["steps"],
            ),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advertises_five_tools_with_required_fields() {
        let defs = tool_definitions();
        let names: Vec<_> = defs.iter().map(|d| d.name).collect();
        assert_eq!(
            names,
            [CALL_TOOL, SEARCH_TOOLS, CALL_TOOL_STREAM, REGISTER_PROVIDER, RUN_CHAIN]
        );

        let chain = serde_json::to_value(&defs[4]).unwrap();
        assert_eq!(chain["inputSchema"]["required"], json!(["steps"]));
        assert_eq!(chain["inputSchema"]["properties"]["timeout"]["default"], json!(30000));
    }
}
