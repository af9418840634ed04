//! Tool chains: ordered steps with optional data flow between them.

pub mod sequential;

use std::collections::HashMap;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::coerce;
use crate::errors::{BridgeError, BridgeResult};

pub use sequential::SequentialChainClient;

pub const DEFAULT_CHAIN_TIMEOUT: Duration = Duration::from_millis(30_000);

/// One invocation in a chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainStep {
    /// Caller-assigned correlation id; may be empty and need not be unique.
    #[serde(default)]
    pub id: String,
    pub tool_name: String,
    #[serde(default)]
    pub inputs: HashMap<String, Value>,
    /// Feed the previous step's output into this step.
    #[serde(default)]
    pub use_previous: bool,
    /// Collect this step's result as a stream of chunks.
    #[serde(default)]
    pub stream: bool,
}

/// Steps plus the wall-clock budget for the whole chain.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainRequest {
    pub steps: Vec<ChainStep>,
    pub timeout: Duration,
}

impl ChainRequest {
    pub fn new(steps: Vec<ChainStep>, timeout: Duration) -> Self {
        Self { steps, timeout }
    }
}

/// Backend capable of running a whole chain.
#[async_trait]
pub trait UtcpChainClient: Send + Sync {
    async fn call_tool_chain(&self, request: ChainRequest) -> Result<Value>;
}

/// Build typed steps from loosely-typed step objects.
///
/// Non-object entries are read as empty objects. Any step without a
/// `tool_name` rejects the whole list.
pub fn compile_steps(raw_steps: &[Value]) -> BridgeResult<Vec<ChainStep>> {
    raw_steps
        .iter()
        .enumerate()
        .map(|(index, raw)| {
            let step = ChainStep {
                id: coerce::as_string(raw.get("id")),
                tool_name: coerce::as_string(raw.get("tool_name")),
                inputs: coerce::as_mapping(raw.get("inputs")),
                use_previous: coerce::as_bool(raw.get("use_previous")),
                stream: coerce::as_bool(raw.get("stream")),
            };
            if step.tool_name.is_empty() {
                return Err(BridgeError::MissingToolName { index });
            }
            Ok(step)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn compile_preserves_input_order() {
        let raw = vec![
            json!({"id": "s1", "tool_name": "a"}),
            json!({"id": "s2", "tool_name": "b"}),
        ];
        let steps = compile_steps(&raw).unwrap();
        let ids: Vec<_> = steps.iter().map(|s| (s.id.as_str(), s.tool_name.as_str())).collect();
        assert_eq!(ids, [("s1", "a"), ("s2", "b")]);
    }

    #[test]
    fn compile_rejects_whole_batch_on_missing_tool_name() {
        let raw = vec![
            json!({"tool_name": "a"}),
            json!({"tool_name": ""}),
            json!({"tool_name": "b"}),
        ];
        match compile_steps(&raw) {
            Err(BridgeError::MissingToolName { index }) => assert_eq!(index, 1),
            other => panic!("expected MissingToolName, got {other:?}"),
        }
    }

    #[test]
    fn non_object_steps_are_treated_as_empty() {
        let raw = vec![json!({"tool_name": "a"}), json!("b")];
        assert!(matches!(
            compile_steps(&raw),
            Err(BridgeError::MissingToolName { index: 1 })
        ));

        let raw = vec![json!({"tool_name": 5})];
        assert!(matches!(
            compile_steps(&raw),
            Err(BridgeError::MissingToolName { index: 0 })
        ));
    }

    #[test]
    fn optional_fields_are_coerced() {
        let raw = vec![json!({
            "tool_name": "p.t",
            "inputs": ["not", "a", "map"],
            "use_previous": "yes",
            "stream": true
        })];
        let step = &compile_steps(&raw).unwrap()[0];
        assert!(step.id.is_empty());
        assert!(step.inputs.is_empty());
        assert!(!step.use_previous);
        assert!(step.stream);
    }

    #[test]
    fn empty_step_list_compiles_to_empty_chain() {
        assert!(compile_steps(&[]).unwrap().is_empty());
    }
}
