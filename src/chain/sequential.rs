use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::chain::{ChainRequest, ChainStep, UtcpChainClient};
use crate::client::UtcpClientInterface;
use crate::stream::collect_chunks;

/// Key under which a non-object previous result is handed to the next step.
pub const PREVIOUS_RESULT_KEY: &str = "previous_result";

#[derive(Debug, Serialize)]
struct StepOutcome {
    id: String,
    tool_name: String,
    result: Value,
}

/// Runs chain steps one after another against a [`UtcpClientInterface`].
pub struct SequentialChainClient {
    client: Arc<dyn UtcpClientInterface>,
}

impl SequentialChainClient {
    pub fn new(client: Arc<dyn UtcpClientInterface>) -> Self {
        Self { client }
    }

    async fn run_step(&self, step: &ChainStep, previous: Option<&Value>) -> Result<Value> {
        let args = step_inputs(step, previous);
        if step.stream {
            let mut stream = self.client.call_tool_stream(&step.tool_name, args).await?;
            let chunks = collect_chunks(stream.as_mut()).await?;
            Ok(Value::Array(chunks))
        } else {
            self.client.call_tool(&step.tool_name, args).await
        }
    }

    async fn run_steps(&self, steps: Vec<ChainStep>) -> Result<Value> {
        let mut outcomes: Vec<StepOutcome> = Vec::with_capacity(steps.len());
        for (index, step) in steps.into_iter().enumerate() {
            let previous = outcomes.last().map(|o| &o.result);
            debug!(index, tool = %step.tool_name, "running chain step");
            let result = self
                .run_step(&step, previous)
                .await
                .with_context(|| format!("step {} ({}) failed", index, step.tool_name))?;
            outcomes.push(StepOutcome {
                id: step.id,
                tool_name: step.tool_name,
                result,
            });
        }

        let last = outcomes
            .last()
            .map(|o| o.result.clone())
            .unwrap_or(Value::Null);
        Ok(serde_json::json!({ "steps": outcomes, "final": last }))
    }
}

/// Effective arguments for a step: its own inputs, layered over the previous
/// result when `use_previous` is set.
fn step_inputs(step: &ChainStep, previous: Option<&Value>) -> HashMap<String, Value> {
    let mut args = HashMap::new();
    match (step.use_previous, previous) {
        (true, Some(Value::Object(prev))) => {
            args.extend(prev.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        (true, Some(prev)) => {
            args.insert(PREVIOUS_RESULT_KEY.to_string(), prev.clone());
        }
        _ => {}
    }
    args.extend(step.inputs.iter().map(|(k, v)| (k.clone(), v.clone())));
    args
}

#[async_trait]
impl UtcpChainClient for SequentialChainClient {
    async fn call_tool_chain(&self, request: ChainRequest) -> Result<Value> {
        let ChainRequest { steps, timeout } = request;
        tokio::time::timeout(timeout, self.run_steps(steps))
            .await
            .map_err(|_| anyhow!("chain timed out after {} ms", timeout.as_millis()))?
    }
}
