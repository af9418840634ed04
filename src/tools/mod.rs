use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// JSON-schema subset used for tool inputs and outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInputOutputSchema {
    #[serde(rename = "type", default = "default_schema_type")]
    pub type_: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<HashMap<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

fn default_schema_type() -> String {
    "object".to_string()
}

impl Default for ToolInputOutputSchema {
    fn default() -> Self {
        Self {
            type_: default_schema_type(),
            properties: None,
            required: None,
            description: None,
            title: None,
        }
    }
}

/// Summary of a backend tool as returned by search and registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub inputs: ToolInputOutputSchema,
    #[serde(default)]
    pub outputs: ToolInputOutputSchema,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_response_size: Option<i64>,
}

impl Tool {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            inputs: ToolInputOutputSchema::default(),
            outputs: ToolInputOutputSchema::default(),
            tags: Vec::new(),
            average_response_size: None,
        }
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }
}

#[async_trait]
pub trait ToolSearchStrategy: Send + Sync {
    async fn search_tools(&self, query: &str, limit: usize) -> Result<Vec<Tool>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn manual_entries_fill_missing_fields() {
        let tool: Tool = serde_json::from_value(json!({"name": "echo"})).unwrap();
        assert_eq!(tool.inputs.type_, "object");
        assert!(tool.tags.is_empty());
        assert_eq!(tool, Tool::new("echo", ""));
    }
}
