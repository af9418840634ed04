use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::auth::AuthConfig;
use crate::providers::base::{impl_provider, BaseProvider, ProviderType};

/// An MCP server reached either over HTTP (`url`) or by spawning it (`command`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpProvider {
    #[serde(flatten)]
    pub base: BaseProvider,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_vars: Option<HashMap<String, String>>,
}

impl_provider!(McpProvider, ProviderType::Mcp);

impl McpProvider {
    pub fn new(name: String, url: String, auth: Option<AuthConfig>) -> Self {
        Self {
            base: BaseProvider::new(name, ProviderType::Mcp, auth),
            url: Some(url),
            headers: None,
            command: None,
            args: None,
            env_vars: None,
        }
    }

    pub fn new_stdio(name: String, command: String, args: Option<Vec<String>>) -> Self {
        Self {
            base: BaseProvider::new(name, ProviderType::Mcp, None),
            url: None,
            headers: None,
            command: Some(command),
            args,
            env_vars: None,
        }
    }

    pub fn is_stdio(&self) -> bool {
        self.command.is_some()
    }
}
