use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::auth::AuthConfig;
use crate::providers::base::{impl_provider, BaseProvider, ProviderType};

/// Provider that runs a local command per tool call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliProvider {
    #[serde(flatten)]
    pub base: BaseProvider,
    pub command_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_vars: Option<HashMap<String, String>>,
}

impl_provider!(CliProvider, ProviderType::Cli);

impl CliProvider {
    pub fn new(name: String, command_name: String, auth: Option<AuthConfig>) -> Self {
        Self {
            base: BaseProvider::new(name, ProviderType::Cli, auth),
            command_name,
            working_dir: None,
            env_vars: None,
        }
    }
}
