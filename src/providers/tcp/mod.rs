use serde::{Deserialize, Serialize};

use crate::auth::AuthConfig;
use crate::providers::base::{impl_provider, BaseProvider, ProviderType};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TcpProvider {
    #[serde(flatten)]
    pub base: BaseProvider,
    pub host: String,
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl_provider!(TcpProvider, ProviderType::Tcp);

impl TcpProvider {
    pub fn new(name: String, host: String, port: u16, auth: Option<AuthConfig>) -> Self {
        Self {
            base: BaseProvider::new(name, ProviderType::Tcp, auth),
            host,
            port,
            timeout_ms: Some(30_000),
        }
    }
}
