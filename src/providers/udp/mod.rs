use serde::{Deserialize, Serialize};

use crate::auth::AuthConfig;
use crate::providers::base::{impl_provider, BaseProvider, ProviderType};

/// Provider definition for UDP datagram endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UdpProvider {
    #[serde(flatten)]
    pub base: BaseProvider,
    pub host: String,
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl_provider!(UdpProvider, ProviderType::Udp);

impl UdpProvider {
    pub fn new(name: String, host: String, port: u16, auth: Option<AuthConfig>) -> Self {
        Self {
            base: BaseProvider::new(name, ProviderType::Udp, auth),
            host,
            port,
            timeout_ms: None,
        }
    }
}
