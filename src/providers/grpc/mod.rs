use serde::{Deserialize, Serialize};

use crate::auth::AuthConfig;
use crate::providers::base::{impl_provider, BaseProvider, ProviderType};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrpcProvider {
    #[serde(flatten)]
    pub base: BaseProvider,
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub use_ssl: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method_name: Option<String>,
}

impl_provider!(GrpcProvider, ProviderType::Grpc);

impl GrpcProvider {
    pub fn new(name: String, host: String, port: u16, auth: Option<AuthConfig>) -> Self {
        Self {
            base: BaseProvider::new(name, ProviderType::Grpc, auth),
            host,
            port,
            use_ssl: false,
            service_name: None,
            method_name: None,
        }
    }

    pub fn endpoint(&self) -> String {
        let scheme = if self.use_ssl { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_follows_ssl_flag() {
        let mut provider = GrpcProvider::new("g".into(), "localhost".into(), 50051, None);
        assert_eq!(provider.endpoint(), "http://localhost:50051");
        provider.use_ssl = true;
        assert_eq!(provider.endpoint(), "https://localhost:50051");
    }
}
