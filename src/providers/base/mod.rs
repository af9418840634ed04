use serde::{Deserialize, Serialize};

use crate::auth::AuthConfig;

/// The closed set of transport families a provider descriptor can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderType {
    Cli,
    Graphql,
    Grpc,
    Http,
    Mcp,
    Sse,
    Streamable,
    Tcp,
    Text,
    Udp,
    Webrtc,
    Websocket,
}

impl ProviderType {
    pub const ALL: [ProviderType; 12] = [
        ProviderType::Cli,
        ProviderType::Graphql,
        ProviderType::Grpc,
        ProviderType::Http,
        ProviderType::Mcp,
        ProviderType::Sse,
        ProviderType::Streamable,
        ProviderType::Tcp,
        ProviderType::Text,
        ProviderType::Udp,
        ProviderType::Webrtc,
        ProviderType::Websocket,
    ];

    /// Wire tag, also used as the transport registry key.
    pub fn as_key(&self) -> &'static str {
        match self {
            ProviderType::Cli => "cli",
            ProviderType::Graphql => "graphql",
            ProviderType::Grpc => "grpc",
            ProviderType::Http => "http",
            ProviderType::Mcp => "mcp",
            ProviderType::Sse => "sse",
            ProviderType::Streamable => "streamable",
            ProviderType::Tcp => "tcp",
            ProviderType::Text => "text",
            ProviderType::Udp => "udp",
            ProviderType::Webrtc => "webrtc",
            ProviderType::Websocket => "websocket",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_key() == key)
    }
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_key())
    }
}

pub trait Provider: Send + Sync + std::fmt::Debug + std::any::Any {
    fn type_(&self) -> ProviderType;
    fn name(&self) -> String;

    fn as_any(&self) -> &dyn std::any::Any;
}

/// Fields every provider variant carries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseProvider {
    #[serde(default)]
    pub name: String,
    pub provider_type: ProviderType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthConfig>,
}

impl BaseProvider {
    pub fn new(name: String, provider_type: ProviderType, auth: Option<AuthConfig>) -> Self {
        Self {
            name,
            provider_type,
            auth,
        }
    }
}

impl Provider for BaseProvider {
    fn type_(&self) -> ProviderType {
        self.provider_type
    }
    fn name(&self) -> String {
        self.name.clone()
    }
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// Implements [`Provider`] for a variant struct that flattens a [`BaseProvider`].
macro_rules! impl_provider {
    ($ty:ty, $variant:expr) => {
        impl $crate::providers::base::Provider for $ty {
            fn type_(&self) -> $crate::providers::base::ProviderType {
                $variant
            }

            fn name(&self) -> String {
                self.base.name.clone()
            }

            fn as_any(&self) -> &dyn std::any::Any {
                self
            }
        }
    };
}

pub(crate) use impl_provider;

#[cfg(test)]
mod tests {
    use super::ProviderType;

    #[test]
    fn keys_round_trip_through_from_key() {
        for t in ProviderType::ALL {
            assert_eq!(ProviderType::from_key(t.as_key()), Some(t));
        }
        assert_eq!(ProviderType::from_key("http_stream"), None);
        assert_eq!(ProviderType::from_key(""), None);
    }

    #[test]
    fn serde_tag_matches_key() {
        for t in ProviderType::ALL {
            let v = serde_json::to_value(t).unwrap();
            assert_eq!(v.as_str(), Some(t.as_key()));
        }
    }
}
