use serde::{Deserialize, Serialize};

use crate::auth::AuthConfig;
use crate::providers::base::{impl_provider, BaseProvider, ProviderType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IceServer {
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebRtcProvider {
    #[serde(flatten)]
    pub base: BaseProvider,

    /// Signaling server URL (WebSocket or HTTP)
    pub signaling_server: String,

    #[serde(default = "default_ice_servers")]
    pub ice_servers: Vec<IceServer>,

    #[serde(default = "default_channel_label")]
    pub channel_label: String,

    #[serde(default = "default_true")]
    pub ordered: bool,

    /// Only meaningful for unordered channels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_packet_life_time: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retransmits: Option<u16>,
}

fn default_ice_servers() -> Vec<IceServer> {
    vec![IceServer {
        urls: vec!["stun:stun.l.google.com:19302".to_string()],
        username: None,
        credential: None,
    }]
}

fn default_channel_label() -> String {
    "utcp-data".to_string()
}

fn default_true() -> bool {
    true
}

impl_provider!(WebRtcProvider, ProviderType::Webrtc);

impl WebRtcProvider {
    pub fn new(name: String, signaling_server: String, auth: Option<AuthConfig>) -> Self {
        Self {
            base: BaseProvider::new(name, ProviderType::Webrtc, auth),
            signaling_server,
            ice_servers: default_ice_servers(),
            channel_label: default_channel_label(),
            ordered: true,
            max_packet_life_time: None,
            max_retransmits: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_fill_in_ice_and_channel() {
        let provider: WebRtcProvider = serde_json::from_value(json!({
            "name": "peer",
            "provider_type": "webrtc",
            "signaling_server": "wss://signal.example.com"
        }))
        .unwrap();
        assert_eq!(provider.ice_servers, default_ice_servers());
        assert_eq!(provider.channel_label, "utcp-data");
        assert!(provider.ordered);
    }
}
