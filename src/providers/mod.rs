//! Provider descriptors and the tag-driven decoder that builds them.
//!
//! A raw provider configuration is decoded in two passes: the `provider_type`
//! tag is read first, then the whole payload is decoded into the one variant
//! that tag names. There is no fallback variant.

pub mod base;
pub mod cli;
pub mod graphql;
pub mod grpc;
pub mod http;
pub mod mcp;
pub mod sse;
pub mod streamable;
pub mod tcp;
pub mod text;
pub mod udp;
pub mod webrtc;
pub mod websocket;

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use serde_json::Value;

use crate::errors::{BridgeError, BridgeResult};
use base::{Provider, ProviderType};

/// A fully decoded provider configuration, one variant per transport family.
#[derive(Debug, Clone)]
pub enum ProviderDescriptor {
    Cli(cli::CliProvider),
    Graphql(graphql::GraphqlProvider),
    Grpc(grpc::GrpcProvider),
    Http(http::HttpProvider),
    Mcp(mcp::McpProvider),
    Sse(sse::SseProvider),
    Streamable(streamable::StreamableHttpProvider),
    Tcp(tcp::TcpProvider),
    Text(text::TextProvider),
    Udp(udp::UdpProvider),
    Webrtc(webrtc::WebRtcProvider),
    Websocket(websocket::WebSocketProvider),
}

impl ProviderDescriptor {
    pub fn provider_type(&self) -> ProviderType {
        self.as_provider().type_()
    }

    pub fn name(&self) -> String {
        self.as_provider().name()
    }

    pub fn as_provider(&self) -> &dyn Provider {
        match self {
            ProviderDescriptor::Cli(p) => p,
            ProviderDescriptor::Graphql(p) => p,
            ProviderDescriptor::Grpc(p) => p,
            ProviderDescriptor::Http(p) => p,
            ProviderDescriptor::Mcp(p) => p,
            ProviderDescriptor::Sse(p) => p,
            ProviderDescriptor::Streamable(p) => p,
            ProviderDescriptor::Tcp(p) => p,
            ProviderDescriptor::Text(p) => p,
            ProviderDescriptor::Udp(p) => p,
            ProviderDescriptor::Webrtc(p) => p,
            ProviderDescriptor::Websocket(p) => p,
        }
    }

    /// Hands the concrete variant over as a shared trait object.
    pub fn into_provider(self) -> Arc<dyn Provider> {
        match self {
            ProviderDescriptor::Cli(p) => Arc::new(p),
            ProviderDescriptor::Graphql(p) => Arc::new(p),
            ProviderDescriptor::Grpc(p) => Arc::new(p),
            ProviderDescriptor::Http(p) => Arc::new(p),
            ProviderDescriptor::Mcp(p) => Arc::new(p),
            ProviderDescriptor::Sse(p) => Arc::new(p),
            ProviderDescriptor::Streamable(p) => Arc::new(p),
            ProviderDescriptor::Tcp(p) => Arc::new(p),
            ProviderDescriptor::Text(p) => Arc::new(p),
            ProviderDescriptor::Udp(p) => Arc::new(p),
            ProviderDescriptor::Webrtc(p) => Arc::new(p),
            ProviderDescriptor::Websocket(p) => Arc::new(p),
        }
    }
}

type DecodeFn = fn(Value) -> Result<ProviderDescriptor, serde_json::Error>;

struct VariantDecoder {
    variant: &'static str,
    decode: DecodeFn,
}

macro_rules! variant {
    ($ty:path, $ctor:path, $label:literal) => {
        VariantDecoder {
            variant: $label,
            decode: |value| serde_json::from_value::<$ty>(value).map($ctor),
        }
    };
}

static DECODERS: Lazy<HashMap<ProviderType, VariantDecoder>> = Lazy::new(|| {
    let mut map = HashMap::new();
    map.insert(
        ProviderType::Cli,
        variant!(cli::CliProvider, ProviderDescriptor::Cli, "CliProvider"),
    );
    map.insert(
        ProviderType::Graphql,
        variant!(
            graphql::GraphqlProvider,
            ProviderDescriptor::Graphql,
            "GraphqlProvider"
        ),
    );
    map.insert(
        ProviderType::Grpc,
        variant!(grpc::GrpcProvider, ProviderDescriptor::Grpc, "GrpcProvider"),
    );
    map.insert(
        ProviderType::Http,
        variant!(http::HttpProvider, ProviderDescriptor::Http, "HttpProvider"),
    );
    map.insert(
        ProviderType::Mcp,
        variant!(mcp::McpProvider, ProviderDescriptor::Mcp, "McpProvider"),
    );
    map.insert(
        ProviderType::Sse,
        variant!(sse::SseProvider, ProviderDescriptor::Sse, "SseProvider"),
    );
    map.insert(
        ProviderType::Streamable,
        variant!(
            streamable::StreamableHttpProvider,
            ProviderDescriptor::Streamable,
            "StreamableHttpProvider"
        ),
    );
    map.insert(
        ProviderType::Tcp,
        variant!(tcp::TcpProvider, ProviderDescriptor::Tcp, "TcpProvider"),
    );
    map.insert(
        ProviderType::Text,
        variant!(text::TextProvider, ProviderDescriptor::Text, "TextProvider"),
    );
    map.insert(
        ProviderType::Udp,
        variant!(udp::UdpProvider, ProviderDescriptor::Udp, "UdpProvider"),
    );
    map.insert(
        ProviderType::Webrtc,
        variant!(
            webrtc::WebRtcProvider,
            ProviderDescriptor::Webrtc,
            "WebRtcProvider"
        ),
    );
    map.insert(
        ProviderType::Websocket,
        variant!(
            websocket::WebSocketProvider,
            ProviderDescriptor::Websocket,
            "WebSocketProvider"
        ),
    );
    map
});

/// Decode a raw JSON provider configuration.
pub fn decode(raw: &[u8]) -> BridgeResult<ProviderDescriptor> {
    let value: Value =
        serde_json::from_slice(raw).map_err(|source| BridgeError::MalformedProviderPayload {
            variant: "provider",
            source,
        })?;
    decode_value(value)
}

/// Decode an already-parsed provider configuration.
pub fn decode_value(value: Value) -> BridgeResult<ProviderDescriptor> {
    let provider_type = match value.get("provider_type") {
        Some(Value::String(tag)) => ProviderType::from_key(tag)
            .ok_or_else(|| BridgeError::UnsupportedProviderType(tag.clone()))?,
        Some(other) => return Err(BridgeError::UnsupportedProviderType(other.to_string())),
        None => return Err(BridgeError::UnsupportedProviderType(String::new())),
    };

    let decoder = DECODERS
        .get(&provider_type)
        .ok_or_else(|| BridgeError::UnsupportedProviderType(provider_type.to_string()))?;

    let descriptor =
        (decoder.decode)(value).map_err(|source| BridgeError::MalformedProviderPayload {
            variant: decoder.variant,
            source,
        })?;

    debug_assert_eq!(descriptor.provider_type(), provider_type);
    Ok(descriptor)
}
