pub mod auth;
pub mod bridge;
pub mod chain;
pub mod client;
pub mod coerce;
pub mod config;
pub mod errors;
pub mod loader;
pub mod providers;
pub mod repository;
pub mod server;
pub mod stream;
pub mod tag;
pub mod tools;
pub mod transports;

pub use bridge::{ToolResponse, UtcpMcpBridge};
pub use chain::{ChainRequest, ChainStep, SequentialChainClient, UtcpChainClient};
pub use client::{UtcpClient, UtcpClientInterface};
pub use config::BridgeConfig;
pub use errors::{BridgeError, BridgeResult};
pub use providers::ProviderDescriptor;
pub use server::McpServer;
