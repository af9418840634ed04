//! The tool-calling backend the bridge delegates to.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::config::BridgeConfig;
use crate::providers::base::Provider;
use crate::repository::ToolRepository;
use crate::stream::StreamResult;
use crate::tools::{Tool, ToolSearchStrategy};
use crate::transports::registry::TransportRegistry;
use crate::transports::ClientTransport;

#[async_trait]
pub trait UtcpClientInterface: Send + Sync {
    async fn register_tool_provider(&self, prov: Arc<dyn Provider>) -> Result<Vec<Tool>>;
    async fn deregister_tool_provider(&self, provider_name: &str) -> Result<()>;
    async fn call_tool(&self, tool_name: &str, args: HashMap<String, Value>) -> Result<Value>;
    async fn search_tools(&self, query: &str, limit: usize) -> Result<Vec<Tool>>;
    async fn call_tool_stream(
        &self,
        tool_name: &str,
        args: HashMap<String, Value>,
    ) -> Result<Box<dyn StreamResult>>;
}

/// In-process backend: routes calls to transports by provider family and
/// keeps registered tools in a [`ToolRepository`].
pub struct UtcpClient {
    transports: TransportRegistry,
    tool_repository: Arc<dyn ToolRepository>,
    search_strategy: Arc<dyn ToolSearchStrategy>,
    provider_tools_cache: RwLock<HashMap<String, Vec<Tool>>>,
}

impl UtcpClient {
    pub fn new(
        transports: TransportRegistry,
        repo: Arc<dyn ToolRepository>,
        strat: Arc<dyn ToolSearchStrategy>,
    ) -> Self {
        Self {
            transports,
            tool_repository: repo,
            search_strategy: strat,
            provider_tools_cache: RwLock::new(HashMap::new()),
        }
    }

    /// Build a client and register every provider listed in the configured
    /// providers file. A provider that fails to register is logged and skipped.
    pub async fn new_with_providers(
        config: &BridgeConfig,
        transports: TransportRegistry,
        repo: Arc<dyn ToolRepository>,
        strat: Arc<dyn ToolSearchStrategy>,
    ) -> Result<Self> {
        let client = Self::new(transports, repo, strat);

        if let Some(path) = &config.providers_file_path {
            let providers = crate::loader::load_providers_from_file(path, config).await?;
            for provider in providers {
                let name = provider.name();
                match client.register_tool_provider(provider).await {
                    Ok(tools) => info!(provider = %name, tools = tools.len(), "loaded provider"),
                    Err(e) => warn!(provider = %name, error = %e, "failed to load provider"),
                }
            }
        }

        Ok(client)
    }

    fn transport_for(&self, prov: &dyn Provider) -> Result<Arc<dyn ClientTransport>> {
        let provider_type = prov.type_();
        self.transports
            .get(provider_type)
            .ok_or_else(|| anyhow!("no transport found for provider type: {}", provider_type))
    }

    async fn resolve(&self, tool_name: &str) -> Result<(Arc<dyn Provider>, Arc<dyn ClientTransport>)> {
        let (provider_name, _) = tool_name.split_once('.').ok_or_else(|| {
            anyhow!(
                "invalid tool name format, expected 'provider.tool', got: {}",
                tool_name
            )
        })?;

        let prov = self
            .tool_repository
            .get_provider(provider_name)
            .await?
            .ok_or_else(|| anyhow!("provider not found: {}", provider_name))?;
        let transport = self.transport_for(prov.as_ref())?;
        Ok((prov, transport))
    }
}

#[async_trait]
impl UtcpClientInterface for UtcpClient {
    async fn register_tool_provider(&self, prov: Arc<dyn Provider>) -> Result<Vec<Tool>> {
        let provider_name = prov.name();
        if provider_name.is_empty() {
            return Err(anyhow!("provider name must not be empty"));
        }

        if let Some(tools) = self.provider_tools_cache.read().await.get(&provider_name) {
            return Ok(tools.clone());
        }

        // Held across discovery so concurrent registrations of one name discover once.
        let mut cache = self.provider_tools_cache.write().await;
        if let Some(tools) = cache.get(&provider_name) {
            return Ok(tools.clone());
        }

        let transport = self.transport_for(prov.as_ref())?;
        let prefix = format!("{}.", provider_name);
        let tools: Vec<Tool> = transport
            .register_tool_provider(prov.as_ref())
            .await?
            .into_iter()
            .map(|mut tool| {
                if !tool.name.starts_with(&prefix) {
                    tool.name = format!("{}{}", prefix, tool.name.trim_start_matches('.'));
                }
                tool
            })
            .collect();

        self.tool_repository
            .save_provider_with_tools(prov, tools.clone())
            .await?;
        cache.insert(provider_name, tools.clone());

        Ok(tools)
    }

    async fn deregister_tool_provider(&self, provider_name: &str) -> Result<()> {
        let prov = self
            .tool_repository
            .get_provider(provider_name)
            .await?
            .ok_or_else(|| anyhow!("provider not found: {}", provider_name))?;

        let tools = self.tool_repository.get_tools_by_provider(provider_name).await?;

        self.transport_for(prov.as_ref())?
            .deregister_tool_provider(prov.as_ref())
            .await?;
        self.tool_repository.remove_provider(provider_name).await?;
        self.provider_tools_cache.write().await.remove(provider_name);
        info!(provider = %provider_name, tools = tools.len(), "deregistered provider");
        Ok(())
    }

    async fn call_tool(&self, tool_name: &str, args: HashMap<String, Value>) -> Result<Value> {
        let (prov, transport) = self.resolve(tool_name).await?;
        transport.call_tool(tool_name, args, prov.as_ref()).await
    }

    async fn search_tools(&self, query: &str, limit: usize) -> Result<Vec<Tool>> {
        self.search_strategy.search_tools(query, limit).await
    }

    async fn call_tool_stream(
        &self,
        tool_name: &str,
        args: HashMap<String, Value>,
    ) -> Result<Box<dyn StreamResult>> {
        let (prov, transport) = self.resolve(tool_name).await?;
        transport
            .call_tool_stream(tool_name, args, prov.as_ref())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::base::ProviderType;
    use crate::providers::cli::CliProvider;
    use crate::providers::tcp::TcpProvider;
    use crate::repository::in_memory::InMemoryToolRepository;
    use crate::stream::boxed_vec_stream;
    use crate::tag::tag_search::TagSearchStrategy;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct EchoTransport {
        discoveries: AtomicUsize,
        discovery_delay: Duration,
    }

    #[async_trait]
    impl ClientTransport for EchoTransport {
        async fn register_tool_provider(&self, _prov: &dyn Provider) -> Result<Vec<Tool>> {
            self.discoveries.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.discovery_delay).await;
            Ok(vec![
                Tool::new("list", "List files").with_tags(&["files"]),
                Tool::new("shell.pwd", "Print directory"),
            ])
        }

        async fn deregister_tool_provider(&self, _prov: &dyn Provider) -> Result<()> {
            Ok(())
        }

        async fn call_tool(
            &self,
            tool_name: &str,
            args: HashMap<String, Value>,
            prov: &dyn Provider,
        ) -> Result<Value> {
            Ok(json!({"tool": tool_name, "provider": prov.name(), "args": args}))
        }

        async fn call_tool_stream(
            &self,
            tool_name: &str,
            _args: HashMap<String, Value>,
            _prov: &dyn Provider,
        ) -> Result<Box<dyn StreamResult>> {
            Ok(boxed_vec_stream(vec![json!(tool_name)]))
        }
    }

    fn client_with(transport: Arc<EchoTransport>) -> UtcpClient {
        let mut transports = TransportRegistry::new();
        transports.register(ProviderType::Cli, transport);
        let repo = Arc::new(InMemoryToolRepository::new());
        let search = Arc::new(TagSearchStrategy::new(repo.clone(), 1.0).unwrap());
        UtcpClient::new(transports, repo, search)
    }

    #[tokio::test]
    async fn registration_prefixes_and_caches_tools() {
        let transport = Arc::new(EchoTransport::default());
        let client = client_with(transport.clone());
        let provider = Arc::new(CliProvider::new("shell".into(), "sh".into(), None));

        let tools = client.register_tool_provider(provider.clone()).await.unwrap();
        let names: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["shell.list", "shell.pwd"]);

        client.register_tool_provider(provider).await.unwrap();
        assert_eq!(transport.discoveries.load(Ordering::SeqCst), 1);

        let found = client.search_tools("files", 5).await.unwrap();
        assert_eq!(found[0].name, "shell.list");
    }

    #[tokio::test]
    async fn concurrent_registrations_discover_once() {
        let transport = Arc::new(EchoTransport {
            discovery_delay: Duration::from_millis(20),
            ..Default::default()
        });
        let client = client_with(transport.clone());
        let provider = Arc::new(CliProvider::new("shell".into(), "sh".into(), None));

        let (first, second) = tokio::join!(
            client.register_tool_provider(provider.clone()),
            client.register_tool_provider(provider)
        );
        assert_eq!(first.unwrap(), second.unwrap());
        assert_eq!(transport.discoveries.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn calls_route_through_provider_transport() {
        let client = client_with(Arc::new(EchoTransport::default()));
        client
            .register_tool_provider(Arc::new(CliProvider::new("shell".into(), "sh".into(), None)))
            .await
            .unwrap();

        let out = client
            .call_tool("shell.list", HashMap::from([("dir".into(), json!("/tmp"))]))
            .await
            .unwrap();
        assert_eq!(out["provider"], "shell");
        assert_eq!(out["args"]["dir"], "/tmp");

        let mut stream = client.call_tool_stream("shell.list", HashMap::new()).await.unwrap();
        assert_eq!(stream.next().await.unwrap(), Some(json!("shell.list")));
    }

    #[tokio::test]
    async fn unknown_names_and_missing_transports_fail() {
        let client = client_with(Arc::new(EchoTransport::default()));

        let err = client.call_tool("noprefix", HashMap::new()).await.unwrap_err();
        assert!(err.to_string().contains("expected 'provider.tool'"));

        let err = client.call_tool("ghost.tool", HashMap::new()).await.unwrap_err();
        assert!(err.to_string().contains("provider not found: ghost"));

        let tcp = Arc::new(TcpProvider::new("raw".into(), "127.0.0.1".into(), 9000, None));
        let err = client.register_tool_provider(tcp).await.unwrap_err();
        assert!(err.to_string().contains("no transport found for provider type: tcp"));
    }

    #[tokio::test]
    async fn deregistration_forgets_provider() {
        let client = client_with(Arc::new(EchoTransport::default()));
        client
            .register_tool_provider(Arc::new(CliProvider::new("shell".into(), "sh".into(), None)))
            .await
            .unwrap();

        client.deregister_tool_provider("shell").await.unwrap();
        assert!(client.call_tool("shell.list", HashMap::new()).await.is_err());
        assert!(client.search_tools("files", 5).await.unwrap().is_empty());
        assert!(client.deregister_tool_provider("shell").await.is_err());
    }
}
