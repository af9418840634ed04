use crate::providers::base::Provider;
use crate::repository::ToolRepository;
use crate::tools::Tool;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

struct Entry {
    provider: Arc<dyn Provider>,
    tools: Vec<Tool>,
}

/// Process-local repository keyed by provider name.
#[derive(Default)]
pub struct InMemoryToolRepository {
    entries: RwLock<BTreeMap<String, Entry>>,
}

impl InMemoryToolRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ToolRepository for InMemoryToolRepository {
    async fn save_provider_with_tools(
        &self,
        provider: Arc<dyn Provider>,
        tools: Vec<Tool>,
    ) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(provider.name(), Entry { provider, tools });
        Ok(())
    }

    async fn get_provider(&self, name: &str) -> Result<Option<Arc<dyn Provider>>> {
        Ok(self
            .entries
            .read()
            .await
            .get(name)
            .map(|e| e.provider.clone()))
    }

    async fn remove_provider(&self, name: &str) -> Result<()> {
        self.entries
            .write()
            .await
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| anyhow!("provider not found: {}", name))
    }

    async fn get_tools(&self) -> Result<Vec<Tool>> {
        Ok(self
            .entries
            .read()
            .await
            .values()
            .flat_map(|e| e.tools.iter().cloned())
            .collect())
    }

    async fn get_tools_by_provider(&self, provider_name: &str) -> Result<Vec<Tool>> {
        self.entries
            .read()
            .await
            .get(provider_name)
            .map(|e| e.tools.clone())
            .ok_or_else(|| anyhow!("no tools found for provider {}", provider_name))
    }
}
