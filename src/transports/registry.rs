use std::collections::HashMap;
use std::sync::Arc;

use crate::providers::base::ProviderType;
use crate::transports::ClientTransport;

/// Transports keyed by the provider family they serve.
#[derive(Clone, Default)]
pub struct TransportRegistry {
    map: HashMap<ProviderType, Arc<dyn ClientTransport>>,
}

impl TransportRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the transports this crate ships.
    pub fn with_default_transports() -> anyhow::Result<Self> {
        let mut reg = Self::new();
        reg.register(
            ProviderType::Http,
            Arc::new(crate::transports::http::HttpClientTransport::new()?),
        );
        Ok(reg)
    }

    pub fn register(&mut self, provider_type: ProviderType, transport: Arc<dyn ClientTransport>) {
        self.map.insert(provider_type, transport);
    }

    pub fn get(&self, provider_type: ProviderType) -> Option<Arc<dyn ClientTransport>> {
        self.map.get(&provider_type).cloned()
    }

    pub fn supported(&self) -> Vec<ProviderType> {
        let mut keys: Vec<_> = self.map.keys().copied().collect();
        keys.sort_by_key(|t| t.as_key());
        keys
    }
}
