use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Environment variable naming a providers file to register at startup.
pub const PROVIDERS_FILE_ENV: &str = "UTCP_PROVIDERS_FILE";

pub const DEFAULT_SERVER_NAME: &str = "utcp-bridge";
pub const DEFAULT_SERVER_VERSION: &str = "1.0.0";

#[async_trait]
pub trait UtcpVariablesConfig: Send + Sync {
    async fn load(&self) -> Result<HashMap<String, String>>;
    async fn get(&self, key: &str) -> Result<String>;
}

#[derive(Clone)]
pub struct BridgeConfig {
    pub variables: HashMap<String, String>,
    pub providers_file_path: Option<PathBuf>,
    pub load_variables_from: Vec<Arc<dyn UtcpVariablesConfig>>,
    pub server_name: String,
    pub server_version: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            variables: HashMap::new(),
            providers_file_path: None,
            load_variables_from: Vec::new(),
            server_name: DEFAULT_SERVER_NAME.to_string(),
            server_version: DEFAULT_SERVER_VERSION.to_string(),
        }
    }
}

impl BridgeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults, with the providers file taken from `UTCP_PROVIDERS_FILE` when set.
    pub fn from_env() -> Self {
        let config = Self::default();
        match std::env::var(PROVIDERS_FILE_ENV) {
            Ok(path) if !path.trim().is_empty() => config.with_providers_file(PathBuf::from(path)),
            _ => config,
        }
    }

    pub fn with_providers_file(mut self, path: PathBuf) -> Self {
        self.providers_file_path = Some(path);
        self
    }

    pub fn with_variable(mut self, key: String, value: String) -> Self {
        self.variables.insert(key, value);
        self
    }

    pub fn with_variables(mut self, vars: HashMap<String, String>) -> Self {
        self.variables.extend(vars);
        self
    }

    pub fn with_variable_loader(mut self, loader: Arc<dyn UtcpVariablesConfig>) -> Self {
        self.load_variables_from.push(loader);
        self
    }

    /// Inline variables first, then loaders in order, then the process environment.
    pub async fn get_variable(&self, key: &str) -> Option<String> {
        if let Some(val) = self.variables.get(key) {
            return Some(val.clone());
        }

        for loader in &self.load_variables_from {
            if let Ok(val) = loader.get(key).await {
                return Some(val);
            }
        }

        std::env::var(key).ok()
    }

    /// Every variable known from inline values and loaders, inline values winning.
    pub async fn resolved_variables(&self) -> HashMap<String, String> {
        let mut vars = HashMap::new();
        for loader in self.load_variables_from.iter().rev() {
            if let Ok(loaded) = loader.load().await {
                vars.extend(loaded);
            }
        }
        vars.extend(self.variables.clone());
        vars
    }
}

/// Reads `KEY=value` lines from a dotenv-style file.
pub struct DotEnvLoader {
    file_path: PathBuf,
}

impl DotEnvLoader {
    pub fn new(file_path: PathBuf) -> Self {
        Self { file_path }
    }
}

#[async_trait]
impl UtcpVariablesConfig for DotEnvLoader {
    async fn load(&self) -> Result<HashMap<String, String>> {
        let contents = tokio::fs::read_to_string(&self.file_path).await?;
        Ok(contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| line.split_once('='))
            .map(|(key, value)| {
                (
                    key.trim().to_string(),
                    value.trim().trim_matches('"').to_string(),
                )
            })
            .collect())
    }

    async fn get(&self, key: &str) -> Result<String> {
        self.load()
            .await?
            .remove(key)
            .ok_or_else(|| anyhow!("variable {} not found", key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn inline_variables_take_precedence_over_loaders() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# comment\nAPI_HOST=\"loader.example.com\"\nTOKEN=abc").unwrap();

        let config = BridgeConfig::new()
            .with_variable("API_HOST".into(), "inline.example.com".into())
            .with_variable_loader(Arc::new(DotEnvLoader::new(file.path().to_path_buf())));

        assert_eq!(config.get_variable("API_HOST").await.as_deref(), Some("inline.example.com"));
        assert_eq!(config.get_variable("TOKEN").await.as_deref(), Some("abc"));

        let all = config.resolved_variables().await;
        assert_eq!(all.get("API_HOST").map(String::as_str), Some("inline.example.com"));
        assert_eq!(all.get("TOKEN").map(String::as_str), Some("abc"));
    }

    #[test]
    fn defaults_identify_the_bridge() {
        let config = BridgeConfig::default();
        assert_eq!(config.server_name, "utcp-bridge");
        assert_eq!(config.server_version, "1.0.0");
        assert!(config.providers_file_path.is_none());
    }
}
