use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::auth::AuthConfig;
use crate::providers::base::{impl_provider, BaseProvider, ProviderType};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpProvider {
    #[serde(flatten)]
    pub base: BaseProvider,
    #[serde(default = "HttpProvider::default_method")]
    pub http_method: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_fields: Option<Vec<String>>,
}

impl_provider!(HttpProvider, ProviderType::Http);

impl HttpProvider {
    pub fn new(name: String, url: String, http_method: String, auth: Option<AuthConfig>) -> Self {
        Self {
            base: BaseProvider::new(name, ProviderType::Http, auth),
            http_method,
            url,
            content_type: Some("application/json".to_string()),
            headers: None,
            body_field: None,
            header_fields: None,
        }
    }

    fn default_method() -> String {
        "GET".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn http_provider_deserialization() {
        let provider: HttpProvider = serde_json::from_value(json!({
            "name": "weather",
            "provider_type": "http",
            "url": "http://example.com",
            "http_method": "POST"
        }))
        .unwrap();
        assert_eq!(provider.base.name, "weather");
        assert_eq!(provider.http_method, "POST");
        assert!(provider.content_type.is_none());
    }

    #[test]
    fn http_method_defaults_to_get() {
        let provider: HttpProvider = serde_json::from_value(json!({
            "provider_type": "http",
            "url": "http://example.com/utcp"
        }))
        .unwrap();
        assert_eq!(provider.http_method, "GET");
        assert_eq!(provider.base.name, "");
    }
}
