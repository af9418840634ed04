use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::auth::AuthConfig;
use crate::providers::base::{impl_provider, BaseProvider, ProviderType};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphqlProvider {
    #[serde(flatten)]
    pub base: BaseProvider,
    pub url: String,
    #[serde(default = "GraphqlProvider::default_operation")]
    pub operation_type: String, // query | mutation | subscription
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,
}

impl_provider!(GraphqlProvider, ProviderType::Graphql);

impl GraphqlProvider {
    pub fn new(name: String, url: String, auth: Option<AuthConfig>) -> Self {
        Self {
            base: BaseProvider::new(name, ProviderType::Graphql, auth),
            url,
            operation_type: Self::default_operation(),
            operation_name: None,
            headers: None,
        }
    }

    fn default_operation() -> String {
        "query".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn graphql_provider_defaults_to_query() {
        let provider: GraphqlProvider = serde_json::from_value(json!({
            "name": "catalog",
            "provider_type": "graphql",
            "url": "http://localhost:4000/graphql"
        }))
        .unwrap();
        assert_eq!(provider.operation_type, "query");
        assert!(provider.operation_name.is_none());
    }

    #[test]
    fn graphql_provider_accepts_custom_operation() {
        let provider: GraphqlProvider = serde_json::from_value(json!({
            "name": "users",
            "provider_type": "graphql",
            "url": "https://example.com/graphql",
            "operation_type": "mutation",
            "operation_name": "CreateUser",
            "headers": {"Authorization": "Bearer token"}
        }))
        .unwrap();
        assert_eq!(provider.operation_type, "mutation");
        assert_eq!(provider.operation_name.as_deref(), Some("CreateUser"));
        assert_eq!(
            provider.headers.unwrap().get("Authorization").map(String::as_str),
            Some("Bearer token")
        );
    }
}
