use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for provider auth blocks.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AuthError {
    #[error("API key must be provided")]
    MissingApiKey,
    #[error("Location must be 'header', 'query', or 'cookie'")]
    InvalidLocation,
    #[error("Username must be provided")]
    MissingUsername,
    #[error("Password must be provided")]
    MissingPassword,
    #[error("Token URL must be provided")]
    MissingTokenUrl,
    #[error("Client ID must be provided")]
    MissingClientId,
}

/// Auth block attached to a provider descriptor, selected by its `auth_type` tag.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "auth_type", rename_all = "snake_case")]
pub enum AuthConfig {
    ApiKey {
        api_key: String,
        #[serde(default = "default_var_name")]
        var_name: String,
        #[serde(default = "default_location")]
        location: String,
    },
    Basic {
        username: String,
        password: String,
    },
    #[serde(rename = "oauth2")]
    OAuth2 {
        token_url: String,
        client_id: String,
        client_secret: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        scope: Option<String>,
    },
}

fn default_var_name() -> String {
    "X-Api-Key".to_string()
}

fn default_location() -> String {
    "header".to_string()
}

impl AuthConfig {
    pub fn api_key(api_key: impl Into<String>) -> Self {
        AuthConfig::ApiKey {
            api_key: api_key.into(),
            var_name: default_var_name(),
            location: default_location(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AuthConfig::ApiKey { .. } => "api_key",
            AuthConfig::Basic { .. } => "basic",
            AuthConfig::OAuth2 { .. } => "oauth2",
        }
    }

    pub fn validate(&self) -> Result<(), AuthError> {
        match self {
            AuthConfig::ApiKey {
                api_key, location, ..
            } => {
                if api_key.is_empty() {
                    return Err(AuthError::MissingApiKey);
                }
                match location.to_ascii_lowercase().as_str() {
                    "header" | "query" | "cookie" => Ok(()),
                    _ => Err(AuthError::InvalidLocation),
                }
            }
            AuthConfig::Basic { username, password } => {
                if username.is_empty() {
                    return Err(AuthError::MissingUsername);
                }
                if password.is_empty() {
                    return Err(AuthError::MissingPassword);
                }
                Ok(())
            }
            AuthConfig::OAuth2 {
                token_url,
                client_id,
                ..
            } => {
                if token_url.is_empty() {
                    return Err(AuthError::MissingTokenUrl);
                }
                if client_id.is_empty() {
                    return Err(AuthError::MissingClientId);
                }
                Ok(())
            }
        }
    }
}

// Secrets never reach the logs.
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthConfig::ApiKey {
                var_name, location, ..
            } => f
                .debug_struct("ApiKey")
                .field("api_key", &"[REDACTED]")
                .field("var_name", var_name)
                .field("location", location)
                .finish(),
            AuthConfig::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"[REDACTED]")
                .finish(),
            AuthConfig::OAuth2 {
                token_url,
                client_id,
                scope,
                ..
            } => f
                .debug_struct("OAuth2")
                .field("token_url", token_url)
                .field("client_id", client_id)
                .field("client_secret", &"[REDACTED]")
                .field("scope", scope)
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn api_key_defaults_to_header() {
        let auth: AuthConfig =
            serde_json::from_value(json!({"auth_type": "api_key", "api_key": "k"})).unwrap();
        assert_eq!(auth, AuthConfig::api_key("k"));
        assert!(auth.validate().is_ok());
    }

    #[test]
    fn validation_rejects_empty_credentials() {
        let basic: AuthConfig = serde_json::from_value(
            json!({"auth_type": "basic", "username": "", "password": "p"}),
        )
        .unwrap();
        assert_eq!(basic.validate(), Err(AuthError::MissingUsername));

        let key = AuthConfig::ApiKey {
            api_key: "k".into(),
            var_name: "X".into(),
            location: "body".into(),
        };
        assert_eq!(key.validate(), Err(AuthError::InvalidLocation));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let auth: AuthConfig = serde_json::from_value(json!({
            "auth_type": "oauth2",
            "token_url": "https://auth.example.com/token",
            "client_id": "id",
            "client_secret": "hunter2"
        }))
        .unwrap();
        let rendered = format!("{auth:?}");
        assert!(!rendered.contains("hunter2"));
        assert_eq!(auth.kind(), "oauth2");
    }
}
