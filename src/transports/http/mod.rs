use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{header, Client, Method, RequestBuilder};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use crate::auth::AuthConfig;
use crate::providers::base::Provider;
use crate::providers::http::HttpProvider;
use crate::stream::{boxed_vec_stream, StreamResult};
use crate::tools::Tool;
use crate::transports::ClientTransport;

pub struct HttpClientTransport {
    client: Client,
}

impl HttpClientTransport {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client })
    }

    fn downcast(prov: &dyn Provider) -> Result<&HttpProvider> {
        prov.as_any()
            .downcast_ref::<HttpProvider>()
            .ok_or_else(|| anyhow!("provider {} is not an http provider", prov.name()))
    }

    fn decorate(&self, mut builder: RequestBuilder, prov: &HttpProvider) -> Result<RequestBuilder> {
        if let Some(headers) = &prov.headers {
            for (key, value) in headers {
                builder = builder.header(key, value);
            }
        }
        match &prov.base.auth {
            Some(auth) => apply_auth(builder, auth),
            None => Ok(builder),
        }
    }
}

fn apply_auth(builder: RequestBuilder, auth: &AuthConfig) -> Result<RequestBuilder> {
    auth.validate()?;
    match auth {
        AuthConfig::ApiKey {
            api_key,
            var_name,
            location,
        } => match location.to_ascii_lowercase().as_str() {
            "query" => Ok(builder.query(&[(var_name, api_key)])),
            "cookie" => Ok(builder.header(header::COOKIE, format!("{}={}", var_name, api_key))),
            _ => Ok(builder.header(var_name, api_key)),
        },
        AuthConfig::Basic { username, password } => Ok(builder.basic_auth(username, Some(password))),
        AuthConfig::OAuth2 { .. } => Err(anyhow!(
            "OAuth2 auth is not supported by the HTTP transport"
        )),
    }
}

/// Replace `{name}` placeholders in the URL, consuming the matching arguments.
fn expand_url(template: &str, args: &mut HashMap<String, Value>) -> String {
    let mut url = template.to_string();
    args.retain(|key, value| {
        let placeholder = format!("{{{}}}", key);
        if !url.contains(&placeholder) {
            return true;
        }
        let rendered = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        url = url.replace(&placeholder, &rendered);
        false
    });
    url
}

/// Extract tool definitions from a UTCP manual body (`{"tools": [...]}`).
fn tools_from_manual(manual: &Value) -> Vec<Tool> {
    manual
        .get("tools")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| serde_json::from_value::<Tool>(item.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl ClientTransport for HttpClientTransport {
    async fn register_tool_provider(&self, prov: &dyn Provider) -> Result<Vec<Tool>> {
        let http_prov = Self::downcast(prov)?;
        let request = self.decorate(self.client.get(&http_prov.url), http_prov)?;
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(anyhow!(
                "failed to fetch tools from {}: {}",
                http_prov.url,
                response.status()
            ));
        }
        let manual: Value = response.json().await?;
        let tools = tools_from_manual(&manual);
        debug!(provider = %http_prov.base.name, count = tools.len(), "fetched http manual");
        Ok(tools)
    }

    async fn deregister_tool_provider(&self, _prov: &dyn Provider) -> Result<()> {
        Ok(())
    }

    async fn call_tool(
        &self,
        tool_name: &str,
        mut args: HashMap<String, Value>,
        prov: &dyn Provider,
    ) -> Result<Value> {
        let http_prov = Self::downcast(prov)?;
        let url = expand_url(&http_prov.url, &mut args);
        let method = Method::from_bytes(http_prov.http_method.to_uppercase().as_bytes())
            .map_err(|_| anyhow!("unsupported HTTP method: {}", http_prov.http_method))?;

        let mut request = self.decorate(self.client.request(method.clone(), &url), http_prov)?;
        if method == Method::POST || method == Method::PUT || method == Method::PATCH {
            request = match &http_prov.body_field {
                Some(field) => request.json(&args.remove(field).unwrap_or(Value::Null)),
                None => request.json(&args),
            };
        } else {
            let query: Vec<(String, String)> = args
                .iter()
                .map(|(k, v)| match v {
                    Value::String(s) => (k.clone(), s.clone()),
                    other => (k.clone(), other.to_string()),
                })
                .collect();
            request = request.query(&query);
        }

        debug!(tool = tool_name, %url, "calling http tool");
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP request failed with status: {}",
                response.status()
            ));
        }
        Ok(response.json().await?)
    }

    /// Plain HTTP has no incremental results; the whole body is one chunk.
    async fn call_tool_stream(
        &self,
        tool_name: &str,
        args: HashMap<String, Value>,
        prov: &dyn Provider,
    ) -> Result<Box<dyn StreamResult>> {
        let value = self.call_tool(tool_name, args, prov).await?;
        Ok(boxed_vec_stream(vec![value]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;
    use std::net::TcpListener;

    fn spawn_server() -> String {
        let app = Router::new()
            .route(
                "/manual",
                get(|| async {
                    Json(json!({
                        "tools": [
                            {"name": "echo", "description": "Echo the body", "tags": ["util"]},
                            {"description": "missing name is skipped"}
                        ]
                    }))
                }),
            )
            .route("/echo", post(|Json(body): Json<Value>| async move { Json(json!({"body": body})) }))
            .route(
                "/users/42",
                get(|Query(q): Query<HashMap<String, String>>| async move { Json(json!({"query": q})) }),
            );

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::Server::from_tcp(listener)
                .unwrap()
                .serve(app.into_make_service())
                .await
                .unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn expand_url_consumes_placeholder_args() {
        let mut args = HashMap::from([
            ("id".to_string(), json!(42)),
            ("name".to_string(), json!("ada")),
            ("verbose".to_string(), json!(true)),
        ]);
        let url = expand_url("http://h/users/{id}/{name}", &mut args);
        assert_eq!(url, "http://h/users/42/ada");
        assert_eq!(args.len(), 1);
        assert!(args.contains_key("verbose"));
    }

    #[tokio::test]
    async fn registers_tools_from_manual() {
        let base = spawn_server();
        let transport = HttpClientTransport::new().unwrap();
        let provider = HttpProvider::new("svc".into(), format!("{base}/manual"), "GET".into(), None);

        let tools = transport.register_tool_provider(&provider).await.unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "echo");
    }

    #[tokio::test]
    async fn post_sends_json_body_and_get_sends_query() {
        let base = spawn_server();
        let transport = HttpClientTransport::new().unwrap();

        let post_provider = HttpProvider::new("svc".into(), format!("{base}/echo"), "POST".into(), None);
        let args = HashMap::from([("msg".to_string(), json!("hi"))]);
        let result = transport.call_tool("svc.echo", args, &post_provider).await.unwrap();
        assert_eq!(result, json!({"body": {"msg": "hi"}}));

        let get_provider =
            HttpProvider::new("svc".into(), format!("{base}/users/{{id}}"), "GET".into(), None);
        let args = HashMap::from([("id".to_string(), json!(42)), ("q".to_string(), json!("x"))]);
        let mut stream = transport
            .call_tool_stream("svc.user", args, &get_provider)
            .await
            .unwrap();
        assert_eq!(stream.next().await.unwrap(), Some(json!({"query": {"q": "x"}})));
        assert_eq!(stream.next().await.unwrap(), None);
    }

    #[tokio::test]
    async fn rejects_non_http_providers() {
        let transport = HttpClientTransport::new().unwrap();
        let provider = crate::providers::cli::CliProvider::new("shell".into(), "ls".into(), None);
        let err = transport.register_tool_provider(&provider).await.unwrap_err();
        assert!(err.to_string().contains("not an http provider"));
    }
}
