use crate::error::ServiceError;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::error;

/// Generic JSON request executor: one connection pool, a base URL, and
/// the API-key header every service here authenticates with.
///
/// Service clients compose an executor with their fixed URL prefix
/// instead of inheriting from a shared base.
#[derive(Debug, Clone)]
pub struct RequestExecutor {
    client: Client,
    base_url: String,
    api_key: String,
    name: String,
}

impl RequestExecutor {
    pub fn new(name: &str, base_url: &str, api_key: &str) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            name: name.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ServiceError> {
        let value = self.send(Method::GET, endpoint, None).await?;
        decode(endpoint, value)
    }

    pub async fn post<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &impl Serialize,
    ) -> Result<T, ServiceError> {
        let body = serde_json::to_value(body)
            .map_err(|source| ServiceError::Decode { endpoint: endpoint.to_string(), source })?;
        let value = self.send(Method::POST, endpoint, Some(body)).await?;
        decode(endpoint, value)
    }

    pub async fn put<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &impl Serialize,
    ) -> Result<T, ServiceError> {
        let body = serde_json::to_value(body)
            .map_err(|source| ServiceError::Decode { endpoint: endpoint.to_string(), source })?;
        let value = self.send(Method::PUT, endpoint, Some(body)).await?;
        decode(endpoint, value)
    }

    async fn send(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<serde_json::Value>,
    ) -> Result<serde_json::Value, ServiceError> {
        let url = format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'));
        let method_name = method_name(&method);

        let mut request = self
            .client
            .request(method, &url)
            .header("X-Api-Key", &self.api_key);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.map_err(|e| {
            error!("[{}] {} request failed for {}: {}", self.name, method_name, endpoint, e);
            ServiceError::Transport(e)
        })?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            error!(
                "[{}] {} {} returned {}: {}",
                self.name,
                method_name,
                endpoint,
                status,
                text.chars().take(500).collect::<String>()
            );
            return Err(ServiceError::Status {
                method: method_name,
                endpoint: endpoint.to_string(),
                status,
                body: text,
            });
        }

        if text.is_empty() {
            return Ok(serde_json::Value::Null);
        }

        serde_json::from_str(&text).map_err(|source| ServiceError::Decode {
            endpoint: endpoint.to_string(),
            source,
        })
    }
}

fn decode<T: DeserializeOwned>(endpoint: &str, value: serde_json::Value) -> Result<T, ServiceError> {
    serde_json::from_value(value).map_err(|source| ServiceError::Decode {
        endpoint: endpoint.to_string(),
        source,
    })
}

fn method_name(method: &Method) -> &'static str {
    if *method == Method::GET {
        "GET"
    } else if *method == Method::POST {
        "POST"
    } else if *method == Method::PUT {
        "PUT"
    } else if *method == Method::DELETE {
        "DELETE"
    } else {
        "REQUEST"
    }
}
