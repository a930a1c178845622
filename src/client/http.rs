//! reqwest-backed implementation of [`ComposioApi`].

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::client::{
    ComposioApi, ConnectedAccount, ConnectionRequest, EventStream, ToolExecuteResponse,
    TriggerInstance, ws,
};
use crate::error::ApiError;

/// HTTP client for the tool-routing service.
pub struct HttpClient {
    http: reqwest::Client,
    base_url: String,
    api_key: SecretString,
}

#[derive(Debug, serde::Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Serialize)]
struct InitiateConnectionBody<'a> {
    user_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    auth_config_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct CreateTriggerBody<'a> {
    connected_account_id: &'a str,
    trigger_config: serde_json::Value,
}

#[derive(Debug, serde::Deserialize)]
struct CreateTriggerResponse {
    trigger_id: String,
}

#[derive(Debug, Serialize)]
struct ExecuteToolBody<'a> {
    user_id: &'a str,
    arguments: serde_json::Value,
}

impl HttpClient {
    /// Build a client for the service at `base_url`, authenticating every
    /// request with `api_key`.
    pub fn new(base_url: &str, api_key: SecretString) -> Result<Self, ApiError> {
        let mut headers = reqwest::header::HeaderMap::new();
        let mut key_value = reqwest::header::HeaderValue::from_str(api_key.expose_secret())
            .map_err(|_| ApiError::RequestFailed {
                endpoint: "client setup".into(),
                reason: "API key contains characters invalid in an HTTP header".into(),
            })?;
        key_value.set_sensitive(true);
        headers.insert("x-api-key", key_value);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(concat!("gmail-labeler/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::RequestFailed {
                endpoint: "client setup".into(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .query(query)
            .send()
            .await
            .map_err(|e| ApiError::RequestFailed {
                endpoint: path.to_string(),
                reason: e.to_string(),
            })?;
        Self::decode(path, response).await
    }

    async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::RequestFailed {
                endpoint: path.to_string(),
                reason: e.to_string(),
            })?;
        Self::decode(path, response).await
    }

    async fn decode<T: DeserializeOwned>(
        endpoint: &str,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Http {
                status: status.as_u16(),
                body,
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::InvalidResponse {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl ComposioApi for HttpClient {
    async fn list_connected_accounts(
        &self,
        user_id: &str,
        toolkit: &str,
    ) -> Result<Vec<ConnectedAccount>, ApiError> {
        let list: ListResponse<ConnectedAccount> = self
            .get_json(
                "/api/v3/connected_accounts",
                &[("user_ids", user_id), ("toolkit_slugs", toolkit)],
            )
            .await?;
        Ok(list.items)
    }

    async fn get_connected_account(&self, id: &str) -> Result<ConnectedAccount, ApiError> {
        self.get_json(&format!("/api/v3/connected_accounts/{id}"), &[])
            .await
    }

    async fn initiate_connection(
        &self,
        user_id: &str,
        auth_config_id: Option<&str>,
    ) -> Result<ConnectionRequest, ApiError> {
        self.post_json(
            "/api/v3/connected_accounts",
            &InitiateConnectionBody {
                user_id,
                auth_config_id,
            },
        )
        .await
    }

    async fn list_active_triggers(
        &self,
        trigger_name: &str,
        connected_account_id: &str,
    ) -> Result<Vec<TriggerInstance>, ApiError> {
        let list: ListResponse<TriggerInstance> = self
            .get_json(
                "/api/v3/trigger_instances/active",
                &[
                    ("trigger_names", trigger_name),
                    ("connected_account_ids", connected_account_id),
                ],
            )
            .await?;
        Ok(list.items)
    }

    async fn create_trigger(
        &self,
        trigger_name: &str,
        connected_account_id: &str,
        trigger_config: serde_json::Value,
    ) -> Result<String, ApiError> {
        let response: CreateTriggerResponse = self
            .post_json(
                &format!("/api/v3/trigger_instances/{trigger_name}"),
                &CreateTriggerBody {
                    connected_account_id,
                    trigger_config,
                },
            )
            .await?;
        Ok(response.trigger_id)
    }

    async fn execute_tool(
        &self,
        tool_slug: &str,
        user_id: &str,
        arguments: serde_json::Value,
    ) -> Result<ToolExecuteResponse, ApiError> {
        self.post_json(
            &format!("/api/v3/tools/execute/{tool_slug}"),
            &ExecuteToolBody { user_id, arguments },
        )
        .await
    }

    async fn subscribe(&self) -> Result<EventStream, ApiError> {
        ws::open_event_stream(&self.base_url, &self.api_key).await
    }
}
