//! reqwest client for the private networking REST API.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    ApiResult, CreateNetworkRequest, InstanceId, NetworkApi, NetworkId, PatchNetworkRequest,
    PrivateNetworkRecord,
};
use crate::config::ClientConfig;
use crate::error::ApiError;

/// Header carrying a unique id per request.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Response envelope used by every list-returning endpoint.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Vec<T>,
}

/// Body of the instance upgrade call; an empty object enables the add-on.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpgradeInstanceRequest {
    private_networking: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// HTTP implementation of [`NetworkApi`].
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    config: ClientConfig,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> ApiResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::transport(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { http, config })
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let request_id = uuid::Uuid::new_v4().to_string();
        debug!("{} {} ({})", method, path, request_id);

        let builder = self
            .http
            .request(method, format!("{}{}", self.config.endpoint, path))
            .header(REQUEST_ID_HEADER, request_id);

        match &self.config.bearer_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> ApiResult<Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::transport(format!("request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ErrorBody>(&body) {
            Ok(parsed) => parsed.message,
            Err(_) if body.is_empty() => status.to_string(),
            Err(_) => body,
        };
        Err(ApiError::from_status(status.as_u16(), message))
    }

    async fn send_list<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ApiResult<Vec<T>> {
        let response = self.send(builder).await?;
        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| ApiError::malformed(format!("invalid response body: {}", e)))?;
        Ok(envelope.data)
    }
}

#[async_trait]
impl NetworkApi for ApiClient {
    async fn create_network(
        &self,
        request: &CreateNetworkRequest,
    ) -> ApiResult<Vec<PrivateNetworkRecord>> {
        let builder = self
            .request(Method::POST, "/v1/private-networks")
            .json(request);
        self.send_list(builder).await
    }

    async fn read_network(&self, id: NetworkId) -> ApiResult<Vec<PrivateNetworkRecord>> {
        let builder = self.request(Method::GET, &format!("/v1/private-networks/{}", id));
        self.send_list(builder).await
    }

    async fn patch_network(&self, id: NetworkId, patch: &PatchNetworkRequest) -> ApiResult<()> {
        let builder = self
            .request(Method::PATCH, &format!("/v1/private-networks/{}", id))
            .json(patch);
        self.send(builder).await?;
        Ok(())
    }

    async fn delete_network(&self, id: NetworkId) -> ApiResult<()> {
        let builder = self.request(Method::DELETE, &format!("/v1/private-networks/{}", id));
        self.send(builder).await?;
        Ok(())
    }

    async fn assign_instance(
        &self,
        network_id: NetworkId,
        instance_id: InstanceId,
    ) -> ApiResult<()> {
        let builder = self.request(
            Method::POST,
            &format!("/v1/private-networks/{}/instances/{}", network_id, instance_id),
        );
        self.send(builder).await?;
        Ok(())
    }

    async fn unassign_instance(
        &self,
        network_id: NetworkId,
        instance_id: InstanceId,
    ) -> ApiResult<()> {
        let builder = self.request(
            Method::DELETE,
            &format!("/v1/private-networks/{}/instances/{}", network_id, instance_id),
        );
        self.send(builder).await?;
        Ok(())
    }

    async fn enable_instance_networking(&self, instance_id: InstanceId) -> ApiResult<()> {
        let body = UpgradeInstanceRequest {
            private_networking: serde_json::Map::new(),
        };
        let builder = self
            .request(
                Method::POST,
                &format!("/v1/compute/instances/{}/upgrade", instance_id),
            )
            .json(&body);
        // Freshly provisioned instances can be unknown to this endpoint for a while
        self.send(builder)
            .await
            .map_err(ApiError::not_found_is_transient)?;
        Ok(())
    }
}
