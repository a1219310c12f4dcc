//! Clients for the remote networking API.
//!
//! The lifecycle controller only talks to [`NetworkApi`]; `http` provides the
//! reqwest implementation used by the binary.

pub mod http;

pub use http::ApiClient;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Opaque numeric network identifier.
pub type NetworkId = i64;

/// Opaque numeric instance identifier.
pub type InstanceId = i64;

/// Result of a single remote call.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Private network as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivateNetworkRecord {
    pub private_network_id: NetworkId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub region: String,
    #[serde(default)]
    pub region_name: String,
    #[serde(default)]
    pub data_center: String,
    #[serde(default)]
    pub available_ips: i64,
    #[serde(default)]
    pub cidr: String,
    pub created_date: DateTime<Utc>,
    #[serde(default)]
    pub instances: Vec<InstanceRecord>,
}

/// Instance attached to a private network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceRecord {
    pub instance_id: InstanceId,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub private_ip_config: PrivateIpConfigRecord,
    pub status: InstanceStatus,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// Private addresses of an instance, per protocol version.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrivateIpConfigRecord {
    #[serde(default)]
    pub v4: Vec<Ipv4Record>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ipv4Record {
    pub ip: String,
    pub netmask_cidr: i64,
    pub gateway: String,
}

/// State of an instance inside a private network.
///
/// Statuses this crate does not know are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InstanceStatus {
    Ok,
    Restart,
    Reinstall,
    ReinstallFailed,
    Installing,
    Other(String),
}

impl InstanceStatus {
    pub fn as_str(&self) -> &str {
        match self {
            InstanceStatus::Ok => "ok",
            InstanceStatus::Restart => "restart",
            InstanceStatus::Reinstall => "reinstall",
            InstanceStatus::ReinstallFailed => "reinstallation failed",
            InstanceStatus::Installing => "installing",
            InstanceStatus::Other(s) => s,
        }
    }
}

impl From<String> for InstanceStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "ok" => InstanceStatus::Ok,
            "restart" => InstanceStatus::Restart,
            "reinstall" => InstanceStatus::Reinstall,
            "reinstallation failed" => InstanceStatus::ReinstallFailed,
            "installing" => InstanceStatus::Installing,
            _ => InstanceStatus::Other(s),
        }
    }
}

impl From<InstanceStatus> for String {
    fn from(status: InstanceStatus) -> Self {
        match status {
            InstanceStatus::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

/// Request to create a private network.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateNetworkRequest {
    pub name: String,
    pub description: String,
    pub region: String,
}

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PatchNetworkRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PatchNetworkRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }
}

/// Remote operations on private networks and their instances.
///
/// Create and read return every record in the response envelope; the caller
/// decides whether the count is acceptable.
#[async_trait]
pub trait NetworkApi: Send + Sync {
    async fn create_network(
        &self,
        request: &CreateNetworkRequest,
    ) -> ApiResult<Vec<PrivateNetworkRecord>>;

    async fn read_network(&self, id: NetworkId) -> ApiResult<Vec<PrivateNetworkRecord>>;

    async fn patch_network(&self, id: NetworkId, patch: &PatchNetworkRequest) -> ApiResult<()>;

    async fn delete_network(&self, id: NetworkId) -> ApiResult<()>;

    async fn assign_instance(&self, network_id: NetworkId, instance_id: InstanceId)
        -> ApiResult<()>;

    async fn unassign_instance(
        &self,
        network_id: NetworkId,
        instance_id: InstanceId,
    ) -> ApiResult<()>;

    /// Enable the private networking add-on on an instance.
    async fn enable_instance_networking(&self, instance_id: InstanceId) -> ApiResult<()>;
}
