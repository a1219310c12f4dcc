//! Local resource state and mapping from API records.
//!
//! [`NetworkState`] is what the host records between operations. It is only
//! ever filled from a fresh API read, so computed fields never go stale past
//! a mutation.

use std::collections::BTreeSet;
use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clients::{
    InstanceId, InstanceRecord, InstanceStatus, Ipv4Record, NetworkId, PrivateNetworkRecord,
};

/// Desired state declared by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkSpec {
    pub name: String,
    pub description: String,
    /// Only honored at creation.
    pub region: Option<String>,
    pub instance_ids: BTreeSet<InstanceId>,
}

/// Recorded state of one private network resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkState {
    /// Cleared once the network has been deleted.
    pub id: Option<NetworkId>,
    pub name: String,
    pub description: String,
    pub region: String,
    pub region_name: String,
    pub data_center: String,
    pub available_ips: i64,
    pub cidr: String,
    pub created_date: String,
    pub updated_at: String,
    /// In API response order.
    pub instance_ids: Vec<InstanceId>,
    pub instances: Vec<InstanceSnapshot>,
}

/// Read-only view of an instance attached to the network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceSnapshot {
    pub instance_id: InstanceId,
    pub display_name: String,
    pub name: String,
    /// Always exactly one element wrapping the per-version lists.
    pub private_ip_config: Vec<PrivateIpConfig>,
    pub status: InstanceStatus,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrivateIpConfig {
    pub v4: Vec<Ipv4Config>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ipv4Config {
    pub ip: String,
    pub netmask_cidr: i64,
    pub gateway: String,
}

impl NetworkState {
    /// Membership as a set, for comparison with a [`NetworkSpec`].
    pub fn instance_set(&self) -> BTreeSet<InstanceId> {
        self.instance_ids.iter().copied().collect()
    }

    /// Overwrite every field from an API record. `updated_at` is kept; the
    /// API does not report it.
    pub fn apply_record(&mut self, record: &PrivateNetworkRecord) {
        self.id = Some(record.private_network_id);
        self.name = record.name.clone();
        self.description = record.description.clone();
        self.region = record.region.clone();
        self.region_name = record.region_name.clone();
        self.data_center = record.data_center.clone();
        self.available_ips = record.available_ips;
        self.cidr = record.cidr.clone();
        self.created_date = format_timestamp(&record.created_date);
        self.instance_ids = record.instances.iter().map(|i| i.instance_id).collect();
        self.instances = record.instances.iter().map(InstanceSnapshot::from).collect();
    }
}

impl From<&InstanceRecord> for InstanceSnapshot {
    fn from(instance: &InstanceRecord) -> Self {
        InstanceSnapshot {
            instance_id: instance.instance_id,
            display_name: instance.display_name.clone(),
            name: instance.name.clone(),
            private_ip_config: vec![PrivateIpConfig {
                v4: instance
                    .private_ip_config
                    .v4
                    .iter()
                    .map(Ipv4Config::from)
                    .collect(),
            }],
            status: instance.status.clone(),
            error_message: instance.error_message.clone(),
        }
    }
}

impl From<&Ipv4Record> for Ipv4Config {
    fn from(r: &Ipv4Record) -> Self {
        Ipv4Config {
            ip: r.ip.clone(),
            netmask_cidr: r.netmask_cidr,
            gateway: r.gateway.clone(),
        }
    }
}

/// Render a timestamp the way the state file stores it (RFC 850 style).
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%A, %d-%b-%y %H:%M:%S UTC").to_string()
}

/// Errors reading or writing the state file.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("state file I/O: {0}")]
    Io(#[from] io::Error),

    #[error("state file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Load recorded state; a missing file means nothing has been created yet.
pub async fn load(path: &Path) -> Result<NetworkState, StateError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(NetworkState::default()),
        Err(e) => Err(e.into()),
    }
}

/// Persist recorded state.
pub async fn save(path: &Path, state: &NetworkState) -> Result<(), StateError> {
    let json = serde_json::to_vec_pretty(state)?;
    tokio::fs::write(path, json).await?;
    Ok(())
}
