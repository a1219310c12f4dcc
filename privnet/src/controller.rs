//! Lifecycle controller for private network resources.
//!
//! Translates host state (recorded [`NetworkState`] and desired
//! [`NetworkSpec`]) into remote calls. All steps run sequentially: removals
//! before additions, capability enable before assign.

use tracing::{debug, error, info, warn};

use crate::clients::{
    CreateNetworkRequest, InstanceId, NetworkApi, NetworkId, PatchNetworkRequest,
    PrivateNetworkRecord,
};
use crate::config::ControllerConfig;
use crate::error::{ApiError, ControllerError, Result};
use crate::reconciler::{self, MembershipPlan};
use crate::state::{format_timestamp, NetworkSpec, NetworkState};

/// An unassign that failed while draining a network before deletion.
#[derive(Debug, Clone)]
pub struct DrainFailure {
    pub instance_id: InstanceId,
    pub error: ApiError,
}

/// Result of a successful delete.
///
/// Drain failures are reported for observation only; the delete call itself
/// succeeded, so nothing was left attached that the API cared about.
#[derive(Debug, Clone, Default)]
pub struct DeleteOutcome {
    pub drain_failures: Vec<DrainFailure>,
}

/// Drives create/read/update/delete of one private network at a time.
pub struct NetworkController<C> {
    client: C,
    config: ControllerConfig,
}

impl<C: NetworkApi> NetworkController<C> {
    pub fn new(client: C, config: ControllerConfig) -> Self {
        Self { client, config }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Create the network, attach the desired instances, and return fresh state.
    ///
    /// A failure while attaching leaves the network and any instances already
    /// attached in place, and is returned as [`ControllerError::Incomplete`]
    /// carrying the state of what was created.
    pub async fn create(&self, spec: &NetworkSpec) -> Result<NetworkState> {
        let region = spec
            .region
            .clone()
            .unwrap_or_else(|| self.config.default_region.clone());
        info!("Creating private network {} in {}", spec.name, region);

        let request = CreateNetworkRequest {
            name: spec.name.clone(),
            description: spec.description.clone(),
            region,
        };
        let record = single_record(self.client.create_network(&request).await?)?;
        let network_id = record.private_network_id;
        info!("Private network {} created with id {}", spec.name, network_id);

        let mut state = NetworkState {
            id: Some(network_id),
            ..Default::default()
        };
        state.apply_record(&record);

        let plan = reconciler::plan(&Default::default(), &spec.instance_ids);
        if let Err(e) = self.apply_plan(network_id, &plan).await {
            error!(
                "Private network {} was created but attaching instances failed: {}",
                network_id, e
            );
            self.refresh_after_failure(&mut state).await;
            return Err(ControllerError::Incomplete {
                network_id,
                state: Box::new(state),
                source: Box::new(e),
            });
        }

        self.read(&mut state).await?;
        Ok(state)
    }

    /// Refresh `state` from the API.
    pub async fn read(&self, state: &mut NetworkState) -> Result<()> {
        let id = state.id.ok_or(ControllerError::MissingId)?;
        debug!("Reading private network {}", id);

        let record = self.fetch(id).await?;
        state.apply_record(&record);
        Ok(())
    }

    /// Converge the network to `spec`. Returns whether anything changed.
    ///
    /// Issues no remote calls when name, description, and membership already
    /// match the recorded state.
    pub async fn update(&self, state: &mut NetworkState, spec: &NetworkSpec) -> Result<bool> {
        let id = state.id.ok_or(ControllerError::MissingId)?;

        let mut patch = PatchNetworkRequest::default();
        if state.name != spec.name {
            patch.name = Some(spec.name.clone());
        }
        if state.description != spec.description {
            patch.description = Some(spec.description.clone());
        }
        if let Some(region) = &spec.region {
            if *region != state.region {
                warn!(
                    "Region of private network {} cannot change ({} -> {}), ignoring",
                    id, state.region, region
                );
            }
        }

        let plan = reconciler::plan(&state.instance_set(), &spec.instance_ids);
        if patch.is_empty() && plan.is_empty() {
            debug!("Private network {} is up to date", id);
            return Ok(false);
        }

        info!(
            "Updating private network {}: {} to remove, {} to add",
            id,
            plan.to_remove.len(),
            plan.to_add.len()
        );
        let applied = async {
            self.apply_plan(id, &plan).await?;
            if !patch.is_empty() {
                self.client.patch_network(id, &patch).await?;
            }
            Ok::<_, ControllerError>(())
        }
        .await;

        if let Err(e) = applied {
            // Record what did apply so the next update only sends the rest
            self.refresh_after_failure(state).await;
            return Err(e);
        }

        state.updated_at = format_timestamp(&chrono::Utc::now());
        self.read(state).await?;
        Ok(true)
    }

    /// Detach every instance (best effort), then delete the network.
    pub async fn delete(&self, state: &mut NetworkState) -> Result<DeleteOutcome> {
        let id = state.id.ok_or(ControllerError::MissingId)?;
        info!("Deleting private network {}", id);

        let record = self.fetch(id).await?;

        let mut outcome = DeleteOutcome::default();
        for instance in &record.instances {
            if let Err(e) = self.client.unassign_instance(id, instance.instance_id).await {
                warn!(
                    "Failed to unassign instance {} from private network {}: {}",
                    instance.instance_id, id, e
                );
                outcome.drain_failures.push(DrainFailure {
                    instance_id: instance.instance_id,
                    error: e,
                });
            }
        }

        self.client.delete_network(id).await?;
        state.id = None;
        info!("Private network {} deleted", id);
        Ok(outcome)
    }

    /// Adopt an existing network by id.
    pub async fn import(&self, id: NetworkId) -> Result<NetworkState> {
        info!("Importing private network {}", id);
        let mut state = NetworkState {
            id: Some(id),
            ..Default::default()
        };
        self.read(&mut state).await?;
        Ok(state)
    }

    /// Best-effort read after a failed mutation; a failed read keeps `state`.
    async fn refresh_after_failure(&self, state: &mut NetworkState) {
        if let Err(e) = self.read(state).await {
            warn!("Failed to refresh private network state after error: {}", e);
        }
    }

    async fn fetch(&self, id: NetworkId) -> Result<PrivateNetworkRecord> {
        single_record(self.client.read_network(id).await?)
    }

    async fn apply_plan(&self, network_id: NetworkId, plan: &MembershipPlan) -> Result<()> {
        for &instance_id in &plan.to_remove {
            debug!(
                "Unassigning instance {} from private network {}",
                instance_id, network_id
            );
            self.client
                .unassign_instance(network_id, instance_id)
                .await?;
        }

        for &instance_id in &plan.to_add {
            self.attach(network_id, instance_id).await?;
        }
        Ok(())
    }

    async fn attach(&self, network_id: NetworkId, instance_id: InstanceId) -> Result<()> {
        let client = &self.client;
        let enabled = self
            .config
            .enable_retry
            .run("enable private networking", || {
                client.enable_instance_networking(instance_id)
            })
            .await;

        match enabled {
            Ok(()) => debug!("Private networking enabled on instance {}", instance_id),
            Err(e) if e.is_conflict() => {
                debug!(
                    "Private networking already enabled on instance {}",
                    instance_id
                )
            }
            Err(e) => return Err(e.into()),
        }

        debug!(
            "Assigning instance {} to private network {}",
            instance_id, network_id
        );
        client.assign_instance(network_id, instance_id).await?;
        Ok(())
    }
}

fn single_record(mut records: Vec<PrivateNetworkRecord>) -> Result<PrivateNetworkRecord> {
    if records.len() != 1 {
        return Err(ControllerError::Inconsistent {
            expected: 1,
            actual: records.len(),
        });
    }
    Ok(records.remove(0))
}
