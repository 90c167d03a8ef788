//! Reconciliation core for OpenShift managed clusters.
//!
//! This module is organized by concern:
//! - `guard`: pre-create existence check
//! - `lifecycle`: submit / poll / read-back of long-running operations
//! - `drift`: comparison of declared and observed state
//!
//! The `Reconciler` owns no per-cluster state. Callers must serialize calls for
//! one identity; distinct identities may be reconciled concurrently.

pub mod drift;
pub mod guard;
pub mod lifecycle;

#[cfg(test)]
mod lifecycle_test;

use crate::backoff::PollSettings;
use crate::error::ReconcileError;
use crate::identity::ClusterIdentity;
use crate::translate::{expand_cluster, flatten_cluster};
use arm_client::{OpenShiftClientTrait, OperationHandle, OperationKind};
use async_trait::async_trait;
use crds::{ClusterSpec, RemoteClusterState};
use std::future::Future;
use lifecycle::{Lifecycle, LifecycleState, Submission};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Supplies the tenant injected into every AAD identity provider
pub trait TenantResolver: Send + Sync {
    fn tenant_id(&self) -> &str;
}

/// Tenant fixed at startup
#[derive(Debug, Clone)]
pub struct StaticTenant(String);

impl StaticTenant {
    pub fn new(tenant_id: impl Into<String>) -> Self {
        Self(tenant_id.into())
    }
}

impl TenantResolver for StaticTenant {
    fn tenant_id(&self) -> &str {
        &self.0
    }
}

/// Per-operation deadlines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub create: Duration,
    pub read: Duration,
    pub update: Duration,
    pub delete: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            create: Duration::from_secs(90 * 60),
            read: Duration::from_secs(5 * 60),
            update: Duration::from_secs(90 * 60),
            delete: Duration::from_secs(90 * 60),
        }
    }
}

impl Timeouts {
    pub fn for_operation(&self, operation: OperationKind) -> Duration {
        match operation {
            OperationKind::Read => self.read,
            OperationKind::Create => self.create,
            OperationKind::Update => self.update,
            OperationKind::Delete => self.delete,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileSettings {
    pub timeouts: Timeouts,
    pub poll: PollSettings,
    /// When false, untracked clusters that already exist are adopted instead of rejected
    pub require_import: bool,
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        Self {
            timeouts: Timeouts::default(),
            poll: PollSettings::default(),
            require_import: true,
        }
    }
}

/// Notified when ARM accepts a mutation, before polling starts
#[async_trait]
pub trait OperationObserver: Send + Sync {
    async fn accepted(&self, handle: &OperationHandle);
}

/// Observer for callers that keep no record of accepted operations
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

#[async_trait]
impl OperationObserver for NoopObserver {
    async fn accepted(&self, _handle: &OperationHandle) {}
}

/// Provisioning states that end an operation; anything else is still running
const SETTLED_STATES: [&str; 3] = ["Succeeded", "Failed", "Canceled"];

fn still_provisioning(state: &RemoteClusterState) -> Option<&str> {
    state
        .provisioning_state
        .as_deref()
        .filter(|current| !SETTLED_STATES.iter().any(|settled| settled.eq_ignore_ascii_case(current)))
}

/// What the caller's local record says about the cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// Nothing recorded; the cluster must not exist yet
    New,
    /// Previously created or imported by us
    Tracked,
    /// Take over an existing cluster
    Import,
}

/// Reconciles declared cluster state against ARM.
pub struct Reconciler {
    pub(crate) client: Box<dyn OpenShiftClientTrait + Send + Sync>,
    tenant: Box<dyn TenantResolver>,
    pub(crate) settings: ReconcileSettings,
}

impl Reconciler {
    pub fn new(
        client: impl OpenShiftClientTrait + 'static,
        tenant: impl TenantResolver + 'static,
        settings: ReconcileSettings,
    ) -> Self {
        Self {
            client: Box::new(client),
            tenant: Box::new(tenant),
            settings,
        }
    }

    /// Drive the remote cluster to the declared state.
    ///
    /// Validation runs before any remote call. Every mutation ARM accepts is
    /// reported to `observer` before polling starts. Returns the state read
    /// back after the last mutation, or the current state when nothing changed.
    pub async fn apply(
        &self,
        identity: &ClusterIdentity,
        spec: &ClusterSpec,
        ownership: Ownership,
        observer: &dyn OperationObserver,
        cancel: &CancellationToken,
    ) -> Result<RemoteClusterState, ReconcileError> {
        let body = expand_cluster(spec, self.tenant.tenant_id())?;

        let ownership = match ownership {
            Ownership::New if !self.settings.require_import => Ownership::Import,
            other => other,
        };
        debug!("Applying {} ({:?})", identity, ownership);

        let existing = match ownership {
            Ownership::New => {
                self.ensure_absent(identity).await?;
                None
            }
            Ownership::Import => self.refresh(identity).await?,
            Ownership::Tracked => {
                let existing = self.refresh(identity).await?;
                if existing.is_none() {
                    warn!("Cluster {} was removed outside the controller; recreating", identity);
                }
                existing
            }
        };

        match existing {
            None => {
                let mut lifecycle = Lifecycle::new(identity, LifecycleState::Absent);
                self.run_operation(&mut lifecycle, identity, Submission::Create(&body), observer, cancel)
                    .await?;
                let state = self.read_back(identity).await;
                lifecycle.settle(&state, LifecycleState::Ready);
                let state = state?;
                info!("Created cluster {} ({})", identity, state.fqdn.as_deref().unwrap_or("no fqdn yet"));
                Ok(state)
            }
            Some(observed) => {
                if let Some(state) = still_provisioning(&observed) {
                    return Err(ReconcileError::OperationInProgress {
                        id: observed.id.clone(),
                        state: state.to_string(),
                    });
                }

                let changes = drift::diff(spec, &observed);
                if !changes.immutable.is_empty() {
                    return Err(ReconcileError::ImmutableFieldChanged {
                        fields: changes.immutable,
                    });
                }
                if changes.is_empty() {
                    debug!("Cluster {} is in sync", identity);
                    return Ok(observed);
                }

                info!("Updating cluster {}: {}", identity, changes.mutable.join(", "));
                let mut lifecycle = Lifecycle::new(identity, LifecycleState::Ready);
                self.run_operation(&mut lifecycle, identity, Submission::Update(&body), observer, cancel)
                    .await?;
                let state = self.read_back(identity).await;
                lifecycle.settle(&state, LifecycleState::Ready);
                state
            }
        }
    }

    /// Delete the cluster and confirm it is gone.
    ///
    /// Deleting an unknown cluster is `ReconcileError::NotFound`.
    pub async fn destroy(&self, identity: &ClusterIdentity, cancel: &CancellationToken) -> Result<(), ReconcileError> {
        let mut lifecycle = Lifecycle::new(identity, LifecycleState::Ready);
        self.run_operation(&mut lifecycle, identity, Submission::Delete, &NoopObserver, cancel)
            .await?;

        let resource_id = identity.resource_id();
        let confirmed = match self.within_read_timeout(&resource_id, self.client.get(&resource_id)).await {
            Ok(Err(e)) if e.is_not_found() => Ok(()),
            Ok(Ok(_)) => Err(ReconcileError::StaleDelete { id: resource_id }),
            Ok(Err(e)) => Err(e.into()),
            Err(timeout) => Err(timeout),
        };
        lifecycle.settle(&confirmed, LifecycleState::Absent);
        confirmed?;

        info!("Deleted cluster {}", identity);
        Ok(())
    }

    /// Read the current remote state. `None` means the cluster does not exist.
    pub async fn refresh(&self, identity: &ClusterIdentity) -> Result<Option<RemoteClusterState>, ReconcileError> {
        let resource_id = identity.resource_id();

        match self.within_read_timeout(&resource_id, self.client.get(&resource_id)).await? {
            Err(e) if e.is_not_found() => {
                debug!("Cluster {} not found", identity);
                Ok(None)
            }
            Err(e) => Err(e.into()),
            Ok(cluster) => Ok(Some(flatten_cluster(identity, &cluster))),
        }
    }

    /// Bound a single read by the read timeout
    async fn within_read_timeout<T>(
        &self,
        resource_id: &str,
        read: impl Future<Output = T>,
    ) -> Result<T, ReconcileError> {
        let deadline = self.settings.timeouts.read;
        tokio::time::timeout(deadline, read)
            .await
            .map_err(|_| ReconcileError::Timeout {
                operation: OperationKind::Read,
                id: resource_id.to_string(),
                elapsed: deadline,
                handle: None,
            })
    }

    /// The single authoritative read after a mutation completes
    async fn read_back(&self, identity: &ClusterIdentity) -> Result<RemoteClusterState, ReconcileError> {
        self.refresh(identity)
            .await?
            .ok_or_else(|| ReconcileError::NotFound(identity.resource_id()))
    }
}
