//! Kubernetes resource watcher.
//!
//! Drives `OpenShiftCluster` reconciliation with `kube_runtime::Controller`.
//! A finalizer keeps the resource around until the Azure cluster has been
//! deleted.

use crate::error::{ControllerError, ReconcileError};
use crate::identity::ClusterIdentity;
use crate::reconciler::{OperationObserver, Ownership, Reconciler};
use crate::store::{ConfigStore, KubeConfigStore, ObservedUpdate};
use arm_client::OperationHandle;
use async_trait::async_trait;
use crds::{ClusterPhase, OpenShiftCluster, OpenShiftClusterStatus};
use futures::StreamExt;
use kube::{Api, Client, ResourceExt};
use kube_runtime::finalizer::{finalizer, Error as FinalizerError, Event as FinalizerEvent};
use kube_runtime::{controller::{Action, Config as ControllerConfig}, watcher, Controller};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Finalizer guarding deletion of the Azure cluster
pub const FINALIZER: &str = "aro.microscaler.io/cluster-protection";

/// Shared state handed to every reconcile
pub struct Context {
    pub client: Client,
    pub reconciler: Reconciler,
    pub subscription_id: String,
    pub refresh_interval: Duration,
    /// Canceled on shutdown; aborts in-flight operation polls
    pub shutdown: CancellationToken,
}

/// Ownership of the cluster as recorded in status and annotations
fn ownership(cluster: &OpenShiftCluster) -> Ownership {
    let tracked = cluster
        .status
        .as_ref()
        .is_some_and(|status| status.resource_id.is_some());
    if tracked {
        Ownership::Tracked
    } else if cluster.wants_import() {
        Ownership::Import
    } else {
        Ownership::New
    }
}

/// Whether the last reconcile already converged this generation
fn is_settled(cluster: &OpenShiftCluster) -> bool {
    let generation = cluster.metadata.generation;
    cluster.status.as_ref().is_some_and(|status| {
        status.phase == ClusterPhase::Ready && generation.is_some() && status.observed_generation == generation
    })
}

/// Records the resource ID in status as soon as ARM accepts a mutation, so
/// an interrupted create is tracked on the next reconcile
struct StatusObserver<'a, S> {
    store: &'a S,
    name: &'a str,
    previous: &'a OpenShiftClusterStatus,
    generation: Option<i64>,
}

#[async_trait]
impl<S: ConfigStore> OperationObserver for StatusObserver<'_, S> {
    async fn accepted(&self, handle: &OperationHandle) {
        let update = ObservedUpdate::pending(self.previous, self.generation, &handle.resource_id);
        if let Err(e) = self.store.set_observed_state(self.name, update).await {
            warn!(
                "Failed to record accepted {} of {} for OpenShiftCluster {}: {}",
                handle.kind, handle.resource_id, self.name, e
            );
        }
    }
}

/// Status written for a failed reconcile.
///
/// Keeps tracking a cluster whose create was accepted even when waiting for
/// it failed, and reports still-running work as `Pending`.
fn failure_update(previous: &OpenShiftClusterStatus, generation: Option<i64>, error: &ControllerError) -> ObservedUpdate {
    let mut update = ObservedUpdate::failed(previous, generation, error);
    if let ControllerError::Reconcile(e) = error {
        if update.resource_id.is_none() {
            update.resource_id = e.accepted_resource().map(str::to_string);
        }
        if e.is_pending() {
            update.phase = ClusterPhase::Pending;
        }
    }
    update
}

async fn reconcile(cluster: Arc<OpenShiftCluster>, ctx: Arc<Context>) -> Result<Action, ControllerError> {
    let namespace = cluster.namespace().unwrap_or_else(|| "default".to_string());
    let api: Api<OpenShiftCluster> = Api::namespaced(ctx.client.clone(), &namespace);
    let store = KubeConfigStore::new(ctx.client.clone(), &namespace);

    finalizer(&api, FINALIZER, cluster, |event| async {
        match event {
            FinalizerEvent::Apply(cluster) => apply_cluster(&cluster, &store, &ctx).await,
            FinalizerEvent::Cleanup(cluster) => cleanup_cluster(&cluster, &ctx).await,
        }
    })
    .await
    .map_err(|e| match e {
        FinalizerError::ApplyFailed(err) | FinalizerError::CleanupFailed(err) => err,
        FinalizerError::AddFinalizer(e) | FinalizerError::RemoveFinalizer(e) => ControllerError::Kube(e),
        other => ControllerError::Finalizer(other.to_string()),
    })
}

async fn apply_cluster(
    cluster: &OpenShiftCluster,
    store: &impl ConfigStore,
    ctx: &Context,
) -> Result<Action, ControllerError> {
    let name = cluster.name_any();
    let namespace = cluster.namespace().unwrap_or_default();
    let generation = cluster.metadata.generation;
    let status = cluster.status.clone().unwrap_or_default();
    info!("Reconciling OpenShiftCluster {}/{}", namespace, name);

    let spec = match store.get_config(&name).await {
        Ok(spec) => spec,
        Err(e) => return record_failure(store, &name, &status, generation, e).await,
    };
    let identity = ClusterIdentity::from_spec(&ctx.subscription_id, &spec);

    if is_settled(cluster) {
        debug!("OpenShiftCluster {}/{} unchanged; refreshing", namespace, name);
        return match ctx.reconciler.refresh(&identity).await {
            Ok(Some(state)) => {
                store.set_observed_state(&name, ObservedUpdate::ready(generation, state)).await?;
                Ok(Action::requeue(ctx.refresh_interval))
            }
            Ok(None) => {
                warn!("OpenShiftCluster {}/{}: {} no longer exists in Azure", namespace, name, identity);
                store.set_observed_state(&name, ObservedUpdate::absent(generation)).await?;
                Ok(Action::requeue(ctx.refresh_interval))
            }
            Err(e) => record_failure(store, &name, &status, generation, e.into()).await,
        };
    }

    let cancel = ctx.shutdown.child_token();
    let observer = StatusObserver {
        store,
        name: &name,
        previous: &status,
        generation,
    };
    match ctx
        .reconciler
        .apply(&identity, &spec, ownership(cluster), &observer, &cancel)
        .await
    {
        Ok(state) => {
            info!(
                "OpenShiftCluster {}/{} is ready ({})",
                namespace,
                name,
                state.public_hostname.as_deref().unwrap_or("no hostname yet")
            );
            store.set_observed_state(&name, ObservedUpdate::ready(generation, state)).await?;
            Ok(Action::requeue(ctx.refresh_interval))
        }
        Err(e) => record_failure(store, &name, &status, generation, e.into()).await,
    }
}

/// Write the failure status and hand the error to the error policy
async fn record_failure(
    store: &impl ConfigStore,
    name: &str,
    previous: &OpenShiftClusterStatus,
    generation: Option<i64>,
    error: ControllerError,
) -> Result<Action, ControllerError> {
    if let Err(status_error) = store
        .set_observed_state(name, failure_update(previous, generation, &error))
        .await
    {
        warn!("Failed to record error status for OpenShiftCluster {}: {}", name, status_error);
    }
    Err(error)
}

async fn cleanup_cluster(cluster: &OpenShiftCluster, ctx: &Context) -> Result<Action, ControllerError> {
    let name = cluster.name_any();
    let namespace = cluster.namespace().unwrap_or_default();

    // Never delete a cluster we did not create or import
    let Some(resource_id) = cluster.status.as_ref().and_then(|status| status.resource_id.clone()) else {
        info!("OpenShiftCluster {}/{} tracks no Azure cluster; nothing to delete", namespace, name);
        return Ok(Action::await_change());
    };
    let identity = ClusterIdentity::parse(&resource_id)?;

    info!("Deleting Azure cluster {} for OpenShiftCluster {}/{}", identity, namespace, name);
    match ctx.reconciler.destroy(&identity, &ctx.shutdown.child_token()).await {
        Ok(()) => {}
        Err(ReconcileError::NotFound(_)) => {
            info!("Azure cluster {} was already deleted", identity);
        }
        Err(e) => return Err(e.into()),
    }
    Ok(Action::await_change())
}

fn error_policy(cluster: Arc<OpenShiftCluster>, error: &ControllerError, _ctx: Arc<Context>) -> Action {
    match error {
        ControllerError::Reconcile(e) if e.is_retryable() => {
            warn!("Reconciliation of OpenShiftCluster {} will be retried: {}", cluster.name_any(), e);
        }
        _ => error!("Reconciliation error for OpenShiftCluster {}: {}", cluster.name_any(), error),
    }
    Action::requeue(Duration::from_secs(60))
}

/// Watch `OpenShiftCluster` resources until the stream ends
pub async fn watch_clusters(api: Api<OpenShiftCluster>, ctx: Arc<Context>) -> Result<(), ControllerError> {
    info!("Starting OpenShiftCluster watcher");

    // Debounce batches bursts of status updates; concurrency bounds parallel ARM operations
    let controller_config = ControllerConfig::default()
        .debounce(Duration::from_secs(5))
        .concurrency(3);

    // In-flight reconciles see the same token, record their state and return
    let shutdown = ctx.shutdown.clone().cancelled_owned();

    Controller::new(api, watcher::Config::default())
        .with_config(controller_config)
        .graceful_shutdown_on(shutdown)
        .run(reconcile, error_policy, ctx)
        .for_each(|res| async move {
            match res {
                Ok((object, _)) => debug!("Reconciled OpenShiftCluster {}", object.name),
                Err(e) => error!("Controller error for OpenShiftCluster: {}", e),
            }
        })
        .await;

    Ok(())
}
