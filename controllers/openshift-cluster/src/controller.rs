//! Main controller implementation.
//!
//! This module contains the `Controller` struct that wires the ARM client,
//! the reconciler and the `OpenShiftCluster` watcher together.

use crate::config::ControllerConfig;
use crate::error::ControllerError;
use crate::reconciler::{Reconciler, StaticTenant};
use crate::watcher::{watch_clusters, Context};
use arm_client::OpenShiftClient;
use crds::OpenShiftCluster;
use kube::{Api, Client};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// How long in-flight reconciles get to record their state on shutdown
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// Main controller for OpenShift managed clusters.
pub struct Controller {
    cluster_watcher: JoinHandle<Result<(), ControllerError>>,
    shutdown: CancellationToken,
}

impl Controller {
    /// Creates a new controller instance.
    pub async fn new(config: ControllerConfig) -> Result<Self, ControllerError> {
        info!("Initializing OpenShift Cluster Controller");

        let kube_client = Client::try_default().await?;

        let arm_client = OpenShiftClient::new(config.arm_endpoint.clone(), config.access_token.clone())?;

        // Validate token and connectivity before proceeding
        info!("Validating ARM credentials for subscription {}...", config.subscription_id);
        arm_client
            .validate_access(&config.subscription_id)
            .await
            .map_err(|e| {
                error!("Failed to validate ARM access: {}", e);
                error!("Please ensure:");
                error!("  1. ARM_ACCESS_TOKEN is a current bearer token for {}", config.arm_endpoint);
                error!("  2. The identity has access to subscription {}", config.subscription_id);
                ControllerError::Arm(e)
            })?;
        info!("ARM credentials validated");

        let api: Api<OpenShiftCluster> = match config.namespace.as_deref() {
            Some(ns) => Api::namespaced(kube_client.clone(), ns),
            None => Api::all(kube_client.clone()),
        };

        let shutdown = CancellationToken::new();
        let reconciler = Reconciler::new(arm_client, StaticTenant::new(config.tenant_id.clone()), config.reconcile);
        let ctx = Arc::new(Context {
            client: kube_client,
            reconciler,
            subscription_id: config.subscription_id.clone(),
            refresh_interval: config.refresh_interval,
            shutdown: shutdown.clone(),
        });

        let cluster_watcher = tokio::spawn(watch_clusters(api, ctx));

        Ok(Self {
            cluster_watcher,
            shutdown,
        })
    }

    /// Runs the controller until the watcher exits or a shutdown signal arrives.
    pub async fn run(mut self) -> Result<(), ControllerError> {
        info!("OpenShift Cluster Controller running");

        tokio::select! {
            result = &mut self.cluster_watcher => {
                result.map_err(|e| ControllerError::Watch(format!("OpenShiftCluster watcher panicked: {}", e)))?
                    .map_err(|e| ControllerError::Watch(format!("OpenShiftCluster watcher error: {}", e)))?;
            }
            signal = tokio::signal::ctrl_c() => {
                signal.map_err(|e| ControllerError::Watch(format!("Failed to listen for shutdown signal: {}", e)))?;
                info!("Shutdown requested; canceling in-flight operations");
                self.shutdown.cancel();
                if tokio::time::timeout(SHUTDOWN_GRACE, &mut self.cluster_watcher).await.is_err() {
                    warn!("OpenShiftCluster watcher did not stop within {:?}; aborting", SHUTDOWN_GRACE);
                    self.cluster_watcher.abort();
                }
            }
        }

        Ok(())
    }
}
