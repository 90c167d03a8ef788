//! OpenShift Cluster Controller
//!
//! Reconciles `OpenShiftCluster` CRDs against Azure Red Hat OpenShift managed
//! clusters (`Microsoft.ContainerService/openShiftManagedClusters`): creates
//! missing clusters, applies in-place changes, reports drift and deletes the
//! Azure cluster when the resource is removed.

mod backoff;
mod codec;
mod config;
mod controller;
mod error;
mod identity;
mod reconciler;
mod store;
mod translate;
mod watcher;

#[cfg(test)]
mod test_utils;

use crate::config::ControllerConfig;
use crate::error::ControllerError;
use controller::Controller;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting OpenShift Cluster Controller");

    let config = ControllerConfig::from_env()?;

    info!("Configuration:");
    info!("  ARM endpoint: {}", config.arm_endpoint);
    info!("  Subscription: {}", config.subscription_id);
    info!("  Namespace: {}", config.namespace.as_deref().unwrap_or("all namespaces"));
    info!("  Require import: {}", config.reconcile.require_import);
    info!("  Refresh interval: {:?}", config.refresh_interval);

    // Initialize and run controller
    let controller = Controller::new(config).await?;
    controller.run().await?;

    Ok(())
}
