//! Controller-specific error types.
//!
//! `ReconcileError` is the failure taxonomy of the reconciliation core;
//! `ControllerError` wraps it together with Kubernetes, ARM and configuration
//! failures for the controller binary.

use crate::codec::ValidationError;
use arm_client::{ArmError, OperationHandle, OperationKind};
use kube::Error as KubeError;
use std::time::Duration;
use thiserror::Error;

/// Errors returned by `Reconciler::apply`, `destroy` and `refresh`.
///
/// Messages never include identity provider secrets.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Declared configuration failed local validation; nothing was sent
    #[error("Invalid configuration: {0}")]
    Validation(#[from] ValidationError),

    /// A cluster with this identity exists but is not tracked
    #[error("A cluster with ID {id:?} already exists - to be managed it must be imported first")]
    AlreadyExists { id: String },

    /// Target does not exist where one was required
    #[error("Cluster not found: {0}")]
    NotFound(String),

    /// Declared change needs the cluster to be recreated
    #[error("Cannot change {} on an existing cluster; delete and recreate it", .fields.join(", "))]
    ImmutableFieldChanged { fields: Vec<String> },

    /// Long-running operation reached a failed terminal state
    #[error("Remote {operation} operation failed: {reason}")]
    RemoteOperationFailed {
        operation: OperationKind,
        id: String,
        reason: String,
    },

    /// Deadline passed while waiting for an operation. `handle` is set when
    /// ARM accepted a mutation that is still running and can be polled again.
    #[error("Timed out after {elapsed:?} waiting for {operation} of {id}")]
    Timeout {
        operation: OperationKind,
        id: String,
        elapsed: Duration,
        handle: Option<OperationHandle>,
    },

    /// Caller canceled while waiting for an accepted operation
    #[error("{operation} of {id} was canceled")]
    Canceled {
        operation: OperationKind,
        id: String,
        handle: OperationHandle,
    },

    /// The cluster is still running an operation started earlier
    #[error("Cluster {id} is still {state}")]
    OperationInProgress { id: String, state: String },

    /// Throttling or server error on a synchronous call; safe to retry later
    #[error("Transient ARM error: {0}")]
    TransientApi(#[source] ArmError),

    /// Delete reported success but the cluster is still readable
    #[error("Cluster {id} still exists after delete completed")]
    StaleDelete { id: String },

    /// Resource ID could not be parsed
    #[error("Malformed resource ID: {0}")]
    MalformedIdentity(String),

    /// Any other synchronous ARM failure
    #[error("ARM error: {0}")]
    Remote(#[source] ArmError),
}

impl From<ArmError> for ReconcileError {
    fn from(error: ArmError) -> Self {
        match error {
            ArmError::NotFound(message) => ReconcileError::NotFound(message),
            e if e.is_transient() => ReconcileError::TransientApi(e),
            e => ReconcileError::Remote(e),
        }
    }
}

impl ReconcileError {
    /// Errors worth retrying without any change to the declared state
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ReconcileError::TransientApi(_)
                | ReconcileError::Timeout { .. }
                | ReconcileError::StaleDelete { .. }
                | ReconcileError::OperationInProgress { .. }
        )
    }

    /// Resource a mutation was accepted for before this error, if any.
    ///
    /// A cluster named here may exist in Azure even though the operation did
    /// not finish, so callers must keep tracking it.
    pub fn accepted_resource(&self) -> Option<&str> {
        match self {
            ReconcileError::Timeout { handle: Some(handle), .. } | ReconcileError::Canceled { handle, .. } => {
                Some(&handle.resource_id)
            }
            ReconcileError::RemoteOperationFailed { id, .. } => Some(id),
            _ => None,
        }
    }

    /// Accepted work is still running remotely
    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            ReconcileError::Timeout { handle: Some(_), .. }
                | ReconcileError::Canceled { .. }
                | ReconcileError::OperationInProgress { .. }
        )
    }
}

/// Errors that can occur in the OpenShift Cluster Controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] KubeError),

    /// ARM API error
    #[error("ARM error: {0}")]
    Arm(#[from] ArmError),

    /// Reconciliation failed
    #[error("Reconciliation failed: {0}")]
    Reconcile(#[from] ReconcileError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Referenced Secret or key is missing
    #[error("Secret not found: {0}")]
    SecretNotFound(String),

    /// Finalizer handling failed
    #[error("Finalizer error: {0}")]
    Finalizer(String),

    /// Resource watch failed
    #[error("Resource watch failed: {0}")]
    Watch(String),
}
