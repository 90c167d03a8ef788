//! Long-running operation lifecycle.
//!
//! Create: `Absent -> Submitting -> Polling -> Ready`.
//! Update: `Ready -> Submitting -> Polling -> Ready`.
//! Delete: `Ready -> Submitting -> Polling -> Absent`.
//! A synchronous submit error or a failed terminal status moves to `Failed`.
//!
//! Once ARM accepts a mutation the caller's `OperationObserver` hears about
//! it before polling starts, so an interrupted create is never forgotten.

use super::{OperationObserver, Reconciler};
use crate::backoff::PollBackoff;
use crate::error::ReconcileError;
use crate::identity::ClusterIdentity;
use arm_client::{OpenShiftManagedCluster, OperationHandle, OperationKind, OperationStatus};
use std::fmt;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Lifecycle state of one cluster during a reconcile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Absent,
    Submitting,
    Polling,
    Ready,
    Failed,
}

impl LifecycleState {
    pub fn can_transition_to(self, next: LifecycleState) -> bool {
        use LifecycleState::*;
        matches!(
            (self, next),
            (Absent | Ready | Failed, Submitting)
                | (Submitting, Polling | Failed)
                | (Polling, Ready | Absent | Failed)
        )
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LifecycleState::Absent => "Absent",
            LifecycleState::Submitting => "Submitting",
            LifecycleState::Polling => "Polling",
            LifecycleState::Ready => "Ready",
            LifecycleState::Failed => "Failed",
        };
        f.write_str(s)
    }
}

/// Tracks the lifecycle state of one cluster and logs transitions
#[derive(Debug)]
pub struct Lifecycle {
    resource: String,
    state: LifecycleState,
}

impl Lifecycle {
    pub fn new(identity: &ClusterIdentity, state: LifecycleState) -> Self {
        Self {
            resource: identity.to_string(),
            state,
        }
    }

    pub fn advance(&mut self, next: LifecycleState) {
        if !self.state.can_transition_to(next) {
            warn!("Unexpected lifecycle transition for {}: {} -> {}", self.resource, self.state, next);
        }
        debug!("Cluster {}: {} -> {}", self.resource, self.state, next);
        self.state = next;
    }

    /// Move to `target` on success, `Failed` otherwise
    pub fn settle<T>(&mut self, outcome: &Result<T, ReconcileError>, target: LifecycleState) {
        match outcome {
            Ok(_) => self.advance(target),
            Err(_) => self.advance(LifecycleState::Failed),
        }
    }
}

/// A mutation to submit
#[derive(Debug, Clone, Copy)]
pub enum Submission<'a> {
    Create(&'a OpenShiftManagedCluster),
    Update(&'a OpenShiftManagedCluster),
    Delete,
}

impl Submission<'_> {
    pub fn kind(&self) -> OperationKind {
        match self {
            Submission::Create(_) => OperationKind::Create,
            Submission::Update(_) => OperationKind::Update,
            Submission::Delete => OperationKind::Delete,
        }
    }
}

impl Reconciler {
    /// Submit a mutation and wait for it to finish.
    ///
    /// Leaves `lifecycle` in `Polling` on success and `Failed` on error.
    pub(crate) async fn run_operation(
        &self,
        lifecycle: &mut Lifecycle,
        identity: &ClusterIdentity,
        submission: Submission<'_>,
        observer: &dyn OperationObserver,
        cancel: &CancellationToken,
    ) -> Result<(), ReconcileError> {
        let resource_id = identity.resource_id();
        let operation = submission.kind();

        lifecycle.advance(LifecycleState::Submitting);
        let submitted = match submission {
            Submission::Create(body) => self.client.begin_create(&resource_id, body).await,
            Submission::Update(body) => self.client.begin_update(&resource_id, body).await,
            Submission::Delete => self.client.begin_delete(&resource_id).await,
        };
        let handle = match submitted {
            Ok(handle) => handle,
            Err(e) => {
                lifecycle.advance(LifecycleState::Failed);
                return Err(match operation {
                    // Lost the race with another creator after the guard passed
                    OperationKind::Create if e.is_conflict() => ReconcileError::AlreadyExists { id: resource_id },
                    _ => e.into(),
                });
            }
        };
        info!("Submitted {} of cluster {}", operation, identity);
        observer.accepted(&handle).await;

        lifecycle.advance(LifecycleState::Polling);
        let deadline = self.settings.timeouts.for_operation(operation);
        let outcome = self.wait_for_completion(&handle, deadline, cancel).await;
        if outcome.is_err() {
            lifecycle.advance(LifecycleState::Failed);
        }
        outcome
    }

    /// Poll an accepted operation until it reaches a terminal status.
    ///
    /// Transient poll errors are logged and polling continues. Returns
    /// `Timeout` once `deadline` has elapsed and `Canceled` when `cancel` fires.
    pub(crate) async fn wait_for_completion(
        &self,
        handle: &OperationHandle,
        deadline: std::time::Duration,
        cancel: &CancellationToken,
    ) -> Result<(), ReconcileError> {
        let started = Instant::now();
        let mut backoff = PollBackoff::new(self.settings.poll);
        let mut hint = handle.retry_after;

        let canceled = || ReconcileError::Canceled {
            operation: handle.kind,
            id: handle.resource_id.clone(),
            handle: handle.clone(),
        };
        let read_timeout = self.settings.timeouts.read;

        loop {
            if cancel.is_cancelled() {
                return Err(canceled());
            }

            let Ok(polled) = tokio::time::timeout(read_timeout, self.client.poll_operation(handle)).await else {
                warn!(
                    "Status poll for {} of {} took longer than {:?}",
                    handle.kind, handle.resource_id, read_timeout
                );
                continue_or_timeout(handle, started, deadline)?;
                continue;
            };

            match polled {
                Ok(OperationStatus::Succeeded) => {
                    debug!("{} of {} succeeded", handle.kind, handle.resource_id);
                    return Ok(());
                }
                Ok(OperationStatus::Failed(reason)) => {
                    return Err(ReconcileError::RemoteOperationFailed {
                        operation: handle.kind,
                        id: handle.resource_id.clone(),
                        reason,
                    });
                }
                Ok(OperationStatus::Pending) => {}
                // The status resource can disappear along with a deleted cluster
                Err(e) if e.is_not_found() && handle.kind == OperationKind::Delete => return Ok(()),
                Err(e) if e.is_transient() => {
                    warn!("Transient error polling {} of {}: {}", handle.kind, handle.resource_id, e);
                }
                Err(e) => return Err(e.into()),
            }

            let remaining = continue_or_timeout(handle, started, deadline)?;
            let delay = backoff.next_delay(hint.take()).min(remaining);
            tokio::select! {
                _ = cancel.cancelled() => return Err(canceled()),
                _ = sleep(delay) => {}
            }
        }
    }
}

/// Time left before `deadline`, or `Timeout` carrying the still-running handle
fn continue_or_timeout(
    handle: &OperationHandle,
    started: Instant,
    deadline: std::time::Duration,
) -> Result<std::time::Duration, ReconcileError> {
    let elapsed = started.elapsed();
    deadline
        .checked_sub(elapsed)
        .filter(|remaining| !remaining.is_zero())
        .ok_or_else(|| ReconcileError::Timeout {
            operation: handle.kind,
            id: handle.resource_id.clone(),
            elapsed,
            handle: Some(handle.clone()),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_path_transitions() {
        use LifecycleState::*;
        assert!(Absent.can_transition_to(Submitting));
        assert!(Submitting.can_transition_to(Polling));
        assert!(Polling.can_transition_to(Ready));
        assert!(Polling.can_transition_to(Absent));
        assert!(Failed.can_transition_to(Submitting));
    }

    #[test]
    fn test_invalid_transitions() {
        use LifecycleState::*;
        assert!(!Absent.can_transition_to(Ready));
        assert!(!Absent.can_transition_to(Polling));
        assert!(!Ready.can_transition_to(Absent));
        assert!(!Submitting.can_transition_to(Ready));
    }

    #[test]
    fn test_settle_moves_to_failed_on_error() {
        let identity = crate::test_utils::identity();
        let mut lifecycle = Lifecycle::new(&identity, LifecycleState::Polling);
        lifecycle.settle::<()>(&Err(ReconcileError::NotFound("gone".to_string())), LifecycleState::Ready);
        assert_eq!(lifecycle.state, LifecycleState::Failed);
    }
}
