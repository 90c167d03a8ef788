//! Reconciler scenarios against the in-memory ARM mock.

use super::*;
use crate::backoff::PollSettings;
use crate::test_utils::{cluster_spec, identity, minimal_cluster_spec, AMBIENT_TENANT};
use arm_client::mock::{MockCall, MockFailure, MockOperation};
use arm_client::{ArmError, IdentityProvider, MockOpenShiftClient, OpenShiftManagedCluster, OperationStatus};
use std::sync::Mutex;
use std::time::Duration;

/// Keeps every accepted handle
#[derive(Default)]
struct RecordingObserver {
    accepted: Mutex<Vec<OperationHandle>>,
}

#[async_trait]
impl OperationObserver for RecordingObserver {
    async fn accepted(&self, handle: &OperationHandle) {
        self.accepted.lock().unwrap().push(handle.clone());
    }
}

/// Mock whose status polls never answer
struct HangingPolls(MockOpenShiftClient);

#[async_trait]
impl OpenShiftClientTrait for HangingPolls {
    fn endpoint(&self) -> &str {
        self.0.endpoint()
    }

    async fn get(&self, resource_id: &str) -> Result<OpenShiftManagedCluster, ArmError> {
        self.0.get(resource_id).await
    }

    async fn begin_create(
        &self,
        resource_id: &str,
        cluster: &OpenShiftManagedCluster,
    ) -> Result<OperationHandle, ArmError> {
        self.0.begin_create(resource_id, cluster).await
    }

    async fn begin_update(
        &self,
        resource_id: &str,
        cluster: &OpenShiftManagedCluster,
    ) -> Result<OperationHandle, ArmError> {
        self.0.begin_update(resource_id, cluster).await
    }

    async fn begin_delete(&self, resource_id: &str) -> Result<OperationHandle, ArmError> {
        self.0.begin_delete(resource_id).await
    }

    async fn poll_operation(&self, _handle: &OperationHandle) -> Result<OperationStatus, ArmError> {
        std::future::pending().await
    }
}

fn fast_settings() -> ReconcileSettings {
    ReconcileSettings {
        poll: PollSettings {
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            multiplier: 2,
        },
        ..Default::default()
    }
}

fn setup() -> (MockOpenShiftClient, Reconciler) {
    setup_with(fast_settings())
}

fn setup_with(settings: ReconcileSettings) -> (MockOpenShiftClient, Reconciler) {
    let client = MockOpenShiftClient::new("http://localhost");
    let reconciler = Reconciler::new(client.clone(), StaticTenant::new(AMBIENT_TENANT), settings);
    (client, reconciler)
}

/// Put the cluster described by `spec` in place as if it had been created earlier
fn seed(client: &MockOpenShiftClient, spec: &ClusterSpec) {
    let body = expand_cluster(spec, AMBIENT_TENANT).unwrap();
    client.add_cluster(&identity().resource_id(), body);
}

#[tokio::test]
async fn test_create_polls_until_succeeded_then_reads_once() {
    let (client, reconciler) = setup();
    client.script_polls([OperationStatus::Pending, OperationStatus::Pending, OperationStatus::Succeeded]);

    let state = reconciler
        .apply(&identity(), &cluster_spec(), Ownership::New, &NoopObserver, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(client.create_calls(), 1);
    assert_eq!(client.poll_calls(), 3);
    assert_eq!(state.id, identity().resource_id());
    assert_eq!(state.provisioning_state.as_deref(), Some("Succeeded"));
    assert_eq!(state.fqdn.as_deref(), Some("acctest1.eastus.cloudapp.azure.com"));

    // Guard read, then exactly one read after the last poll
    let calls = client.calls();
    let last_poll = calls.iter().rposition(|call| matches!(call, MockCall::Poll(_))).unwrap();
    let reads_after = calls[last_poll..]
        .iter()
        .filter(|call| matches!(call, MockCall::Get(_)))
        .count();
    assert_eq!(reads_after, 1);
    assert!(matches!(calls[0], MockCall::Get(_)));
}

#[tokio::test]
async fn test_create_of_existing_cluster_is_already_exists() {
    let (client, reconciler) = setup();
    seed(&client, &cluster_spec());

    let err = reconciler
        .apply(&identity(), &cluster_spec(), Ownership::New, &NoopObserver, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ReconcileError::AlreadyExists { id } if id == identity().resource_id()));
    assert_eq!(client.create_calls(), 0);
}

#[tokio::test]
async fn test_create_conflict_after_guard_is_already_exists() {
    let (client, reconciler) = setup();
    client.fail_next(MockOperation::Create, MockFailure::Conflict);

    let err = reconciler
        .apply(&identity(), &cluster_spec(), Ownership::New, &NoopObserver, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ReconcileError::AlreadyExists { .. }));
    assert_eq!(client.poll_calls(), 0);
}

#[tokio::test]
async fn test_import_adopts_existing_cluster() {
    let (client, reconciler) = setup();
    seed(&client, &cluster_spec());

    let state = reconciler
        .apply(&identity(), &cluster_spec(), Ownership::Import, &NoopObserver, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(state.name, "acctest1");
    assert_eq!(client.create_calls(), 0);
    assert_eq!(client.update_calls(), 0);
}

#[tokio::test]
async fn test_guard_skipped_when_import_not_required() {
    let (client, reconciler) = setup_with(ReconcileSettings {
        require_import: false,
        ..fast_settings()
    });
    seed(&client, &cluster_spec());

    let result = reconciler
        .apply(&identity(), &cluster_spec(), Ownership::New, &NoopObserver, &CancellationToken::new())
        .await;

    assert!(result.is_ok());
    assert_eq!(client.create_calls(), 0);
}

#[tokio::test]
async fn test_immutable_change_never_calls_update() {
    let (client, reconciler) = setup();
    seed(&client, &cluster_spec());
    let mut spec = cluster_spec();
    spec.master_pool_profile.vm_size = "Standard_D8s_v3".to_string();

    let err = reconciler
        .apply(&identity(), &spec, Ownership::Tracked, &NoopObserver, &CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        ReconcileError::ImmutableFieldChanged { fields } => {
            assert_eq!(fields, vec!["master_pool_profile.vm_size".to_string()]);
        }
        other => panic!("expected ImmutableFieldChanged, got {:?}", other),
    }
    assert_eq!(client.update_calls(), 0);
}

#[tokio::test]
async fn test_mutable_change_updates_in_place() {
    let (client, reconciler) = setup();
    seed(&client, &cluster_spec());
    let mut spec = cluster_spec();
    spec.agent_pool_profiles[0].count = 5;

    let state = reconciler
        .apply(&identity(), &spec, Ownership::Tracked, &NoopObserver, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(client.update_calls(), 1);
    assert_eq!(state.agent_pool_profiles[0].count, 5);
}

#[tokio::test]
async fn test_in_sync_cluster_is_left_alone() {
    let (client, reconciler) = setup();
    seed(&client, &cluster_spec());

    reconciler
        .apply(&identity(), &cluster_spec(), Ownership::Tracked, &NoopObserver, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(client.update_calls(), 0);
    assert_eq!(client.poll_calls(), 0);
}

#[tokio::test]
async fn test_tracked_cluster_removed_out_of_band_is_recreated() {
    let (client, reconciler) = setup();

    reconciler
        .apply(&identity(), &cluster_spec(), Ownership::Tracked, &NoopObserver, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(client.create_calls(), 1);
    assert!(client.cluster(&identity().resource_id()).is_some());
}

#[tokio::test]
async fn test_remote_failure_is_reported() {
    let (client, reconciler) = setup();
    client.script_polls([OperationStatus::Pending, OperationStatus::Failed("QuotaExceeded".to_string())]);

    let err = reconciler
        .apply(&identity(), &cluster_spec(), Ownership::New, &NoopObserver, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ReconcileError::RemoteOperationFailed { operation: OperationKind::Create, ref reason, .. } if reason == "QuotaExceeded"
    ));
    assert_eq!(err.accepted_resource(), Some(identity().resource_id().as_str()));
    assert!(client.cluster(&identity().resource_id()).is_none());
}

#[tokio::test]
async fn test_transient_poll_error_keeps_polling() {
    let (client, reconciler) = setup();
    client.fail_next(MockOperation::Poll, MockFailure::Transient);

    let result = reconciler
        .apply(&identity(), &cluster_spec(), Ownership::New, &NoopObserver, &CancellationToken::new())
        .await;

    assert!(result.is_ok());
    assert_eq!(client.poll_calls(), 2);
}

#[tokio::test]
async fn test_poll_timeout() {
    let mut settings = fast_settings();
    settings.timeouts.create = Duration::from_millis(20);
    let (client, reconciler) = setup_with(settings);
    client.script_polls(std::iter::repeat_n(OperationStatus::Pending, 10_000));

    let err = reconciler
        .apply(&identity(), &cluster_spec(), Ownership::New, &NoopObserver, &CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        ReconcileError::Timeout {
            operation: OperationKind::Create,
            handle: Some(handle),
            ..
        } => assert_eq!(handle.resource_id, identity().resource_id()),
        other => panic!("expected create Timeout with a handle, got {:?}", other),
    }
}

#[tokio::test]
async fn test_hung_poll_is_bounded_by_read_timeout() {
    let mut settings = fast_settings();
    settings.timeouts.read = Duration::from_millis(5);
    settings.timeouts.create = Duration::from_millis(30);
    let client = MockOpenShiftClient::new("http://localhost");
    let reconciler = Reconciler::new(HangingPolls(client.clone()), StaticTenant::new(AMBIENT_TENANT), settings);

    let err = tokio::time::timeout(
        Duration::from_secs(5),
        reconciler.apply(&identity(), &cluster_spec(), Ownership::New, &NoopObserver, &CancellationToken::new()),
    )
    .await
    .expect("apply must not hang on a stuck poll")
    .unwrap_err();

    assert!(matches!(
        err,
        ReconcileError::Timeout { operation: OperationKind::Create, handle: Some(_), .. }
    ));
    assert_eq!(client.create_calls(), 1);
}

#[tokio::test]
async fn test_create_timeout_then_retry_tracks_own_cluster() {
    let mut settings = fast_settings();
    settings.timeouts.create = Duration::from_millis(10);
    let (client, reconciler) = setup_with(settings);
    client.script_polls(std::iter::repeat_n(OperationStatus::Pending, 10_000));
    let observer = RecordingObserver::default();

    let err = reconciler
        .apply(&identity(), &cluster_spec(), Ownership::New, &observer, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(err.is_pending());
    assert_eq!(err.accepted_resource(), Some(identity().resource_id().as_str()));
    assert_eq!(observer.accepted.lock().unwrap()[0].kind, OperationKind::Create);

    // ARM finishes the accepted PUT in its own time
    seed(&client, &cluster_spec());

    let state = reconciler
        .apply(&identity(), &cluster_spec(), Ownership::Tracked, &NoopObserver, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(state.id, identity().resource_id());
    assert_eq!(client.create_calls(), 1);
    assert_eq!(client.update_calls(), 0);
}

#[tokio::test]
async fn test_canceled_create_can_be_polled_again() {
    let (client, reconciler) = setup();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = reconciler
        .apply(&identity(), &cluster_spec(), Ownership::New, &NoopObserver, &cancel)
        .await
        .unwrap_err();
    let handle = match err {
        ReconcileError::Canceled { handle, .. } => handle,
        other => panic!("expected Canceled, got {:?}", other),
    };

    reconciler
        .wait_for_completion(&handle, Duration::from_secs(5), &CancellationToken::new())
        .await
        .unwrap();
    assert!(client.cluster(&identity().resource_id()).is_some());

    reconciler
        .apply(&identity(), &cluster_spec(), Ownership::Tracked, &NoopObserver, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(client.create_calls(), 1);
}

#[tokio::test]
async fn test_tracked_cluster_still_creating_is_in_progress() {
    let (client, reconciler) = setup();
    let mut body = expand_cluster(&cluster_spec(), AMBIENT_TENANT).unwrap();
    body.properties.get_or_insert_with(Default::default).provisioning_state = Some("Creating".to_string());
    client.add_cluster(&identity().resource_id(), body);

    let err = reconciler
        .apply(&identity(), &cluster_spec(), Ownership::Tracked, &NoopObserver, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ReconcileError::OperationInProgress { ref state, .. } if state == "Creating"));
    assert!(err.is_retryable());
    assert_eq!(client.create_calls(), 0);
    assert_eq!(client.update_calls(), 0);
}

#[tokio::test]
async fn test_minimal_cluster_create_and_read_back() {
    let (client, reconciler) = setup();
    let spec = minimal_cluster_spec();

    let state = reconciler
        .apply(&identity(), &spec, Ownership::New, &NoopObserver, &CancellationToken::new())
        .await
        .unwrap();

    let submitted = client.submitted();
    let properties = submitted[0].properties.as_ref().unwrap();
    assert_eq!(properties.master_pool_profile.as_ref().and_then(|m| m.count), Some(1));
    assert_eq!(
        properties.agent_pool_profiles.as_ref().and_then(|a| a[0].role),
        Some(arm_client::AgentPoolRole::Compute)
    );

    assert_eq!(state.master_pool_profile.as_ref(), Some(&spec.master_pool_profile));
    assert_eq!(state.agent_pool_profiles, spec.agent_pool_profiles);
    assert_eq!(state.network_profile.as_ref().map(|n| n.vnet_cidr.as_str()), Some("10.0.0.0/8"));

    // Reading it back again finds nothing to change
    reconciler
        .apply(&identity(), &spec, Ownership::Tracked, &NoopObserver, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(client.update_calls(), 0);
}

#[tokio::test]
async fn test_cancel_stops_polling() {
    let (client, reconciler) = setup();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = reconciler
        .apply(&identity(), &cluster_spec(), Ownership::New, &NoopObserver, &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, ReconcileError::Canceled { operation: OperationKind::Create, .. }));
    assert_eq!(client.poll_calls(), 0);
}

#[tokio::test]
async fn test_destroy_removes_cluster() {
    let (client, reconciler) = setup();
    seed(&client, &cluster_spec());

    reconciler.destroy(&identity(), &CancellationToken::new()).await.unwrap();

    assert_eq!(client.delete_calls(), 1);
    assert!(client.cluster(&identity().resource_id()).is_none());
}

#[tokio::test]
async fn test_destroy_with_stale_read_is_stale_delete() {
    let (client, reconciler) = setup();
    seed(&client, &cluster_spec());
    client.retain_on_delete(true);

    let err = reconciler
        .destroy(&identity(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ReconcileError::StaleDelete { .. }));
}

#[tokio::test]
async fn test_destroy_unknown_cluster_is_not_found() {
    let (client, reconciler) = setup();

    let err = reconciler
        .destroy(&identity(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ReconcileError::NotFound(_)));
    assert_eq!(client.poll_calls(), 0);
}

#[tokio::test]
async fn test_refresh_of_missing_cluster_is_none() {
    let (_client, reconciler) = setup();
    assert_eq!(reconciler.refresh(&identity()).await.unwrap(), None);
}

#[tokio::test]
async fn test_refresh_reports_observed_state() {
    let (client, reconciler) = setup();
    seed(&client, &cluster_spec());

    let state = reconciler.refresh(&identity()).await.unwrap().unwrap();
    assert_eq!(state.master_pool_profile.as_ref(), Some(&cluster_spec().master_pool_profile));
    assert_eq!(state.cluster_version.as_deref(), Some("3.11.154"));
}

#[tokio::test]
async fn test_invalid_spec_makes_no_remote_calls() {
    let (client, reconciler) = setup();
    let mut spec = cluster_spec();
    spec.agent_pool_profiles[0].count = 0;

    let err = reconciler
        .apply(&identity(), &spec, Ownership::New, &NoopObserver, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ReconcileError::Validation(_)));
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn test_ambient_tenant_is_sent() {
    let (client, reconciler) = setup();

    reconciler
        .apply(&identity(), &cluster_spec(), Ownership::New, &NoopObserver, &CancellationToken::new())
        .await
        .unwrap();

    let submitted = client.submitted();
    let providers = submitted[0]
        .properties
        .as_ref()
        .and_then(|p| p.auth_profile.as_ref())
        .and_then(|a| a.identity_providers.clone())
        .unwrap();
    match providers[0].provider.as_ref() {
        Some(IdentityProvider::Aad(aad)) => {
            assert_eq!(aad.tenant_id.as_deref(), Some(AMBIENT_TENANT));
            assert_eq!(aad.secret.as_deref(), Some("client-secret"));
        }
        other => panic!("expected AAD provider, got {:?}", other),
    }
}
