//! Mock OpenShiftClient for unit testing
//!
//! This module provides a mock implementation of OpenShiftClientTrait that can be used
//! in unit tests without an Azure subscription. Mutations are applied when their
//! operation is polled to `Succeeded`, the way ARM only materialises a cluster
//! once provisioning finishes.

use crate::error::ArmError;
use crate::models::*;
use crate::openshift_trait::OpenShiftClientTrait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Operations that can be scripted to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOperation {
    Get,
    Create,
    Update,
    Delete,
    Poll,
}

/// Failure returned by a scripted operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockFailure {
    NotFound,
    Conflict,
    Transient,
    Authentication,
    Api(String),
}

impl MockFailure {
    fn into_error(self, resource_id: &str) -> ArmError {
        match self {
            MockFailure::NotFound => ArmError::NotFound(format!("Resource not found: {}", resource_id)),
            MockFailure::Conflict => ArmError::Conflict(format!("Resource already exists: {}", resource_id)),
            MockFailure::Transient => ArmError::Transient(format!("Service unavailable: {}", resource_id)),
            MockFailure::Authentication => ArmError::Authentication("token expired".to_string()),
            MockFailure::Api(message) => ArmError::Api(message),
        }
    }
}

/// Recorded call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Get(String),
    Create(String),
    Update(String),
    Delete(String),
    Poll(String),
}

#[derive(Debug, Clone)]
struct PendingOperation {
    handle: OperationHandle,
    body: Option<OpenShiftManagedCluster>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn key(resource_id: &str) -> String {
    resource_id.to_ascii_lowercase()
}

/// Mock OpenShiftClient for testing
///
/// Clusters live in memory. Poll results can be scripted with
/// [`MockOpenShiftClient::script_polls`]; once the script is exhausted every
/// poll reports `Succeeded`.
#[derive(Clone)]
pub struct MockOpenShiftClient {
    endpoint: String,
    clusters: Arc<Mutex<HashMap<String, OpenShiftManagedCluster>>>,
    pending: Arc<Mutex<HashMap<String, PendingOperation>>>,
    poll_script: Arc<Mutex<VecDeque<OperationStatus>>>,
    failures: Arc<Mutex<HashMap<MockOperation, MockFailure>>>,
    calls: Arc<Mutex<Vec<MockCall>>>,
    submitted: Arc<Mutex<Vec<OpenShiftManagedCluster>>>,
    retain_on_delete: Arc<Mutex<bool>>,
}

impl MockOpenShiftClient {
    /// Create a new mock client
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            clusters: Arc::new(Mutex::new(HashMap::new())),
            pending: Arc::new(Mutex::new(HashMap::new())),
            poll_script: Arc::new(Mutex::new(VecDeque::new())),
            failures: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            submitted: Arc::new(Mutex::new(Vec::new())),
            retain_on_delete: Arc::new(Mutex::new(false)),
        }
    }

    /// Add a cluster to the mock store (for test setup). A provisioning state
    /// set on `cluster` is kept; otherwise it reads as "Succeeded".
    pub fn add_cluster(&self, resource_id: &str, cluster: OpenShiftManagedCluster) {
        let cluster = materialize(resource_id, cluster);
        lock(&self.clusters).insert(key(resource_id), cluster);
    }

    /// Returns the stored cluster, if any
    pub fn cluster(&self, resource_id: &str) -> Option<OpenShiftManagedCluster> {
        lock(&self.clusters).get(&key(resource_id)).cloned()
    }

    /// Queue poll results, consumed one per `poll_operation` call
    pub fn script_polls(&self, statuses: impl IntoIterator<Item = OperationStatus>) {
        lock(&self.poll_script).extend(statuses);
    }

    /// Make the next call of `operation` fail
    pub fn fail_next(&self, operation: MockOperation, failure: MockFailure) {
        lock(&self.failures).insert(operation, failure);
    }

    /// Keep clusters in place after a successful delete (stale read-after-delete)
    pub fn retain_on_delete(&self, retain: bool) {
        *lock(&self.retain_on_delete) = retain;
    }

    /// All recorded calls, in order
    pub fn calls(&self) -> Vec<MockCall> {
        lock(&self.calls).clone()
    }

    /// Number of recorded calls matching `predicate`
    pub fn count_calls(&self, predicate: impl Fn(&MockCall) -> bool) -> usize {
        lock(&self.calls).iter().filter(|call| predicate(call)).count()
    }

    pub fn create_calls(&self) -> usize {
        self.count_calls(|call| matches!(call, MockCall::Create(_)))
    }

    pub fn update_calls(&self) -> usize {
        self.count_calls(|call| matches!(call, MockCall::Update(_)))
    }

    pub fn delete_calls(&self) -> usize {
        self.count_calls(|call| matches!(call, MockCall::Delete(_)))
    }

    pub fn poll_calls(&self) -> usize {
        self.count_calls(|call| matches!(call, MockCall::Poll(_)))
    }

    /// Request bodies sent with create/update, in order (secrets included)
    pub fn submitted(&self) -> Vec<OpenShiftManagedCluster> {
        lock(&self.submitted).clone()
    }

    fn record(&self, call: MockCall) {
        lock(&self.calls).push(call);
    }

    fn take_failure(&self, operation: MockOperation) -> Option<MockFailure> {
        lock(&self.failures).remove(&operation)
    }

    fn start(&self, kind: OperationKind, resource_id: &str, body: Option<OpenShiftManagedCluster>) -> OperationHandle {
        let url = format!("{}/operations/{}", self.endpoint, uuid::Uuid::new_v4());
        let handle = OperationHandle {
            kind,
            resource_id: resource_id.to_string(),
            status_url: Some(url.clone()),
            poll_mode: PollMode::AsyncOperation,
            retry_after: None,
        };
        lock(&self.pending).insert(
            url,
            PendingOperation {
                handle: handle.clone(),
                body,
            },
        );
        handle
    }

    fn complete(&self, operation: PendingOperation) {
        let resource_id = &operation.handle.resource_id;
        match (operation.handle.kind, operation.body) {
            (OperationKind::Create | OperationKind::Update, Some(body)) => {
                let cluster = materialize(resource_id, body);
                lock(&self.clusters).insert(key(resource_id), cluster);
            }
            (OperationKind::Delete, _) => {
                if !*lock(&self.retain_on_delete) {
                    lock(&self.clusters).remove(&key(resource_id));
                }
            }
            _ => {}
        }
    }
}

/// Fill read-only fields the way ARM would and drop write-only secrets
fn materialize(resource_id: &str, mut cluster: OpenShiftManagedCluster) -> OpenShiftManagedCluster {
    let name = resource_id.rsplit('/').next().unwrap_or_default().to_string();
    let location = cluster.location.clone().unwrap_or_default();
    let domain = format!("{}.{}.cloudapp.azure.com", name, location);

    cluster.id = Some(resource_id.to_string());
    cluster.name = Some(name);
    cluster.resource_type = Some(format!("{}/{}", PROVIDER_NAMESPACE, RESOURCE_TYPE));

    let properties = cluster.properties.get_or_insert_with(Default::default);
    properties
        .provisioning_state
        .get_or_insert_with(|| "Succeeded".to_string());
    properties.fqdn = Some(domain.clone());
    properties.public_hostname = Some(format!("openshift.{}", domain));
    properties.cluster_version.get_or_insert_with(|| "3.11.154".to_string());

    if let Some(network) = properties.network_profile.as_mut() {
        network
            .vnet_id
            .get_or_insert_with(|| format!("{}/virtualNetworks/vnet", resource_id));
    }

    let routers = properties.router_profiles.get_or_insert_with(|| {
        vec![RouterProfile {
            name: Some("default".to_string()),
            ..Default::default()
        }]
    });
    for router in routers.iter_mut() {
        let router_name = router.name.clone().unwrap_or_default();
        router.fqdn = Some(format!("{}.{}", router_name, domain));
    }

    if let Some(providers) = properties
        .auth_profile
        .as_mut()
        .and_then(|auth| auth.identity_providers.as_mut())
    {
        for provider in providers.iter_mut() {
            if let Some(IdentityProvider::Aad(aad)) = provider.provider.as_mut() {
                aad.secret = None;
            }
        }
    }

    cluster
}

#[async_trait::async_trait]
impl OpenShiftClientTrait for MockOpenShiftClient {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn get(&self, resource_id: &str) -> Result<OpenShiftManagedCluster, ArmError> {
        self.record(MockCall::Get(resource_id.to_string()));
        if let Some(failure) = self.take_failure(MockOperation::Get) {
            return Err(failure.into_error(resource_id));
        }
        self.cluster(resource_id)
            .ok_or_else(|| ArmError::NotFound(format!("Resource not found: {}", resource_id)))
    }

    async fn begin_create(
        &self,
        resource_id: &str,
        cluster: &OpenShiftManagedCluster,
    ) -> Result<OperationHandle, ArmError> {
        self.record(MockCall::Create(resource_id.to_string()));
        if let Some(failure) = self.take_failure(MockOperation::Create) {
            return Err(failure.into_error(resource_id));
        }
        if self.cluster(resource_id).is_some() {
            return Err(MockFailure::Conflict.into_error(resource_id));
        }
        lock(&self.submitted).push(cluster.clone());
        Ok(self.start(OperationKind::Create, resource_id, Some(cluster.clone())))
    }

    async fn begin_update(
        &self,
        resource_id: &str,
        cluster: &OpenShiftManagedCluster,
    ) -> Result<OperationHandle, ArmError> {
        self.record(MockCall::Update(resource_id.to_string()));
        if let Some(failure) = self.take_failure(MockOperation::Update) {
            return Err(failure.into_error(resource_id));
        }
        if self.cluster(resource_id).is_none() {
            return Err(MockFailure::NotFound.into_error(resource_id));
        }
        lock(&self.submitted).push(cluster.clone());
        Ok(self.start(OperationKind::Update, resource_id, Some(cluster.clone())))
    }

    async fn begin_delete(&self, resource_id: &str) -> Result<OperationHandle, ArmError> {
        self.record(MockCall::Delete(resource_id.to_string()));
        if let Some(failure) = self.take_failure(MockOperation::Delete) {
            return Err(failure.into_error(resource_id));
        }
        if self.cluster(resource_id).is_none() {
            return Err(MockFailure::NotFound.into_error(resource_id));
        }
        Ok(self.start(OperationKind::Delete, resource_id, None))
    }

    async fn poll_operation(&self, handle: &OperationHandle) -> Result<OperationStatus, ArmError> {
        self.record(MockCall::Poll(handle.resource_id.clone()));
        if let Some(failure) = self.take_failure(MockOperation::Poll) {
            return Err(failure.into_error(&handle.resource_id));
        }
        let Some(url) = handle.status_url.as_deref() else {
            return Ok(OperationStatus::Succeeded);
        };

        let status = lock(&self.poll_script)
            .pop_front()
            .unwrap_or(OperationStatus::Succeeded);

        if status.is_terminal() {
            let operation = lock(&self.pending).remove(url);
            if let (OperationStatus::Succeeded, Some(operation)) = (&status, operation) {
                self.complete(operation);
            }
        }
        Ok(status)
    }
}
