//! ARM data models
//!
//! Serde models matching the `Microsoft.ContainerService/openShiftManagedClusters`
//! resource (api-version 2019-04-30) and the ARM long-running operation protocol.
//! Every field is optional on the wire; the controller decides what is required.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Resource provider namespace
pub const PROVIDER_NAMESPACE: &str = "Microsoft.ContainerService";

/// Resource type within the provider
pub const RESOURCE_TYPE: &str = "openShiftManagedClusters";

/// API version used for every request
pub const API_VERSION: &str = "2019-04-30";

/// OpenShift managed cluster resource
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct OpenShiftManagedCluster {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<PurchasePlan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<OpenShiftManagedClusterProperties>,
}

/// Marketplace plan
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PurchasePlan {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
}

/// Cluster properties
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct OpenShiftManagedClusterProperties {
    /// Read-only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
    #[serde(rename = "openShiftVersion", default, skip_serializing_if = "Option::is_none")]
    pub openshift_version: Option<String>,
    /// Read-only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_version: Option<String>,
    /// Read-only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_hostname: Option<String>,
    /// Read-only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fqdn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_profile: Option<NetworkProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub router_profiles: Option<Vec<RouterProfile>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_pool_profile: Option<MasterPoolProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_pool_profiles: Option<Vec<AgentPoolProfile>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_profile: Option<AuthProfile>,
}

/// Cluster virtual network
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct NetworkProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vnet_cidr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peer_vnet_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vnet_id: Option<String>,
}

/// Router profile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RouterProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_subdomain: Option<String>,
    /// Read-only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fqdn: Option<String>,
}

/// Operating system of a pool
///
/// Decoding ignores case; values this client does not know become `Unknown`
/// instead of failing the whole response.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
pub enum OsType {
    Linux,
    Windows,
    Unknown,
}

impl<'de> Deserialize<'de> for OsType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(match_variant(&raw, &[("Linux", OsType::Linux), ("Windows", OsType::Windows)]).unwrap_or(OsType::Unknown))
    }
}

/// Role of an agent pool
///
/// Encoded lower case. Decoding ignores case and maps unknown roles to `Unknown`.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AgentPoolRole {
    Compute,
    Infra,
    Unknown,
}

impl<'de> Deserialize<'de> for AgentPoolRole {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(
            match_variant(&raw, &[("compute", AgentPoolRole::Compute), ("infra", AgentPoolRole::Infra)])
                .unwrap_or(AgentPoolRole::Unknown),
        )
    }
}

fn match_variant<T: Copy>(raw: &str, variants: &[(&str, T)]) -> Option<T> {
    variants
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(raw.trim()))
        .map(|(_, value)| *value)
}

/// Master pool profile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct MasterPoolProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vm_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet_cidr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_type: Option<OsType>,
}

/// Agent pool profile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AgentPoolProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vm_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet_cidr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_type: Option<OsType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<AgentPoolRole>,
}

/// Authentication profile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AuthProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_providers: Option<Vec<ManagedClusterIdentityProvider>>,
}

/// Named identity provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ManagedClusterIdentityProvider {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<IdentityProvider>,
}

/// Identity provider discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentityProviderKind {
    /// "AADIdentityProvider"
    Aad,
    /// "OpenShiftManagedClusterBaseIdentityProvider"
    Base,
}

impl IdentityProviderKind {
    /// Wire value of the `kind` field
    pub fn as_str(self) -> &'static str {
        match self {
            IdentityProviderKind::Aad => "AADIdentityProvider",
            IdentityProviderKind::Base => "OpenShiftManagedClusterBaseIdentityProvider",
        }
    }

    /// Decodes a wire `kind`; anything unrecognised is the base provider
    pub fn from_discriminator(kind: Option<&str>) -> Self {
        match kind {
            Some(kind) if kind.eq_ignore_ascii_case("AADIdentityProvider") => IdentityProviderKind::Aad,
            _ => IdentityProviderKind::Base,
        }
    }
}

/// Identity provider
///
/// Closed set of provider variants. Decoding reads `kind` first; unknown
/// discriminators become `Base` rather than an error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "RawIdentityProvider", into = "RawIdentityProvider")]
pub enum IdentityProvider {
    Aad(AadIdentityProvider),
    Base,
}

impl IdentityProvider {
    pub fn kind(&self) -> IdentityProviderKind {
        match self {
            IdentityProvider::Aad(_) => IdentityProviderKind::Aad,
            IdentityProvider::Base => IdentityProviderKind::Base,
        }
    }
}

/// Azure Active Directory identity provider
#[derive(Clone, PartialEq, Eq, Default)]
pub struct AadIdentityProvider {
    pub client_id: Option<String>,
    /// Write-only; Azure never returns it
    pub secret: Option<String>,
    pub tenant_id: Option<String>,
    pub customer_admin_group_id: Option<String>,
}

impl std::fmt::Debug for AadIdentityProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AadIdentityProvider")
            .field("client_id", &self.client_id)
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("tenant_id", &self.tenant_id)
            .field("customer_admin_group_id", &self.customer_admin_group_id)
            .finish()
    }
}

/// Flat wire form of [`IdentityProvider`]
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RawIdentityProvider {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tenant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    customer_admin_group_id: Option<String>,
}

impl From<RawIdentityProvider> for IdentityProvider {
    fn from(raw: RawIdentityProvider) -> Self {
        match IdentityProviderKind::from_discriminator(raw.kind.as_deref()) {
            IdentityProviderKind::Aad => IdentityProvider::Aad(AadIdentityProvider {
                client_id: raw.client_id,
                secret: raw.secret,
                tenant_id: raw.tenant_id,
                customer_admin_group_id: raw.customer_admin_group_id,
            }),
            IdentityProviderKind::Base => IdentityProvider::Base,
        }
    }
}

impl From<IdentityProvider> for RawIdentityProvider {
    fn from(provider: IdentityProvider) -> Self {
        let kind = Some(provider.kind().as_str().to_string());
        match provider {
            IdentityProvider::Aad(aad) => RawIdentityProvider {
                kind,
                client_id: aad.client_id,
                secret: aad.secret,
                tenant_id: aad.tenant_id,
                customer_admin_group_id: aad.customer_admin_group_id,
            },
            IdentityProvider::Base => RawIdentityProvider {
                kind,
                ..Default::default()
            },
        }
    }
}

/// Kind of remote operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Read,
    Create,
    Update,
    Delete,
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationKind::Read => write!(f, "read"),
            OperationKind::Create => write!(f, "create"),
            OperationKind::Update => write!(f, "update"),
            OperationKind::Delete => write!(f, "delete"),
        }
    }
}

/// How an operation's status URL reports progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollMode {
    /// `Azure-AsyncOperation`: body carries `status`
    AsyncOperation,
    /// `Location`: 202 while running, 200/204 when done
    Location,
}

/// Handle to an accepted long-running operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationHandle {
    pub kind: OperationKind,
    pub resource_id: String,
    /// `None` when the service completed the request synchronously
    pub status_url: Option<String>,
    pub poll_mode: PollMode,
    /// Provider-suggested delay before the next poll
    pub retry_after: Option<Duration>,
}

impl OperationHandle {
    /// Handle for a request that completed without an async operation
    pub fn completed(kind: OperationKind, resource_id: impl Into<String>) -> Self {
        Self {
            kind,
            resource_id: resource_id.into(),
            status_url: None,
            poll_mode: PollMode::AsyncOperation,
            retry_after: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status_url.is_none()
    }
}

/// Status of a long-running operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationStatus {
    Pending,
    Succeeded,
    /// Terminal failure with the provider's reason
    Failed(String),
}

impl OperationStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OperationStatus::Pending)
    }
}

/// Body of an `Azure-AsyncOperation` status resource
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AsyncOperationBody {
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ArmErrorDetail>,
}

impl AsyncOperationBody {
    pub fn to_status(&self) -> OperationStatus {
        if self.status.eq_ignore_ascii_case("Succeeded") {
            OperationStatus::Succeeded
        } else if self.status.eq_ignore_ascii_case("Failed") || self.status.eq_ignore_ascii_case("Canceled") {
            let reason = match &self.error {
                Some(detail) => detail.to_string(),
                None => format!("operation {}", self.status),
            };
            OperationStatus::Failed(reason)
        } else {
            OperationStatus::Pending
        }
    }
}

/// ARM error envelope
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ArmErrorResponse {
    pub error: ArmErrorDetail,
}

/// ARM error detail
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ArmErrorDetail {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

impl std::fmt::Display for ArmErrorDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}
