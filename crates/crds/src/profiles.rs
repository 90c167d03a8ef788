//! Cluster profile types
//!
//! Declared shapes for the master pool, agent pools, network, routers and
//! authentication of a managed OpenShift cluster. Values here are the
//! user-facing configuration form: enums are plain strings matched
//! case-insensitively by the controller, and optional strings treat `""` as unset.

use crate::references::SecretKeyReference;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default node count for a pool
pub const DEFAULT_POOL_COUNT: i64 = 1;

/// Default operating system for a pool
pub const DEFAULT_OS_TYPE: &str = "Linux";

/// Default role for an agent pool
pub const DEFAULT_AGENT_ROLE: &str = "Compute";

/// Discriminator of the Azure Active Directory identity provider
pub const AAD_PROVIDER_KIND: &str = "AADIdentityProvider";

fn default_count() -> i64 {
    DEFAULT_POOL_COUNT
}

fn default_os_type() -> String {
    DEFAULT_OS_TYPE.to_string()
}

fn default_role() -> String {
    DEFAULT_AGENT_ROLE.to_string()
}

/// Master (control plane) pool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MasterPoolProfile {
    /// Pool name, `^[a-z][a-z0-9]{0,11}$`
    pub name: String,

    /// Number of nodes (1-100)
    #[serde(default = "default_count")]
    pub count: i64,

    /// Azure VM size, e.g. "Standard_D4s_v3"
    pub vm_size: String,

    /// Operating system: Linux or Windows
    #[serde(default = "default_os_type")]
    pub os_type: String,

    /// Subnet CIDR inside the cluster virtual network
    pub subnet_cidr: String,
}

/// Agent (worker / infra) pool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AgentPoolProfile {
    /// Pool name, `^[a-z][a-z0-9]{0,11}$`
    pub name: String,

    /// Number of nodes (1-100)
    #[serde(default = "default_count")]
    pub count: i64,

    /// Azure VM size
    pub vm_size: String,

    /// Operating system: Linux or Windows
    #[serde(default = "default_os_type")]
    pub os_type: String,

    /// Subnet CIDR inside the cluster virtual network
    pub subnet_cidr: String,

    /// Pool role: Compute or Infra
    #[serde(default = "default_role")]
    pub role: String,
}

/// Cluster virtual network
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct NetworkProfile {
    /// Address space of the cluster virtual network
    pub vnet_cidr: String,

    /// Resource ID of a virtual network to peer with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peer_vnet_id: Option<String>,

    /// Resource ID of the cluster virtual network (assigned by Azure when omitted)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vnet_id: Option<String>,
}

/// Router (ingress) profile
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RouterProfile {
    /// Router name, usually "default"
    pub name: String,

    /// DNS subdomain for applications exposed by the router
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_subdomain: Option<String>,
}

/// Authentication profile
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AuthProfile {
    /// Identity providers, in order
    #[serde(default)]
    pub identity_providers: Vec<IdentityProvider>,
}

/// Named identity provider
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct IdentityProvider {
    /// Display name, e.g. "Azure AD"
    pub name: String,

    /// Provider configuration
    pub provider: IdentityProviderConfig,
}

/// Identity provider configuration
///
/// `kind` selects the variant; the remaining fields apply to the
/// `AADIdentityProvider` kind. The AAD tenant is not declared here: the
/// controller always sends its own tenant.
#[derive(Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct IdentityProviderConfig {
    /// Provider discriminator, e.g. "AADIdentityProvider"
    pub kind: String,

    /// AAD application (client) ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// AAD application secret. Prefer `clientSecretRef`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    /// Secret holding the AAD application secret
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret_ref: Option<SecretKeyReference>,

    /// AAD group whose members become cluster admins
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_admin_group_id: Option<String>,
}

impl std::fmt::Debug for IdentityProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityProviderConfig")
            .field("kind", &self.kind)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("client_secret_ref", &self.client_secret_ref)
            .field("customer_admin_group_id", &self.customer_admin_group_id)
            .finish()
    }
}
