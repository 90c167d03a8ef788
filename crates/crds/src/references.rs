//! Kubernetes object references used by the OpenShift CRDs
//!
//! Credentials are never required inline in a cluster spec; they can be pulled
//! from a Kubernetes Secret in the same namespace instead.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Reference to a single key of a Kubernetes Secret
///
/// Follows the Kubernetes `SecretKeySelector` shape (`name` + `key`).
/// The namespace is always the namespace of the referencing resource.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SecretKeyReference {
    /// Name of the Secret
    pub name: String,

    /// Key within the Secret's `data`
    pub key: String,
}

impl std::fmt::Display for SecretKeyReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "secret/{}[{}]", self.name, self.key)
    }
}
