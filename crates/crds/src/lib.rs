//! Managed OpenShift CRD Definitions
//!
//! Kubernetes Custom Resource Definitions for the OpenShift cluster controller.
//!
//! - `OpenShiftCluster`: desired state of one Azure Red Hat OpenShift managed cluster
//!   (`spec`) and the state last observed on Azure (`status.observed`).

pub mod observed;
pub mod openshift_cluster;
pub mod profiles;
pub mod references;

pub use observed::*;
pub use openshift_cluster::*;
pub use profiles::*;
pub use references::*;
