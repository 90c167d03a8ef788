//! Prints the CustomResourceDefinition manifests as YAML
//!
//! `cargo run -p crds --bin crdgen > config/crd/openshiftcluster.yaml`

use crds::OpenShiftCluster;
use kube::CustomResourceExt;

fn main() -> anyhow::Result<()> {
    print!("{}", serde_yaml::to_string(&OpenShiftCluster::crd())?);
    Ok(())
}
