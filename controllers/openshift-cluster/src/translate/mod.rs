//! Profile translators.
//!
//! Pure `expand` (declared configuration -> ARM request model) and `flatten`
//! (ARM response model -> observed state) functions, one module per profile:
//! - `pool`: master and agent pools
//! - `network`: virtual network
//! - `router`: routers
//! - `auth`: authentication and identity provider variants
//! - `cluster`: the whole resource

pub mod auth;
pub mod cluster;
pub mod network;
pub mod pool;
pub mod router;

pub use cluster::{expand_cluster, flatten_cluster};
