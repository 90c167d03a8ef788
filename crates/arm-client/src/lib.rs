//! Azure Resource Manager Client
//!
//! A Rust client library for the `Microsoft.ContainerService/openShiftManagedClusters`
//! ARM resource. Provides typed models, long-running operation handles, and a
//! trait seam so controllers can be tested against an in-memory mock.
//!
//! # Example
//!
//! ```no_run
//! use arm_client::{OpenShiftClient, OpenShiftClientTrait, OperationStatus};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OpenShiftClient::new(
//!     "https://management.azure.com".to_string(),
//!     "bearer-token".to_string(),
//! )?;
//!
//! let id = "/subscriptions/0000/resourceGroups/rg/providers/Microsoft.ContainerService/openShiftManagedClusters/demo";
//! let handle = client.begin_delete(id).await?;
//! while client.poll_operation(&handle).await? == OperationStatus::Pending {
//!     tokio::time::sleep(std::time::Duration::from_secs(10)).await;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Conditional writes**: create uses `If-None-Match: *`, update uses `If-Match: *`
//! - **Async operations**: `Azure-AsyncOperation` and `Location` polling, `Retry-After` hints
//! - **Error classification**: not found, conflict, and transient failures are distinct variants

pub mod client;
pub mod common;
pub mod error;
pub mod models;
#[path = "trait.rs"]
pub mod openshift_trait;
#[cfg(feature = "test-util")]
pub mod mock;

pub use client::{OpenShiftClient, DEFAULT_ENDPOINT};
pub use common::HttpClient;
pub use error::ArmError;
pub use models::*;
pub use openshift_trait::OpenShiftClientTrait;
#[cfg(feature = "test-util")]
pub use mock::MockOpenShiftClient;
