//! Simulated control plane for GatewayFlow
//!
//! This crate implements the `ManagementClient` trait entirely in process,
//! so the provisioning demo can run end to end without a cloud account.
//!
//! # Behavior
//!
//! - Credentials are accepted unless a fault says otherwise
//! - Create and update are long-running operations that settle after a
//!   configurable latency and are polled to completion
//! - Desired-state invariants (unique rule names, known backend pools, well
//!   formed certificates) are enforced like a real control plane would
//! - Every call is recorded in an audit log
//!
//! # Example
//!
//! ```ignore
//! use gatewayflow_cloud::ManagementClient;
//! use gatewayflow_cloud_sim::{Faults, SimulatedCloud};
//!
//! let cloud = SimulatedCloud::new()
//!     .with_latency(std::time::Duration::from_secs(2))
//!     .with_faults(Faults { fail_update: Some("boom".into()), ..Faults::default() });
//!
//! let session = cloud.authenticate(&credentials).await?;
//! ```

pub mod control_plane;
pub mod provider;

pub use control_plane::{AuditEvent, GatewaySnapshot};
pub use provider::{Faults, SimulatedCloud};
