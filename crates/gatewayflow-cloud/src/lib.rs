//! GatewayFlow Cloud
//!
//! Management client abstraction and desired-state model for application
//! gateways.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │              gateway-demo (driver)               │
//! │   authenticate → create → update → cleanup       │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │               gatewayflow-cloud                  │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │         Management Client Trait          │   │
//! │  │  trait ManagementClient { ... }          │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────┐            │
//! │  │ GatewaySpec  │  │  ChangeSet   │            │
//! │  └──────────────┘  └──────────────┘            │
//! └───────┬─────────────────────────────────────────┘
//!         │
//! ┌───────▼────────────┐
//! │ gatewayflow-cloud- │
//! │ sim (in-process)   │
//! └────────────────────┘
//! ```

pub mod change;
pub mod credentials;
pub mod error;
pub mod lro;
pub mod model;
pub mod provider;

// Re-exports
pub use change::{Change, ChangeKind, ChangeSet, ChangeSummary};
pub use credentials::{AUTH_LOCATION_ENV, Credentials};
pub use error::{CloudError, Result};
pub use lro::{OperationStatus, PollConfig, poll_until_done};
pub use model::{
    BackendPool, Frontend, Gateway, GatewaySpec, Listener, OperationalState, Protocol,
    ProvisioningState, PublicIp, Region, RoutingRule, Sku, TlsCertificate,
};
pub use provider::{ManagementClient, Session};
