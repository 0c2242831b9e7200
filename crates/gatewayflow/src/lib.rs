//! GatewayFlow provisioning demo
//!
//! Authenticates against a control plane, creates an application gateway,
//! reconfigures its routing rule for SSL offload, and always deletes the
//! resource group it provisioned into.

pub mod driver;
pub mod error;
pub mod print;
pub mod progress;
pub mod scenario;

pub use driver::{CleanupOutcome, CredentialSource, DemoDriver, RunReport, StepOutcome};
pub use error::{DemoError, Phase};
