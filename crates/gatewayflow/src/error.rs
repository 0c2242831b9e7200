use gatewayflow_cloud::CloudError;
use thiserror::Error;

/// Step of a run that talks to the control plane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Create,
    Update,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Create => write!(f, "create"),
            Phase::Update => write!(f, "update"),
        }
    }
}

#[derive(Error, Debug)]
pub enum DemoError {
    #[error("Authentication failed")]
    Authentication(#[source] CloudError),

    #[error("Application gateway {phase} failed")]
    Provisioning {
        phase: Phase,
        #[source]
        source: CloudError,
    },

    #[error("Failed to delete resource group {resource_group}")]
    Cleanup {
        resource_group: String,
        #[source]
        source: CloudError,
    },
}

impl DemoError {
    pub fn provisioning(phase: Phase, source: CloudError) -> Self {
        DemoError::Provisioning { phase, source }
    }

    /// Message followed by every source, separated by ": "
    pub fn chain(&self) -> String {
        let mut out = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            out.push_str(": ");
            out.push_str(&err.to_string());
            source = err.source();
        }
        out
    }
}

pub type Result<T> = std::result::Result<T, DemoError>;
