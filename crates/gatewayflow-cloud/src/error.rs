//! Management client error types

use thiserror::Error;

/// Errors surfaced by a management client or the gateway model
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Invalid credentials file {path}: {reason}")]
    InvalidCredentials { path: String, reason: String },

    #[error("Request rejected by control plane: {0}")]
    Rejected(String),

    #[error("Resource group not found: {0}")]
    ResourceGroupNotFound(String),

    #[error("Application gateway not found: {0}")]
    GatewayNotFound(String),

    #[error("Routing rule already exists: {0}")]
    RuleNameConflict(String),

    #[error("Routing rule not found: {0}")]
    RuleNotFound(String),

    #[error("Backend pool not found: {0}")]
    BackendPoolNotFound(String),

    #[error("Invalid TLS certificate: {0}")]
    InvalidCertificate(String),

    #[error("Invalid gateway configuration: {0}")]
    InvalidConfig(String),

    #[error("Long-running operation {operation} failed: {reason}")]
    OperationFailed { operation: String, reason: String },

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CloudError>;
