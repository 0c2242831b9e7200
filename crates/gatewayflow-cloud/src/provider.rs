//! Management client trait definition

use crate::change::ChangeSet;
use crate::credentials::Credentials;
use crate::error::Result;
use crate::model::{Gateway, GatewaySpec};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cloud management API abstraction
///
/// Every call blocks until the control plane reports a terminal state;
/// long-running operation polling is the implementation's concern.
#[async_trait]
pub trait ManagementClient: Send + Sync {
    /// Returns the provider name (e.g., "azure", "simulated")
    fn name(&self) -> &str;

    /// Exchange credentials for a session bound to the default subscription
    async fn authenticate(&self, credentials: &Credentials) -> Result<Session>;

    /// Create a gateway, its public IP and (if needed) its resource group
    async fn create_gateway(&self, session: &Session, spec: &GatewaySpec) -> Result<Gateway>;

    /// Apply a change set to an existing gateway as one operation
    async fn update_gateway(
        &self,
        session: &Session,
        gateway: &Gateway,
        changes: &ChangeSet,
    ) -> Result<Gateway>;

    /// Fetch the current state of a gateway
    async fn get_gateway(
        &self,
        session: &Session,
        resource_group: &str,
        name: &str,
    ) -> Result<Gateway>;

    /// Delete a resource group and everything inside it
    async fn delete_resource_group(&self, session: &Session, name: &str) -> Result<()>;
}

/// Authenticated session handle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub subscription_id: String,
    pub tenant_id: String,

    /// Opaque access token
    #[serde(skip_serializing)]
    pub access_token: String,

    pub established_at: DateTime<Utc>,
}

impl Session {
    pub fn new(
        subscription_id: impl Into<String>,
        tenant_id: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            tenant_id: tenant_id.into(),
            access_token: access_token.into(),
            established_at: Utc::now(),
        }
    }

    /// ARM id of a resource group in this session's subscription
    pub fn resource_group_id(&self, resource_group: &str) -> String {
        format!(
            "/subscriptions/{}/resourceGroups/{}",
            self.subscription_id, resource_group
        )
    }

    /// ARM id of a network resource in this session's subscription
    pub fn network_resource_id(&self, resource_group: &str, kind: &str, name: &str) -> String {
        format!(
            "{}/providers/Microsoft.Network/{}/{}",
            self.resource_group_id(resource_group),
            kind,
            name
        )
    }
}
