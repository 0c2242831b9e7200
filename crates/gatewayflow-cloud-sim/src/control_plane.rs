//! In-memory control-plane state
//!
//! Holds resource groups, gateways and pending operations. Every mutating
//! request is recorded in an audit log so that callers can verify the exact
//! sequence of calls a run made.

use chrono::Utc;
use gatewayflow_cloud::{
    CloudError, Gateway, GatewaySpec, OperationStatus, OperationalState, ProvisioningState,
    PublicIp, Region, Result, Session, Sku,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::net::{IpAddr, Ipv4Addr};
use std::time::{Duration, Instant};

/// One recorded control-plane call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum AuditEvent {
    Authenticate {
        client_id: String,
        accepted: bool,
    },
    CreateGateway {
        resource_group: String,
        gateway: String,
        succeeded: bool,
    },
    UpdateGateway {
        resource_group: String,
        gateway: String,
        succeeded: bool,
    },
    DeleteResourceGroup {
        name: String,
        /// Gateways that existed in the group when deletion was requested
        gateways: Vec<GatewaySnapshot>,
        succeeded: bool,
    },
}

/// Gateway name and rule names at a point in time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewaySnapshot {
    pub name: String,
    pub rules: Vec<String>,
}

impl From<&Gateway> for GatewaySnapshot {
    fn from(gateway: &Gateway) -> Self {
        Self {
            name: gateway.name().to_string(),
            rules: gateway.rules().iter().map(|r| r.name.clone()).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ResourceGroup {
    pub(crate) region: Region,
    pub(crate) gateways: BTreeMap<String, Gateway>,
    pub(crate) public_ips: BTreeMap<String, PublicIp>,
}

#[derive(Debug)]
struct Operation {
    completes_at: Instant,
    failure: Option<String>,
}

#[derive(Debug, Default)]
pub(crate) struct ControlPlane {
    tokens: HashSet<String>,
    groups: BTreeMap<String, ResourceGroup>,
    operations: HashMap<String, Operation>,
    audit: Vec<AuditEvent>,
    next_id: u64,
}

/// First address handed out for public IPs
const PUBLIC_IP_BASE: Ipv4Addr = Ipv4Addr::new(52, 170, 0, 10);

impl ControlPlane {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub(crate) fn record(&mut self, event: AuditEvent) {
        tracing::debug!("audit: {:?}", event);
        self.audit.push(event);
    }

    pub(crate) fn audit(&self) -> &[AuditEvent] {
        &self.audit
    }

    pub(crate) fn issue_token(&mut self, client_id: &str) -> String {
        let token = format!("sim-token-{}-{}", client_id, self.next_id());
        self.tokens.insert(token.clone());
        token
    }

    pub(crate) fn check_session(&self, session: &Session) -> Result<()> {
        if self.tokens.contains(&session.access_token) {
            Ok(())
        } else {
            Err(CloudError::AuthenticationFailed(
                "session token is not recognized".into(),
            ))
        }
    }

    pub(crate) fn group(&self, name: &str) -> Option<&ResourceGroup> {
        self.groups.get(name)
    }

    pub(crate) fn gateway(&self, resource_group: &str, name: &str) -> Result<&Gateway> {
        self.groups
            .get(resource_group)
            .ok_or_else(|| CloudError::ResourceGroupNotFound(resource_group.to_string()))?
            .gateways
            .get(name)
            .ok_or_else(|| CloudError::GatewayNotFound(format!("{}/{}", resource_group, name)))
    }

    fn gateway_mut(&mut self, resource_group: &str, name: &str) -> Result<&mut Gateway> {
        self.groups
            .get_mut(resource_group)
            .ok_or_else(|| CloudError::ResourceGroupNotFound(resource_group.to_string()))?
            .gateways
            .get_mut(name)
            .ok_or_else(|| CloudError::GatewayNotFound(format!("{}/{}", resource_group, name)))
    }

    pub(crate) fn ensure_group(&mut self, name: &str, region: Region) {
        if !self.groups.contains_key(name) {
            tracing::debug!("Creating resource group {} in {}", name, region);
            self.groups.insert(
                name.to_string(),
                ResourceGroup {
                    region,
                    gateways: BTreeMap::new(),
                    public_ips: BTreeMap::new(),
                },
            );
        }
    }

    fn allocate_public_ip(&mut self, session: &Session, spec: &GatewaySpec) -> PublicIp {
        let offset = self.next_id() as u32;
        let address = IpAddr::V4(Ipv4Addr::from(u32::from(PUBLIC_IP_BASE) + offset));
        let ip = PublicIp {
            id: session.network_resource_id(
                &spec.resource_group,
                "publicIPAddresses",
                &spec.public_ip_name,
            ),
            name: spec.public_ip_name.clone(),
            address,
        };
        if let Some(group) = self.groups.get_mut(&spec.resource_group) {
            group.public_ips.insert(ip.name.clone(), ip.clone());
        }
        ip
    }

    /// Register a gateway in `Updating` state and start its create operation
    pub(crate) fn begin_create(
        &mut self,
        session: &Session,
        spec: &GatewaySpec,
        latency: Duration,
        failure: Option<String>,
    ) -> Result<String> {
        self.ensure_group(&spec.resource_group, spec.region);

        if self.gateway(&spec.resource_group, &spec.name).is_ok() {
            return Err(CloudError::Rejected(format!(
                "application gateway {} already exists in {}",
                spec.name, spec.resource_group
            )));
        }

        let public_ip = match self
            .group(&spec.resource_group)
            .and_then(|g| g.public_ips.get(&spec.public_ip_name))
        {
            Some(existing) => existing.clone(),
            None => self.allocate_public_ip(session, spec),
        };

        let now = Utc::now();
        let gateway = Gateway {
            id: session.network_resource_id(
                &spec.resource_group,
                "applicationGateways",
                &spec.name,
            ),
            sku: Sku::default(),
            provisioning_state: ProvisioningState::Updating,
            operational_state: OperationalState::Starting,
            public_ip,
            spec: spec.clone(),
            created_at: now,
            updated_at: now,
        };

        if let Some(group) = self.groups.get_mut(&spec.resource_group) {
            group.gateways.insert(spec.name.clone(), gateway);
        }

        Ok(self.begin_operation(latency, failure))
    }

    /// Settle a finished create operation on the gateway
    pub(crate) fn finish_create(&mut self, resource_group: &str, name: &str, ok: bool) -> Result<Gateway> {
        let gateway = self.gateway_mut(resource_group, name)?;
        if ok {
            gateway.provisioning_state = ProvisioningState::Succeeded;
            gateway.operational_state = OperationalState::Running;
        } else {
            gateway.provisioning_state = ProvisioningState::Failed;
            gateway.operational_state = OperationalState::Stopped;
        }
        gateway.updated_at = Utc::now();
        Ok(gateway.clone())
    }

    /// Commit a new desired state on a gateway
    pub(crate) fn commit_update(
        &mut self,
        resource_group: &str,
        name: &str,
        spec: GatewaySpec,
    ) -> Result<Gateway> {
        let gateway = self.gateway_mut(resource_group, name)?;
        gateway.spec = spec;
        gateway.provisioning_state = ProvisioningState::Succeeded;
        gateway.updated_at = Utc::now();
        Ok(gateway.clone())
    }

    pub(crate) fn begin_operation(&mut self, latency: Duration, failure: Option<String>) -> String {
        let id = format!("op-{}", self.next_id());
        self.operations.insert(
            id.clone(),
            Operation {
                completes_at: Instant::now() + latency,
                failure,
            },
        );
        id
    }

    pub(crate) fn operation_status(&mut self, id: &str) -> Result<OperationStatus> {
        let op = self
            .operations
            .get(id)
            .ok_or_else(|| CloudError::Rejected(format!("unknown operation {}", id)))?;

        if Instant::now() < op.completes_at {
            return Ok(OperationStatus::InProgress);
        }

        let status = match &op.failure {
            Some(reason) => OperationStatus::Failed {
                reason: reason.clone(),
            },
            None => OperationStatus::Succeeded,
        };
        self.operations.remove(id);
        Ok(status)
    }

    /// Forget an operation the caller stopped waiting on
    pub(crate) fn abandon_operation(&mut self, id: &str) {
        if self.operations.remove(id).is_some() {
            tracing::debug!("Abandoned operation {}", id);
        }
    }

    pub(crate) fn pending_operations(&self) -> usize {
        self.operations.len()
    }

    /// Remove a resource group, returning what it contained
    pub(crate) fn delete_group(&mut self, name: &str) -> Result<Vec<GatewaySnapshot>> {
        let group = self
            .groups
            .remove(name)
            .ok_or_else(|| CloudError::ResourceGroupNotFound(name.to_string()))?;
        tracing::debug!(
            "Deleted resource group {} ({}; {} gateways, {} public IPs)",
            name,
            group.region,
            group.gateways.len(),
            group.public_ips.len()
        );
        Ok(group.gateways.values().map(GatewaySnapshot::from).collect())
    }

    pub(crate) fn snapshot_group(&self, name: &str) -> Vec<GatewaySnapshot> {
        self.groups
            .get(name)
            .map(|g| g.gateways.values().map(GatewaySnapshot::from).collect())
            .unwrap_or_default()
    }
}
