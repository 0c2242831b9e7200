//! Desired-state model for application gateways
//!
//! A gateway is described by an immutable [`GatewaySpec`] value that is
//! handed to the management client on create, and rewritten through a
//! [`ChangeSet`](crate::change::ChangeSet) on update. The client answers
//! with a resolved [`Gateway`] that carries the identifiers and runtime
//! state allocated by the control plane.

use crate::error::{CloudError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::IpAddr;
use std::path::Path;

/// Azure-style region names
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    #[default]
    #[serde(rename = "eastus")]
    UsEast,
    #[serde(rename = "westus")]
    UsWest,
    #[serde(rename = "westeurope")]
    EuropeWest,
    #[serde(rename = "japaneast")]
    JapanEast,
}

impl Region {
    pub fn name(&self) -> &'static str {
        match self {
            Region::UsEast => "eastus",
            Region::UsWest => "westus",
            Region::EuropeWest => "westeurope",
            Region::JapanEast => "japaneast",
        }
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Region {
    type Err = CloudError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace([' ', '-', '_'], "").as_str() {
            "eastus" | "useast" => Ok(Region::UsEast),
            "westus" | "uswest" => Ok(Region::UsWest),
            "westeurope" | "europewest" => Ok(Region::EuropeWest),
            "japaneast" => Ok(Region::JapanEast),
            _ => Err(CloudError::InvalidConfig(format!("unknown region: {}", s))),
        }
    }
}

/// Listener / backend protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    Http,
    Https,
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Protocol::Http => write!(f, "HTTP"),
            Protocol::Https => write!(f, "HTTPS"),
        }
    }
}

/// Which frontend IP configuration a listener binds to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frontend {
    Public,
    Private,
}

impl std::fmt::Display for Frontend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Frontend::Public => write!(f, "public"),
            Frontend::Private => write!(f, "private"),
        }
    }
}

mod pfx_base64 {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

/// DER tag that opens every PKCS#12 archive (ASN.1 SEQUENCE)
const DER_SEQUENCE_TAG: u8 = 0x30;

/// TLS certificate used for SSL offload on a listener
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsCertificate {
    /// Certificate name inside the gateway
    pub name: String,

    /// Raw PFX (PKCS#12) archive
    #[serde(with = "pfx_base64")]
    pub pfx: Vec<u8>,

    /// Archive passphrase
    pub password: String,
}

impl TlsCertificate {
    pub fn new(name: impl Into<String>, pfx: Vec<u8>, password: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pfx,
            password: password.into(),
        }
    }

    /// Load a PFX archive from disk. The certificate is named after the file stem.
    pub async fn from_pfx_file(path: impl AsRef<Path>, password: impl Into<String>) -> Result<Self> {
        let path = path.as_ref();
        let pfx = tokio::fs::read(path).await.map_err(|e| {
            CloudError::InvalidCertificate(format!("cannot read {}: {}", path.display(), e))
        })?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().trim_start_matches('.').to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "sslcert".to_string());

        let cert = Self::new(name, pfx, password);
        cert.validate()?;
        tracing::debug!("Loaded PFX certificate {} ({} bytes)", cert.name, cert.pfx.len());
        Ok(cert)
    }

    /// Structural check only; the archive contents are opaque here.
    pub fn validate(&self) -> Result<()> {
        if self.pfx.is_empty() {
            return Err(CloudError::InvalidCertificate(format!(
                "{}: archive is empty",
                self.name
            )));
        }
        if self.pfx[0] != DER_SEQUENCE_TAG {
            return Err(CloudError::InvalidCertificate(format!(
                "{}: not a DER-encoded PKCS#12 archive",
                self.name
            )));
        }
        if self.password.is_empty() {
            return Err(CloudError::InvalidCertificate(format!(
                "{}: passphrase is required",
                self.name
            )));
        }
        Ok(())
    }
}

impl std::fmt::Debug for TlsCertificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsCertificate")
            .field("name", &self.name)
            .field("pfx_len", &self.pfx.len())
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Frontend side of a routing rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listener {
    pub frontend: Frontend,
    pub port: u16,
    pub protocol: Protocol,

    /// Host name match for multi-site listeners
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_name: Option<String>,

    /// Present iff `protocol` is HTTPS
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<TlsCertificate>,
}

/// Named set of backend addresses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendPool {
    pub name: String,
    pub addresses: Vec<IpAddr>,
}

impl BackendPool {
    pub fn new(name: impl Into<String>, addresses: Vec<IpAddr>) -> Self {
        Self {
            name: name.into(),
            addresses,
        }
    }
}

/// Named binding from a frontend listener to a backend pool and port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingRule {
    pub name: String,
    pub listener: Listener,
    pub backend_pool: String,
    pub backend_port: u16,

    #[serde(default)]
    pub cookie_affinity: bool,
}

impl RoutingRule {
    /// Plain HTTP rule from the public frontend
    pub fn http(
        name: impl Into<String>,
        frontend_port: u16,
        backend_pool: impl Into<String>,
        backend_port: u16,
    ) -> Self {
        Self {
            name: name.into(),
            listener: Listener {
                frontend: Frontend::Public,
                port: frontend_port,
                protocol: Protocol::Http,
                host_name: None,
                certificate: None,
            },
            backend_pool: backend_pool.into(),
            backend_port,
            cookie_affinity: false,
        }
    }

    /// HTTPS rule terminating TLS on the public frontend
    pub fn https(
        name: impl Into<String>,
        frontend_port: u16,
        certificate: TlsCertificate,
        backend_pool: impl Into<String>,
        backend_port: u16,
    ) -> Self {
        let mut rule = Self::http(name, frontend_port, backend_pool, backend_port);
        rule.listener.protocol = Protocol::Https;
        rule.listener.certificate = Some(certificate);
        rule
    }

    pub fn with_host_name(mut self, host_name: impl Into<String>) -> Self {
        self.listener.host_name = Some(host_name.into());
        self
    }

    pub fn with_cookie_affinity(mut self) -> Self {
        self.cookie_affinity = true;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(CloudError::InvalidConfig("rule name is empty".into()));
        }
        if self.listener.port == 0 || self.backend_port == 0 {
            return Err(CloudError::InvalidConfig(format!(
                "{}: ports must be non-zero",
                self.name
            )));
        }
        match (self.listener.protocol, &self.listener.certificate) {
            (Protocol::Https, None) => Err(CloudError::InvalidConfig(format!(
                "{}: HTTPS listener requires a TLS certificate",
                self.name
            ))),
            (Protocol::Http, Some(_)) => Err(CloudError::InvalidConfig(format!(
                "{}: HTTP listener cannot carry a TLS certificate",
                self.name
            ))),
            (Protocol::Https, Some(cert)) => cert.validate(),
            (Protocol::Http, None) => Ok(()),
        }
    }
}

/// Desired state of an application gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewaySpec {
    pub name: String,
    pub region: Region,
    pub resource_group: String,

    /// Name of the public IP address allocated alongside the gateway
    pub public_ip_name: String,

    pub backend_pools: Vec<BackendPool>,
    pub rules: Vec<RoutingRule>,
}

impl GatewaySpec {
    pub fn rule(&self, name: &str) -> Option<&RoutingRule> {
        self.rules.iter().find(|r| r.name == name)
    }

    pub fn backend_pool(&self, name: &str) -> Option<&BackendPool> {
        self.backend_pools.iter().find(|p| p.name == name)
    }

    /// Check every structural invariant the control plane enforces
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(CloudError::InvalidConfig("gateway name is empty".into()));
        }
        if self.resource_group.trim().is_empty() {
            return Err(CloudError::InvalidConfig("resource group name is empty".into()));
        }
        if self.rules.is_empty() {
            return Err(CloudError::InvalidConfig(format!(
                "{}: at least one routing rule is required",
                self.name
            )));
        }

        let mut pool_names = HashSet::new();
        for pool in &self.backend_pools {
            if !pool_names.insert(pool.name.as_str()) {
                return Err(CloudError::InvalidConfig(format!(
                    "duplicate backend pool: {}",
                    pool.name
                )));
            }
            if pool.addresses.is_empty() {
                return Err(CloudError::InvalidConfig(format!(
                    "backend pool {} has no addresses",
                    pool.name
                )));
            }
        }

        let mut rule_names = HashSet::new();
        let mut port_protocols = std::collections::HashMap::new();
        for rule in &self.rules {
            rule.validate()?;
            if !rule_names.insert(rule.name.as_str()) {
                return Err(CloudError::RuleNameConflict(rule.name.clone()));
            }
            if !pool_names.contains(rule.backend_pool.as_str()) {
                return Err(CloudError::BackendPoolNotFound(format!(
                    "{} (referenced by rule {})",
                    rule.backend_pool, rule.name
                )));
            }
            let protocol = rule.listener.protocol;
            if let Some(existing) = port_protocols.insert(rule.listener.port, protocol) {
                if existing != protocol {
                    return Err(CloudError::InvalidConfig(format!(
                        "frontend port {} is used with both {} and {}",
                        rule.listener.port, existing, protocol
                    )));
                }
            }
        }

        Ok(())
    }
}

/// SKU of a provisioned gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sku {
    pub name: String,
    pub tier: String,
    pub capacity: u32,
}

impl Default for Sku {
    fn default() -> Self {
        Self {
            name: "Standard_Small".to_string(),
            tier: "Standard".to_string(),
            capacity: 1,
        }
    }
}

/// Control-plane provisioning state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProvisioningState {
    Updating,
    Succeeded,
    Failed,
}

impl std::fmt::Display for ProvisioningState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProvisioningState::Updating => write!(f, "Updating"),
            ProvisioningState::Succeeded => write!(f, "Succeeded"),
            ProvisioningState::Failed => write!(f, "Failed"),
        }
    }
}

/// Data-plane operational state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationalState {
    Starting,
    Running,
    Stopping,
    Stopped,
}

impl std::fmt::Display for OperationalState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationalState::Starting => write!(f, "Starting"),
            OperationalState::Running => write!(f, "Running"),
            OperationalState::Stopping => write!(f, "Stopping"),
            OperationalState::Stopped => write!(f, "Stopped"),
        }
    }
}

/// Public IP address allocated for the public frontend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicIp {
    pub id: String,
    pub name: String,
    pub address: IpAddr,
}

/// A provisioned gateway as reported by the control plane
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gateway {
    pub id: String,
    pub sku: Sku,
    pub provisioning_state: ProvisioningState,
    pub operational_state: OperationalState,
    pub public_ip: PublicIp,

    /// Resolved desired state
    pub spec: GatewaySpec,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Gateway {
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn resource_group(&self) -> &str {
        &self.spec.resource_group
    }

    pub fn region(&self) -> Region {
        self.spec.region
    }

    pub fn rules(&self) -> &[RoutingRule] {
        &self.spec.rules
    }

    pub fn rule(&self, name: &str) -> Option<&RoutingRule> {
        self.spec.rule(name)
    }

    /// Number of rules carrying `name`
    pub fn count_rules_named(&self, name: &str) -> usize {
        self.spec.rules.iter().filter(|r| r.name == name).count()
    }
}
