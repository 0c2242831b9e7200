//! Change sets applied to an existing gateway

use crate::error::{CloudError, Result};
use crate::model::{BackendPool, GatewaySpec, RoutingRule};
use serde::{Deserialize, Serialize};

/// A single mutation of a gateway's desired state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Change {
    /// Remove a routing rule by name
    RemoveRule { name: String },
    /// Add a routing rule; its name must not collide with a remaining rule
    AddRule { rule: RoutingRule },
    /// Add a backend pool
    AddBackendPool { pool: BackendPool },
}

/// Kind of a change, for summaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Add,
    Remove,
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeKind::Add => write!(f, "add"),
            ChangeKind::Remove => write!(f, "remove"),
        }
    }
}

impl Change {
    pub fn kind(&self) -> ChangeKind {
        match self {
            Change::RemoveRule { .. } => ChangeKind::Remove,
            Change::AddRule { .. } | Change::AddBackendPool { .. } => ChangeKind::Add,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Change::RemoveRule { name } => format!("remove routing rule {}", name),
            Change::AddRule { rule } => format!(
                "add routing rule {} ({}:{} -> {}:{})",
                rule.name,
                rule.listener.protocol,
                rule.listener.port,
                rule.backend_pool,
                rule.backend_port
            ),
            Change::AddBackendPool { pool } => format!(
                "add backend pool {} ({} addresses)",
                pool.name,
                pool.addresses.len()
            ),
        }
    }
}

/// Ordered list of changes that is applied all-or-nothing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub changes: Vec<Change>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without_rule(mut self, name: impl Into<String>) -> Self {
        self.changes.push(Change::RemoveRule { name: name.into() });
        self
    }

    pub fn with_rule(mut self, rule: RoutingRule) -> Self {
        self.changes.push(Change::AddRule { rule });
        self
    }

    pub fn with_backend_pool(mut self, pool: BackendPool) -> Self {
        self.changes.push(Change::AddBackendPool { pool });
        self
    }

    /// Produce the resulting desired state without touching `current`.
    ///
    /// Any failing change, or a result that violates a gateway invariant,
    /// discards the whole set.
    pub fn apply_to(&self, current: &GatewaySpec) -> Result<GatewaySpec> {
        let mut next = current.clone();

        for change in &self.changes {
            tracing::debug!("{}: {}", current.name, change.describe());
            match change {
                Change::RemoveRule { name } => {
                    let before = next.rules.len();
                    next.rules.retain(|r| &r.name != name);
                    if next.rules.len() == before {
                        return Err(CloudError::RuleNotFound(name.clone()));
                    }
                }
                Change::AddRule { rule } => {
                    if next.rule(&rule.name).is_some() {
                        return Err(CloudError::RuleNameConflict(rule.name.clone()));
                    }
                    next.rules.push(rule.clone());
                }
                Change::AddBackendPool { pool } => {
                    if next.backend_pool(&pool.name).is_some() {
                        return Err(CloudError::InvalidConfig(format!(
                            "duplicate backend pool: {}",
                            pool.name
                        )));
                    }
                    next.backend_pools.push(pool.clone());
                }
            }
        }

        next.validate()?;
        Ok(next)
    }

    pub fn summary(&self) -> ChangeSummary {
        ChangeSummary {
            add: self
                .changes
                .iter()
                .filter(|c| c.kind() == ChangeKind::Add)
                .count(),
            remove: self
                .changes
                .iter()
                .filter(|c| c.kind() == ChangeKind::Remove)
                .count(),
        }
    }
}

/// Summary of a change set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeSummary {
    pub add: usize,
    pub remove: usize,
}

impl std::fmt::Display for ChangeSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to add, {} to remove", self.add, self.remove)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Region, TlsCertificate};

    fn base() -> GatewaySpec {
        GatewaySpec {
            name: "gw".into(),
            region: Region::UsEast,
            resource_group: "rg".into(),
            public_ip_name: "pip".into(),
            backend_pools: vec![BackendPool::new(
                "pool-1",
                vec!["11.1.1.1".parse().unwrap()],
            )],
            rules: vec![RoutingRule::http("HTTP-80-to-8080", 80, "pool-1", 8080)],
        }
    }

    fn https_rule(name: &str) -> RoutingRule {
        RoutingRule::https(
            name,
            1443,
            TlsCertificate::new("cert", vec![0x30, 0x00], "Abc123"),
            "pool-1",
            8080,
        )
        .with_host_name("www.contoso.com")
        .with_cookie_affinity()
    }

    #[test]
    fn test_replace_rule() {
        let set = ChangeSet::new()
            .without_rule("HTTP-80-to-8080")
            .with_rule(https_rule("HTTPs-1443-to-8080"));

        let next = set.apply_to(&base()).unwrap();
        assert!(next.rule("HTTP-80-to-8080").is_none());
        let rule = next.rule("HTTPs-1443-to-8080").unwrap();
        assert!(rule.cookie_affinity);
        assert_eq!(rule.listener.host_name.as_deref(), Some("www.contoso.com"));
    }

    #[test]
    fn test_add_without_remove_collides() {
        let set = ChangeSet::new().with_rule(RoutingRule::http("HTTP-80-to-8080", 81, "pool-1", 8080));
        assert!(matches!(
            set.apply_to(&base()),
            Err(CloudError::RuleNameConflict(_))
        ));
    }

    #[test]
    fn test_remove_unknown_rule() {
        let set = ChangeSet::new().without_rule("nope");
        assert!(matches!(set.apply_to(&base()), Err(CloudError::RuleNotFound(_))));
    }

    #[test]
    fn test_failure_leaves_original_untouched() {
        let original = base();
        let mut rule = https_rule("HTTPs-1443-to-8080");
        rule.backend_pool = "missing".into();
        let set = ChangeSet::new().without_rule("HTTP-80-to-8080").with_rule(rule);

        assert!(set.apply_to(&original).is_err());
        assert_eq!(original, base());
    }

    #[test]
    fn test_removing_last_rule_is_invalid() {
        let set = ChangeSet::new().without_rule("HTTP-80-to-8080");
        assert!(matches!(set.apply_to(&base()), Err(CloudError::InvalidConfig(_))));
    }

    #[test]
    fn test_summary() {
        let set = ChangeSet::new()
            .without_rule("a")
            .with_rule(https_rule("b"))
            .with_backend_pool(BackendPool::new("p2", vec!["10.0.0.1".parse().unwrap()]));
        assert_eq!(set.summary().to_string(), "2 to add, 1 to remove");
    }
}
