//! Simulated management client implementation

use crate::control_plane::{AuditEvent, ControlPlane, GatewaySnapshot};
use async_trait::async_trait;
use gatewayflow_cloud::{
    ChangeSet, CloudError, Credentials, Gateway, GatewaySpec, ManagementClient, PollConfig,
    Result, Session, poll_until_done,
};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Faults injected into the simulated control plane
#[derive(Debug, Clone, Default)]
pub struct Faults {
    /// Reject every authentication attempt
    pub reject_credentials: bool,

    /// Fail the create operation with this reason
    pub fail_create: Option<String>,

    /// Fail the update operation with this reason
    pub fail_update: Option<String>,

    /// Fail resource group deletion with this reason
    pub fail_delete: Option<String>,
}

/// In-process control plane that behaves like a slow, eventually consistent cloud
#[derive(Clone)]
pub struct SimulatedCloud {
    plane: Arc<Mutex<ControlPlane>>,
    latency: Duration,
    poll: PollConfig,
    faults: Faults,
}

impl Default for SimulatedCloud {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedCloud {
    pub fn new() -> Self {
        Self {
            plane: Arc::new(Mutex::new(ControlPlane::default())),
            latency: Duration::ZERO,
            poll: PollConfig::immediate(),
            faults: Faults::default(),
        }
    }

    /// Time each long-running operation takes to settle
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    pub fn with_faults(mut self, faults: Faults) -> Self {
        self.faults = faults;
        self
    }

    fn plane(&self) -> MutexGuard<'_, ControlPlane> {
        self.plane.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Every call recorded so far, in order
    pub fn audit_log(&self) -> Vec<AuditEvent> {
        self.plane().audit().to_vec()
    }

    pub fn resource_group_exists(&self, name: &str) -> bool {
        self.plane().group(name).is_some()
    }

    /// Gateways currently inside a resource group
    pub fn gateways_in(&self, resource_group: &str) -> Vec<GatewaySnapshot> {
        self.plane().snapshot_group(resource_group)
    }

    async fn wait_for(&self, operation: &str, id: &str) -> Result<u32> {
        let result = poll_until_done(operation, &self.poll, || {
            let status = self.plane().operation_status(id);
            async move { status }
        })
        .await;
        if let Err(CloudError::Timeout(_)) = &result {
            self.plane().abandon_operation(id);
        }
        result
    }
}

#[async_trait]
impl ManagementClient for SimulatedCloud {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn authenticate(&self, credentials: &Credentials) -> Result<Session> {
        let mut plane = self.plane();
        if self.faults.reject_credentials {
            plane.record(AuditEvent::Authenticate {
                client_id: credentials.client_id.clone(),
                accepted: false,
            });
            return Err(CloudError::AuthenticationFailed(format!(
                "AADSTS7000215: invalid client secret provided for {}",
                credentials.client_id
            )));
        }

        let token = plane.issue_token(&credentials.client_id);
        plane.record(AuditEvent::Authenticate {
            client_id: credentials.client_id.clone(),
            accepted: true,
        });
        tracing::debug!(
            "Authenticated {} for subscription {}",
            credentials.client_id,
            credentials.subscription_id
        );
        Ok(Session::new(
            credentials.subscription_id.clone(),
            credentials.tenant_id.clone(),
            token,
        ))
    }

    async fn create_gateway(&self, session: &Session, spec: &GatewaySpec) -> Result<Gateway> {
        let started = {
            let mut plane = self.plane();
            plane.check_session(session)?;
            let started = spec.validate().and_then(|()| {
                plane.begin_create(session, spec, self.latency, self.faults.fail_create.clone())
            });
            if started.is_err() {
                plane.record(AuditEvent::CreateGateway {
                    resource_group: spec.resource_group.clone(),
                    gateway: spec.name.clone(),
                    succeeded: false,
                });
            }
            started?
        };

        tracing::debug!("Create of {} accepted as {}", spec.name, started);
        let outcome = self.wait_for("create application gateway", &started).await;

        let mut plane = self.plane();
        let gateway = plane.finish_create(&spec.resource_group, &spec.name, outcome.is_ok());
        plane.record(AuditEvent::CreateGateway {
            resource_group: spec.resource_group.clone(),
            gateway: spec.name.clone(),
            succeeded: outcome.is_ok() && gateway.is_ok(),
        });
        outcome?;
        gateway
    }

    async fn update_gateway(
        &self,
        session: &Session,
        gateway: &Gateway,
        changes: &ChangeSet,
    ) -> Result<Gateway> {
        let resource_group = gateway.resource_group().to_string();
        let name = gateway.name().to_string();

        let prepared = {
            let mut plane = self.plane();
            plane.check_session(session)?;
            let prepared = plane
                .gateway(&resource_group, &name)
                .and_then(|current| changes.apply_to(&current.spec))
                .map(|next| {
                    let op = plane.begin_operation(self.latency, self.faults.fail_update.clone());
                    (op, next)
                });
            if prepared.is_err() {
                plane.record(AuditEvent::UpdateGateway {
                    resource_group: resource_group.clone(),
                    gateway: name.clone(),
                    succeeded: false,
                });
            }
            prepared?
        };

        let (op, next) = prepared;
        tracing::debug!("Update of {} accepted as {} ({})", name, op, changes.summary());
        let outcome = self.wait_for("update application gateway", &op).await;

        let mut plane = self.plane();
        let updated = match outcome {
            Ok(_) => plane.commit_update(&resource_group, &name, next),
            Err(e) => Err(e),
        };
        plane.record(AuditEvent::UpdateGateway {
            resource_group,
            gateway: name,
            succeeded: updated.is_ok(),
        });
        updated
    }

    async fn get_gateway(
        &self,
        session: &Session,
        resource_group: &str,
        name: &str,
    ) -> Result<Gateway> {
        let plane = self.plane();
        plane.check_session(session)?;
        plane.gateway(resource_group, name).cloned()
    }

    async fn delete_resource_group(&self, session: &Session, name: &str) -> Result<()> {
        let mut plane = self.plane();
        plane.check_session(session)?;

        let gateways = plane.snapshot_group(name);
        let result = match &self.faults.fail_delete {
            Some(reason) => Err(CloudError::Rejected(reason.clone())),
            None => plane.delete_group(name).map(|_| ()),
        };
        plane.record(AuditEvent::DeleteResourceGroup {
            name: name.to_string(),
            gateways,
            succeeded: result.is_ok(),
        });
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatewayflow_cloud::{BackendPool, Region, RoutingRule, TlsCertificate};

    fn credentials() -> Credentials {
        Credentials {
            client_id: "client".into(),
            client_secret: "secret".into(),
            tenant_id: "tenant".into(),
            subscription_id: "sub-1".into(),
            management_endpoint_url: None,
        }
    }

    fn spec() -> GatewaySpec {
        GatewaySpec {
            name: "myFirstAppGateway".into(),
            region: Region::UsEast,
            resource_group: "rgNEAGS123".into(),
            public_ip_name: "pip-1".into(),
            backend_pools: vec![BackendPool::new(
                "backend-pool-1",
                vec!["11.1.1.1".parse().unwrap(), "11.1.1.2".parse().unwrap()],
            )],
            rules: vec![RoutingRule::http("HTTP-80-to-8080", 80, "backend-pool-1", 8080)],
        }
    }

    fn https_change() -> ChangeSet {
        ChangeSet::new().without_rule("HTTP-80-to-8080").with_rule(
            RoutingRule::https(
                "HTTPs-1443-to-8080",
                1443,
                TlsCertificate::new("myTest", vec![0x30, 0x01], "Abc123"),
                "backend-pool-1",
                8080,
            )
            .with_host_name("www.contoso.com")
            .with_cookie_affinity(),
        )
    }

    #[tokio::test]
    async fn test_full_lifecycle() {
        let cloud = SimulatedCloud::new().with_latency(Duration::from_millis(5));
        let session = cloud.authenticate(&credentials()).await.unwrap();
        assert_eq!(session.subscription_id, "sub-1");

        let created = cloud.create_gateway(&session, &spec()).await.unwrap();
        assert_eq!(created.count_rules_named("HTTP-80-to-8080"), 1);
        assert!(created.id.ends_with("/applicationGateways/myFirstAppGateway"));

        let updated = cloud
            .update_gateway(&session, &created, &https_change())
            .await
            .unwrap();
        assert_eq!(updated.count_rules_named("HTTP-80-to-8080"), 0);
        assert_eq!(updated.count_rules_named("HTTPs-1443-to-8080"), 1);

        cloud.delete_resource_group(&session, "rgNEAGS123").await.unwrap();
        assert!(!cloud.resource_group_exists("rgNEAGS123"));
        assert_eq!(cloud.audit_log().len(), 4);
    }

    #[tokio::test]
    async fn test_poll_timeout_drops_pending_operation() {
        let cloud = SimulatedCloud::new()
            .with_latency(Duration::from_secs(60))
            .with_poll_config(PollConfig {
                max_attempts: Some(2),
                ..PollConfig::immediate()
            });
        let session = cloud.authenticate(&credentials()).await.unwrap();

        let err = cloud.create_gateway(&session, &spec()).await.unwrap_err();
        assert!(matches!(err, CloudError::Timeout(_)));
        assert_eq!(cloud.plane().pending_operations(), 0);
        assert!(matches!(
            cloud.audit_log().last(),
            Some(AuditEvent::CreateGateway { succeeded: false, .. })
        ));
    }

    #[tokio::test]
    async fn test_rejected_credentials() {
        let cloud = SimulatedCloud::new().with_faults(Faults {
            reject_credentials: true,
            ..Faults::default()
        });
        let err = cloud.authenticate(&credentials()).await.unwrap_err();
        assert!(matches!(err, CloudError::AuthenticationFailed(_)));
        assert_eq!(
            cloud.audit_log(),
            vec![AuditEvent::Authenticate {
                client_id: "client".into(),
                accepted: false
            }]
        );
    }

    #[tokio::test]
    async fn test_failed_create_leaves_group_behind() {
        let cloud = SimulatedCloud::new().with_faults(Faults {
            fail_create: Some("quota exceeded".into()),
            ..Faults::default()
        });
        let session = cloud.authenticate(&credentials()).await.unwrap();
        let err = cloud.create_gateway(&session, &spec()).await.unwrap_err();
        assert!(matches!(err, CloudError::OperationFailed { .. }));
        assert!(cloud.resource_group_exists("rgNEAGS123"));
    }

    #[tokio::test]
    async fn test_invalid_spec_rejected_before_provisioning() {
        let cloud = SimulatedCloud::new();
        let session = cloud.authenticate(&credentials()).await.unwrap();
        let mut bad = spec();
        bad.rules[0].backend_pool = "missing".into();
        let err = cloud.create_gateway(&session, &bad).await.unwrap_err();
        assert!(matches!(err, CloudError::BackendPoolNotFound(_)));
        assert!(!cloud.resource_group_exists("rgNEAGS123"));
    }

    #[tokio::test]
    async fn test_failed_update_keeps_original_rules() {
        let cloud = SimulatedCloud::new().with_faults(Faults {
            fail_update: Some("internal error".into()),
            ..Faults::default()
        });
        let session = cloud.authenticate(&credentials()).await.unwrap();
        let created = cloud.create_gateway(&session, &spec()).await.unwrap();

        assert!(cloud
            .update_gateway(&session, &created, &https_change())
            .await
            .is_err());

        let current = cloud
            .get_gateway(&session, "rgNEAGS123", "myFirstAppGateway")
            .await
            .unwrap();
        assert_eq!(current.count_rules_named("HTTP-80-to-8080"), 1);
    }

    #[tokio::test]
    async fn test_malformed_certificate_rejected() {
        let cloud = SimulatedCloud::new();
        let session = cloud.authenticate(&credentials()).await.unwrap();
        let created = cloud.create_gateway(&session, &spec()).await.unwrap();

        let changes = ChangeSet::new().without_rule("HTTP-80-to-8080").with_rule(RoutingRule::https(
            "HTTPs-1443-to-8080",
            1443,
            TlsCertificate::new("bad", b"garbage".to_vec(), "Abc123"),
            "backend-pool-1",
            8080,
        ));
        let err = cloud.update_gateway(&session, &created, &changes).await.unwrap_err();
        assert!(matches!(err, CloudError::InvalidCertificate(_)));
        assert_eq!(
            cloud.gateways_in("rgNEAGS123")[0].rules,
            vec!["HTTP-80-to-8080".to_string()]
        );
    }

    #[tokio::test]
    async fn test_delete_failure_is_recorded() {
        let cloud = SimulatedCloud::new().with_faults(Faults {
            fail_delete: Some("locked".into()),
            ..Faults::default()
        });
        let session = cloud.authenticate(&credentials()).await.unwrap();
        cloud.create_gateway(&session, &spec()).await.unwrap();

        assert!(cloud.delete_resource_group(&session, "rgNEAGS123").await.is_err());
        assert!(cloud.resource_group_exists("rgNEAGS123"));
        assert!(matches!(
            cloud.audit_log().last(),
            Some(AuditEvent::DeleteResourceGroup { succeeded: false, .. })
        ));
    }

    #[tokio::test]
    async fn test_forged_session_rejected() {
        let cloud = SimulatedCloud::new();
        let session = Session::new("sub-1", "tenant", "forged");
        assert!(matches!(
            cloud.create_gateway(&session, &spec()).await,
            Err(CloudError::AuthenticationFailed(_))
        ));
    }
}
