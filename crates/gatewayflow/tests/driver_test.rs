mod common;

use common::TestWorkspace;
use gatewayflow::scenario::{HTTP_RULE, HTTPS_RULE};
use gatewayflow::{CleanupOutcome, CredentialSource, DemoDriver, DemoError, Phase};
use gatewayflow_cloud::{CloudError, ManagementClient};
use gatewayflow_cloud_sim::{AuditEvent, Faults, GatewaySnapshot, SimulatedCloud};

fn deletes(log: &[AuditEvent]) -> Vec<(usize, &Vec<GatewaySnapshot>)> {
    log.iter()
        .enumerate()
        .filter_map(|(i, e)| match e {
            AuditEvent::DeleteResourceGroup { gateways, .. } => Some((i, gateways)),
            _ => None,
        })
        .collect()
}

fn updates(log: &[AuditEvent]) -> Vec<usize> {
    log.iter()
        .enumerate()
        .filter(|(_, e)| matches!(e, AuditEvent::UpdateGateway { .. }))
        .map(|(i, _)| i)
        .collect()
}

/// 正常系: HTTP ルールが HTTPS ルールに置き換わり、最後にリソースグループが削除される
#[tokio::test]
async fn test_happy_path_replaces_rule_and_cleans_up() {
    let ws = TestWorkspace::new();
    let cloud = SimulatedCloud::new();
    let config = ws.config();
    let group = config.resource_group.clone();

    let report = DemoDriver::new(&cloud, config)
        .run(&CredentialSource::File(ws.write_credentials()))
        .await;

    assert!(report.is_success(), "{report:?}");
    assert_eq!(
        report.subscription_id.as_deref(),
        Some("00000000-1111-2222-3333-444444444444")
    );

    let gateway = report.gateway.as_ref().unwrap();
    assert_eq!(gateway.count_rules_named(HTTP_RULE), 0);
    assert_eq!(gateway.count_rules_named(HTTPS_RULE), 1);
    let rule = gateway.rule(HTTPS_RULE).unwrap();
    assert_eq!(rule.listener.port, 1443);
    assert_eq!(rule.backend_port, 8080);
    assert_eq!(rule.listener.host_name.as_deref(), Some("www.contoso.com"));
    assert!(rule.cookie_affinity);
    assert_eq!(
        gateway.spec.backend_pool(&rule.backend_pool).unwrap().addresses.len(),
        4
    );

    let log = cloud.audit_log();
    let deletes = deletes(&log);
    assert_eq!(deletes.len(), 1);
    assert_eq!(deletes[0].0, log.len() - 1);
    assert!(updates(&log).iter().all(|&u| u < deletes[0].0));
    assert!(matches!(
        report.cleanup,
        CleanupOutcome::Deleted { ref resource_group } if *resource_group == group
    ));
    assert!(!cloud.resource_group_exists(&group));
}

#[tokio::test]
async fn test_create_failure_skips_update_and_still_cleans_up() {
    let ws = TestWorkspace::new();
    let cloud = SimulatedCloud::new().with_faults(Faults {
        fail_create: Some("quota exceeded".into()),
        ..Faults::default()
    });
    let config = ws.config();
    let group = config.resource_group.clone();

    let report = DemoDriver::new(&cloud, config)
        .run(&CredentialSource::File(ws.write_credentials()))
        .await;

    assert!(matches!(
        report.create.error(),
        Some(DemoError::Provisioning {
            phase: Phase::Create,
            ..
        })
    ));
    assert!(report.update.is_skipped());
    assert!(report.gateway.is_none());

    let log = cloud.audit_log();
    assert!(updates(&log).is_empty());
    assert_eq!(deletes(&log).len(), 1);
    assert!(matches!(report.cleanup, CleanupOutcome::Deleted { .. }));
    assert!(!cloud.resource_group_exists(&group));
}

#[tokio::test]
async fn test_update_failure_deletes_group_with_gateway_inside() {
    let ws = TestWorkspace::new();
    let cloud = SimulatedCloud::new().with_faults(Faults {
        fail_update: Some("internal error".into()),
        ..Faults::default()
    });
    let config = ws.config();
    let gateway_name = config.gateway_name.clone();

    let report = DemoDriver::new(&cloud, config)
        .run(&CredentialSource::File(ws.write_credentials()))
        .await;

    assert!(report.create.is_success());
    assert!(matches!(
        report.update.error(),
        Some(DemoError::Provisioning {
            phase: Phase::Update,
            ..
        })
    ));

    let log = cloud.audit_log();
    let deletes = deletes(&log);
    assert_eq!(deletes.len(), 1);
    assert_eq!(
        deletes[0].1,
        &vec![GatewaySnapshot {
            name: gateway_name,
            rules: vec![HTTP_RULE.to_string()],
        }]
    );
}

/// 認証失敗: 資格情報ファイルが無い場合は何も作成されず、クリーンアップは no-op
#[tokio::test]
async fn test_missing_credentials_file_creates_nothing() {
    let ws = TestWorkspace::new();
    let cloud = SimulatedCloud::new();
    let config = ws.config();
    let group = config.resource_group.clone();

    let report = DemoDriver::new(&cloud, config)
        .run(&CredentialSource::File(ws.path().join("missing.azureauth")))
        .await;

    assert!(matches!(
        report.authentication.error(),
        Some(DemoError::Authentication(CloudError::AuthenticationFailed(_)))
    ));
    assert!(report.create.is_skipped());
    assert!(report.update.is_skipped());
    assert!(matches!(report.cleanup, CleanupOutcome::NothingToClean));
    assert!(cloud.audit_log().is_empty());
    assert!(!cloud.resource_group_exists(&group));
}

#[tokio::test]
async fn test_rejected_credentials_creates_nothing() {
    let ws = TestWorkspace::new();
    let cloud = SimulatedCloud::new().with_faults(Faults {
        reject_credentials: true,
        ..Faults::default()
    });

    let report = DemoDriver::new(&cloud, ws.config())
        .run(&CredentialSource::File(ws.write_credentials()))
        .await;

    assert!(matches!(
        report.authentication.error(),
        Some(DemoError::Authentication(_))
    ));
    assert!(matches!(report.cleanup, CleanupOutcome::NothingToClean));
    assert_eq!(cloud.audit_log().len(), 1);
}

#[tokio::test]
async fn test_malformed_credentials_file() {
    let ws = TestWorkspace::new();
    let cloud = SimulatedCloud::new();
    let creds = ws.write_file("bad.azureauth", b"{\"clientId\": \"only\"}");

    let report = DemoDriver::new(&cloud, ws.config())
        .run(&CredentialSource::File(creds))
        .await;

    assert!(matches!(
        report.authentication.error(),
        Some(DemoError::Authentication(CloudError::InvalidCredentials { .. }))
    ));
    assert!(matches!(report.cleanup, CleanupOutcome::NothingToClean));
}

/// 証明書が読めない場合: update は ProvisioningError、元のゲートウェイは残ったまま削除される
#[tokio::test]
async fn test_unreadable_certificate_keeps_original_rule() {
    let ws = TestWorkspace::new();
    let cloud = SimulatedCloud::new();
    let mut config = ws.config();
    config.certificate_path = ws.path().join("does-not-exist._pfx");
    let group = config.resource_group.clone();

    let report = DemoDriver::new(&cloud, config)
        .run(&CredentialSource::File(ws.write_credentials()))
        .await;

    match report.update.error() {
        Some(DemoError::Provisioning {
            phase: Phase::Update,
            source: CloudError::InvalidCertificate(_),
        }) => {}
        other => panic!("unexpected update outcome: {other:?}"),
    }

    let gateway = report.gateway.as_ref().unwrap();
    assert_eq!(gateway.count_rules_named(HTTP_RULE), 1);
    assert_eq!(gateway.count_rules_named(HTTPS_RULE), 0);

    let log = cloud.audit_log();
    let deletes = deletes(&log);
    assert_eq!(deletes.len(), 1);
    assert_eq!(deletes[0].1[0].rules, vec![HTTP_RULE.to_string()]);
    assert!(!cloud.resource_group_exists(&group));
}

#[tokio::test]
async fn test_malformed_certificate_fails_update() {
    let ws = TestWorkspace::new();
    let cloud = SimulatedCloud::new();
    let mut config = ws.config();
    config.certificate_path = ws.write_file("garbage._pfx", b"-----BEGIN CERTIFICATE-----");

    let report = DemoDriver::new(&cloud, config)
        .run(&CredentialSource::File(ws.write_credentials()))
        .await;

    assert!(matches!(
        report.update.error(),
        Some(DemoError::Provisioning {
            phase: Phase::Update,
            source: CloudError::InvalidCertificate(_),
        })
    ));
    assert!(matches!(report.cleanup, CleanupOutcome::Deleted { .. }));
}

#[tokio::test]
async fn test_cleanup_failure_is_reported_not_raised() {
    let ws = TestWorkspace::new();
    let cloud = SimulatedCloud::new().with_faults(Faults {
        fail_delete: Some("ScopeLocked".into()),
        ..Faults::default()
    });
    let config = ws.config();
    let group = config.resource_group.clone();

    let report = DemoDriver::new(&cloud, config)
        .run(&CredentialSource::File(ws.write_credentials()))
        .await;

    assert!(report.update.is_success());
    assert!(!report.is_success());
    assert!(matches!(
        report.cleanup,
        CleanupOutcome::Failed(DemoError::Cleanup { ref resource_group, .. }) if *resource_group == group
    ));
    assert!(cloud.resource_group_exists(&group));
}

#[tokio::test]
async fn test_cleanup_of_absent_group_reports_nothing_to_clean() {
    let ws = TestWorkspace::new();
    let cloud = SimulatedCloud::new();
    let driver = DemoDriver::new(&cloud, ws.config());
    let session = driver
        .authenticate(&CredentialSource::File(ws.write_credentials()))
        .await
        .unwrap();

    let outcome = driver.cleanup(Some(&session), true).await;
    assert!(matches!(outcome, CleanupOutcome::NothingToClean));

    let outcome = driver.cleanup(Some(&session), false).await;
    assert!(matches!(outcome, CleanupOutcome::NothingToClean));
}

#[tokio::test]
async fn test_steps_can_be_driven_individually() {
    let ws = TestWorkspace::new();
    let cloud = SimulatedCloud::new();
    let driver = DemoDriver::new(&cloud, ws.config());
    let session = driver
        .authenticate(&CredentialSource::File(ws.write_credentials()))
        .await
        .unwrap();

    let created = driver.create_gateway(&session).await.unwrap();
    let updated = driver.update_gateway(&session, &created).await.unwrap();
    assert!(updated.rule(HTTPS_RULE).is_some());

    let fetched = cloud
        .get_gateway(&session, created.resource_group(), created.name())
        .await
        .unwrap();
    assert_eq!(fetched.spec, updated.spec);

    assert!(matches!(
        driver.cleanup(Some(&session), true).await,
        CleanupOutcome::Deleted { .. }
    ));
}
