//! Provisioning demo driver
//!
//! Runs authenticate → create → update → cleanup strictly in sequence.
//! Failures in create or update are logged and reported, and cleanup runs
//! exactly once on every path. Cleanup deletes the whole resource group and
//! never propagates its own errors.

use crate::error::{DemoError, Phase, Result};
use crate::print::Console;
use crate::progress::OperationProgress;
use crate::scenario;
use gatewayflow_cloud::{
    CloudError, Credentials, Gateway, ManagementClient, Session, TlsCertificate,
};
use gatewayflow_config::DemoConfig;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Where credentials come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Path held by an environment variable
    Env(String),
    /// Explicit file path
    File(PathBuf),
}

/// Result of a single step
#[derive(Debug)]
pub enum StepOutcome {
    Succeeded { elapsed: Duration },
    Failed(DemoError),
    Skipped,
}

impl StepOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, StepOutcome::Succeeded { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, StepOutcome::Skipped)
    }

    pub fn error(&self) -> Option<&DemoError> {
        match self {
            StepOutcome::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Result of the cleanup step
#[derive(Debug)]
pub enum CleanupOutcome {
    /// The resource group and everything in it is gone
    Deleted { resource_group: String },
    /// Nothing was provisioned, so there was nothing to delete
    NothingToClean,
    /// Deletion was attempted and failed
    Failed(DemoError),
}

/// What happened during one run
#[derive(Debug)]
pub struct RunReport {
    pub resource_group: String,
    pub subscription_id: Option<String>,
    pub authentication: StepOutcome,
    pub create: StepOutcome,
    pub update: StepOutcome,
    pub cleanup: CleanupOutcome,

    /// Last known state of the gateway, if it was ever created
    pub gateway: Option<Gateway>,
}

impl RunReport {
    fn new(resource_group: &str) -> Self {
        Self {
            resource_group: resource_group.to_string(),
            subscription_id: None,
            authentication: StepOutcome::Skipped,
            create: StepOutcome::Skipped,
            update: StepOutcome::Skipped,
            cleanup: CleanupOutcome::NothingToClean,
            gateway: None,
        }
    }

    /// Every step succeeded and the resource group was deleted
    pub fn is_success(&self) -> bool {
        self.authentication.is_success()
            && self.create.is_success()
            && self.update.is_success()
            && matches!(self.cleanup, CleanupOutcome::Deleted { .. })
    }
}

pub struct DemoDriver<'a, C: ManagementClient + ?Sized> {
    client: &'a C,
    config: DemoConfig,
    console: Console,
}

impl<'a, C: ManagementClient + ?Sized> DemoDriver<'a, C> {
    pub fn new(client: &'a C, config: DemoConfig) -> Self {
        Self {
            client,
            config,
            console: Console::quiet(),
        }
    }

    pub fn with_console(mut self, console: Console) -> Self {
        self.console = console;
        self
    }

    /// Run the whole demo. Never fails; inspect the report instead.
    pub async fn run(&self, source: &CredentialSource) -> RunReport {
        let mut report = RunReport::new(&self.config.resource_group);
        let started = Instant::now();

        let session = match self.authenticate(source).await {
            Ok(session) => {
                report.authentication = StepOutcome::Succeeded {
                    elapsed: started.elapsed(),
                };
                report.subscription_id = Some(session.subscription_id.clone());
                Some(session)
            }
            Err(e) => {
                self.log_failure(&e);
                report.authentication = StepOutcome::Failed(e);
                None
            }
        };

        // Set once a create request has been submitted: from then on the
        // resource group may exist on the control plane.
        let mut provisioned = false;

        if let Some(session) = &session {
            provisioned = true;
            let started = Instant::now();
            match self.create_gateway(session).await {
                Ok(gateway) => {
                    report.create = StepOutcome::Succeeded {
                        elapsed: started.elapsed(),
                    };

                    let started = Instant::now();
                    match self.update_gateway(session, &gateway).await {
                        Ok(updated) => {
                            report.update = StepOutcome::Succeeded {
                                elapsed: started.elapsed(),
                            };
                            report.gateway = Some(updated);
                        }
                        Err(e) => {
                            self.log_failure(&e);
                            report.update = StepOutcome::Failed(e);
                            report.gateway = Some(gateway);
                        }
                    }
                }
                Err(e) => {
                    self.log_failure(&e);
                    report.create = StepOutcome::Failed(e);
                }
            }
        }

        report.cleanup = self.cleanup(session.as_ref(), provisioned).await;
        report
    }

    /// Resolve credentials and open a session
    pub async fn authenticate(&self, source: &CredentialSource) -> Result<Session> {
        let credentials = match source {
            CredentialSource::Env(var) => Credentials::from_env(var).await,
            CredentialSource::File(path) => Credentials::from_file(path).await,
        }
        .map_err(DemoError::Authentication)?;

        let session = self
            .client
            .authenticate(&credentials)
            .await
            .map_err(DemoError::Authentication)?;

        tracing::info!("Authenticated against {}", self.client.name());
        self.console
            .info(&format!("Selected subscription: {}", session.subscription_id));
        Ok(session)
    }

    /// Create the gateway with the plain HTTP rule and a new public IP
    pub async fn create_gateway(&self, session: &Session) -> Result<Gateway> {
        let spec = scenario::initial_spec(&self.config);

        self.console.banner("CREATE");
        self.console
            .info("Creating an application gateway... (this can take about 20 min)");
        tracing::info!(
            "Creating application gateway {} in {}",
            spec.name,
            spec.resource_group
        );

        let started = Instant::now();
        let progress = OperationProgress::start(self.console.is_enabled(), "Provisioning...");
        let result = self.client.create_gateway(session, &spec).await;
        progress.finish();

        let gateway = result.map_err(|e| DemoError::provisioning(Phase::Create, e))?;
        self.console.success(&format!(
            "Application gateway created: (took {} seconds)",
            started.elapsed().as_secs()
        ));
        self.console.gateway(&gateway);
        Ok(gateway)
    }

    /// Swap the HTTP rule for an HTTPS rule with SSL offload, host name and affinity
    pub async fn update_gateway(&self, session: &Session, gateway: &Gateway) -> Result<Gateway> {
        self.console.banner("UPDATE");
        self.console.info("Updating the application gateway");

        let started = Instant::now();
        let certificate = TlsCertificate::from_pfx_file(
            &self.config.certificate_path,
            self.config.certificate_password.clone(),
        )
        .await
        .map_err(|e| DemoError::provisioning(Phase::Update, e))?;

        let changes = scenario::ssl_offload_changes(&self.config, certificate);
        tracing::info!("Updating {}: {}", gateway.name(), changes.summary());

        let progress = OperationProgress::start(self.console.is_enabled(), "Applying changes...");
        let result = self.client.update_gateway(session, gateway, &changes).await;
        progress.finish();

        let updated = result.map_err(|e| DemoError::provisioning(Phase::Update, e))?;
        self.console.success(&format!(
            "Application gateway updated: (took {} seconds)",
            started.elapsed().as_secs()
        ));
        self.console.gateway(&updated);
        Ok(updated)
    }

    /// Delete the run's resource group, if anything was provisioned into it
    pub async fn cleanup(&self, session: Option<&Session>, provisioned: bool) -> CleanupOutcome {
        let resource_group = &self.config.resource_group;

        let session = match session {
            Some(session) if provisioned => session,
            _ => {
                tracing::info!("Nothing was provisioned; skipping cleanup");
                self.console
                    .info("Did not create any resources. No clean up is necessary");
                return CleanupOutcome::NothingToClean;
            }
        };

        self.console
            .info(&format!("Deleting Resource Group: {}", resource_group));
        match self.client.delete_resource_group(session, resource_group).await {
            Ok(()) => {
                tracing::info!("Deleted resource group {}", resource_group);
                self.console
                    .success(&format!("Deleted Resource Group: {}", resource_group));
                CleanupOutcome::Deleted {
                    resource_group: resource_group.clone(),
                }
            }
            Err(CloudError::ResourceGroupNotFound(_)) => {
                tracing::info!("Resource group {} was never created", resource_group);
                self.console
                    .info("Did not create any resources. No clean up is necessary");
                CleanupOutcome::NothingToClean
            }
            Err(source) => {
                let e = DemoError::Cleanup {
                    resource_group: resource_group.clone(),
                    source,
                };
                self.log_failure(&e);
                CleanupOutcome::Failed(e)
            }
        }
    }

    fn log_failure(&self, e: &DemoError) {
        tracing::error!("{}", e.chain());
        tracing::debug!("{:?}", e);
        self.console.error(&e.chain());
    }
}
