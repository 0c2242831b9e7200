//! Service principal credentials
//!
//! The credential file is either the JSON produced by
//! `az ad sp create-for-rbac --sdk-auth`, or the older `key=value`
//! properties format (`client`, `key`, `tenant`, `subscription`).

use crate::error::{CloudError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable that points at the credential file
pub const AUTH_LOCATION_ENV: &str = "AZURE_AUTH_LOCATION";

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub tenant_id: String,
    pub subscription_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub management_endpoint_url: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("tenant_id", &self.tenant_id)
            .field("subscription_id", &self.subscription_id)
            .finish()
    }
}

impl Credentials {
    /// Resolve the credential file path from `env_var` and load it
    pub async fn from_env(env_var: &str) -> Result<Self> {
        let path = std::env::var_os(env_var).ok_or_else(|| {
            CloudError::AuthenticationFailed(format!(
                "environment variable {} is not set",
                env_var
            ))
        })?;
        if path.is_empty() {
            return Err(CloudError::AuthenticationFailed(format!(
                "environment variable {} is empty",
                env_var
            )));
        }
        Self::from_file(PathBuf::from(path)).await
    }

    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            CloudError::AuthenticationFailed(format!(
                "cannot read credentials file {}: {}",
                path.display(),
                e
            ))
        })?;
        tracing::debug!("Loading credentials from {}", path.display());
        Self::parse(&content, path)
    }

    fn parse(content: &str, path: &Path) -> Result<Self> {
        let invalid = |reason: String| CloudError::InvalidCredentials {
            path: path.display().to_string(),
            reason,
        };

        let content = content.trim_start_matches('\u{feff}');
        let creds = if content.trim_start().starts_with('{') {
            serde_json::from_str::<Credentials>(content).map_err(|e| invalid(e.to_string()))?
        } else {
            Self::parse_properties(content).map_err(invalid)?
        };

        creds.check_complete().map_err(invalid)?;
        Ok(creds)
    }

    fn parse_properties(content: &str) -> std::result::Result<Self, String> {
        let mut creds = Credentials {
            client_id: String::new(),
            client_secret: String::new(),
            tenant_id: String::new(),
            subscription_id: String::new(),
            management_endpoint_url: None,
        };

        for (n, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            // Lines may hold secrets; report the position only.
            let (key, value) = line
                .split_once('=')
                .ok_or_else(|| format!("line {}: expected key=value", n + 1))?;
            let value = value.trim().replace("\\:", ":");
            match key.trim() {
                "client" => creds.client_id = value,
                "key" => creds.client_secret = value,
                "tenant" => creds.tenant_id = value,
                "subscription" => creds.subscription_id = value,
                "managementURI" => creds.management_endpoint_url = Some(value),
                other => tracing::debug!("Ignoring credentials property {}", other),
            }
        }

        Ok(creds)
    }

    fn check_complete(&self) -> std::result::Result<(), String> {
        let fields = [
            ("clientId", &self.client_id),
            ("clientSecret", &self.client_secret),
            ("tenantId", &self.tenant_id),
            ("subscriptionId", &self.subscription_id),
        ];
        let missing: Vec<&str> = fields
            .iter()
            .filter(|(_, v)| v.trim().is_empty())
            .map(|(k, _)| *k)
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(format!("missing {}", missing.join(", ")))
        }
    }
}
