pub mod error;
pub mod names;

pub use error::*;
pub use names::ResourceNamer;

use gatewayflow_cloud::{AUTH_LOCATION_ENV, Region};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};

/// Environment variable pointing directly at a config file
pub const CONFIG_PATH_ENV: &str = "GATEWAYFLOW_CONFIG";

const RESOURCE_GROUP_PREFIX: &str = "rgNEAGS";
const RESOURCE_GROUP_MAX_LEN: usize = 15;
const PUBLIC_IP_PREFIX: &str = "pip-";
const PUBLIC_IP_MAX_LEN: usize = 18;

/// Everything a demo run needs, resolved once at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemoConfig {
    pub region: Region,
    pub gateway_name: String,
    pub resource_group: String,
    pub public_ip_name: String,
    pub backend_pool_name: String,
    pub backend_addresses: Vec<IpAddr>,

    /// PFX file used for SSL offload in the update step
    pub certificate_path: PathBuf,
    pub certificate_password: String,
    pub host_name: String,

    /// Environment variable holding the credential file path
    pub auth_location_env: String,

    /// Seed used for the random names, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

/// Partial configuration read from YAML; unset fields fall back to defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub region: Option<Region>,
    pub gateway_name: Option<String>,
    pub resource_group: Option<String>,
    pub public_ip_name: Option<String>,
    pub backend_pool_name: Option<String>,
    pub backend_addresses: Option<Vec<IpAddr>>,
    pub certificate_path: Option<PathBuf>,
    pub certificate_password: Option<String>,
    pub host_name: Option<String>,
    pub auth_location_env: Option<String>,
    pub seed: Option<u64>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }
}

fn default_backend_addresses() -> Vec<IpAddr> {
    (1..=4)
        .map(|last| IpAddr::V4(Ipv4Addr::new(11, 1, 1, last)))
        .collect()
}

impl DemoConfig {
    /// Defaults with freshly generated resource names
    pub fn generate(seed: Option<u64>) -> Self {
        Self::resolve(ConfigFile::default(), seed)
    }

    /// Merge a config file over the defaults. An explicit `seed` wins over the file's.
    pub fn resolve(file: ConfigFile, seed: Option<u64>) -> Self {
        let seed = seed.or(file.seed);
        let mut namer = ResourceNamer::new(seed);
        // Draw both names unconditionally; overriding one must not shift the other.
        let random_group = namer.random_name(RESOURCE_GROUP_PREFIX, RESOURCE_GROUP_MAX_LEN);
        let random_pip = namer.random_name(PUBLIC_IP_PREFIX, PUBLIC_IP_MAX_LEN);

        Self {
            region: file.region.unwrap_or_default(),
            gateway_name: file
                .gateway_name
                .unwrap_or_else(|| "myFirstAppGateway".to_string()),
            resource_group: file.resource_group.unwrap_or(random_group),
            public_ip_name: file.public_ip_name.unwrap_or(random_pip),
            backend_pool_name: file
                .backend_pool_name
                .unwrap_or_else(|| "backend-pool-1".to_string()),
            backend_addresses: file
                .backend_addresses
                .unwrap_or_else(default_backend_addresses),
            certificate_path: file
                .certificate_path
                .unwrap_or_else(|| PathBuf::from("myTest._pfx")),
            certificate_password: file
                .certificate_password
                .unwrap_or_else(|| "Abc123".to_string()),
            host_name: file
                .host_name
                .unwrap_or_else(|| "www.contoso.com".to_string()),
            auth_location_env: file
                .auth_location_env
                .unwrap_or_else(|| AUTH_LOCATION_ENV.to_string()),
            seed,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.backend_addresses.is_empty() {
            return Err(ConfigError::Invalid(
                "backend_addresses must not be empty".into(),
            ));
        }
        for (field, value) in [
            ("gateway_name", &self.gateway_name),
            ("resource_group", &self.resource_group),
            ("public_ip_name", &self.public_ip_name),
            ("backend_pool_name", &self.backend_pool_name),
            ("auth_location_env", &self.auth_location_env),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{} must not be empty", field)));
            }
        }
        Ok(())
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Locate the GatewayFlow config file
///
/// Search order:
/// 1. `GATEWAYFLOW_CONFIG` environment variable (must exist if set)
/// 2. Current directory: gatewayflow.local.yaml, gatewayflow.yaml, .gatewayflow.yaml
/// 3. ~/.config/gatewayflow/config.yaml
///
/// Returns `None` when nothing is found; the defaults are then used.
pub fn find_config_file() -> Result<Option<PathBuf>> {
    if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(&config_path);
        if path.exists() {
            return Ok(Some(path));
        }
        return Err(ConfigError::ConfigFileNotFound {
            env: CONFIG_PATH_ENV,
            path: config_path,
        });
    }

    let current_dir = std::env::current_dir()?;
    let candidates = [
        "gatewayflow.local.yaml",
        "gatewayflow.yaml",
        ".gatewayflow.yaml",
    ];
    for filename in &candidates {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(Some(path));
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        let global_config = config_dir.join("gatewayflow").join("config.yaml");
        if global_config.exists() {
            return Ok(Some(global_config));
        }
    }

    Ok(None)
}

/// Discover and resolve the run configuration
pub fn load(seed: Option<u64>) -> Result<DemoConfig> {
    let file = match find_config_file()? {
        Some(path) => {
            tracing::debug!("Loading config from {}", path.display());
            ConfigFile::load(&path)?
        }
        None => {
            tracing::debug!("No config file found, using defaults");
            ConfigFile::default()
        }
    };

    let config = DemoConfig::resolve(file, seed);
    config.validate()?;
    Ok(config)
}
