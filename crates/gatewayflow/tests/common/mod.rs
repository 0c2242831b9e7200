use gatewayflow_config::DemoConfig;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Minimal DER-looking PFX payload
pub const PFX_BYTES: &[u8] = &[0x30, 0x82, 0x01, 0x0a, 0x02, 0x01, 0x03];

pub struct TestWorkspace {
    pub root: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        Self { root }
    }

    pub fn path(&self) -> PathBuf {
        self.root.path().to_path_buf()
    }

    pub fn write_credentials(&self) -> PathBuf {
        let path = self.root.path().join("my.azureauth");
        let creds = serde_json::json!({
            "clientId": "demo-client",
            "clientSecret": "demo-secret",
            "tenantId": "demo-tenant",
            "subscriptionId": "00000000-1111-2222-3333-444444444444"
        });
        fs::write(&path, creds.to_string()).unwrap();
        path
    }

    pub fn write_certificate(&self) -> PathBuf {
        let path = self.root.path().join("myTest._pfx");
        fs::write(&path, PFX_BYTES).unwrap();
        path
    }

    #[allow(dead_code)]
    pub fn write_file(&self, name: &str, content: &[u8]) -> PathBuf {
        let path = self.root.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    /// Seeded config whose certificate lives in this workspace
    #[allow(dead_code)]
    pub fn config(&self) -> DemoConfig {
        let mut config = DemoConfig::generate(Some(2024));
        config.certificate_path = self.write_certificate();
        config
    }
}
