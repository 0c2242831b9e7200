//! Human-readable output on stdout

use crate::driver::{CleanupOutcome, RunReport, StepOutcome};
use colored::Colorize;
use gatewayflow_cloud::{Gateway, Protocol};
use std::fmt::Write;

/// Progress printer; disabled consoles swallow everything
#[derive(Debug, Clone, Copy)]
pub struct Console {
    enabled: bool,
}

impl Console {
    pub fn stdout() -> Self {
        Self { enabled: true }
    }

    pub fn quiet() -> Self {
        Self { enabled: false }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn banner(&self, title: &str) {
        if self.enabled {
            println!("{}", format!("================= {} ======================", title).bold());
        }
    }

    pub fn info(&self, message: &str) {
        if self.enabled {
            println!("{}", message);
        }
    }

    pub fn success(&self, message: &str) {
        if self.enabled {
            println!("{}", format!("✓ {}", message).green());
        }
    }

    pub fn error(&self, message: &str) {
        if self.enabled {
            println!("{}", format!("✗ {}", message).red());
        }
    }

    pub fn gateway(&self, gateway: &Gateway) {
        if self.enabled {
            print!("{}", render_gateway(gateway));
        }
    }

    pub fn report(&self, report: &RunReport) {
        if self.enabled {
            println!();
            println!("{}", "Summary".bold());
            print!("{}", render_report(report));
        }
    }
}

/// Multi-line dump of a gateway's resolved configuration
pub fn render_gateway(gateway: &Gateway) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = write_gateway(&mut out, gateway);
    out
}

fn write_gateway(out: &mut String, gw: &Gateway) -> std::fmt::Result {
    writeln!(out, "Application gateway: {}", gw.id)?;
    writeln!(out, "\tName: {}", gw.name())?;
    writeln!(out, "\tResource group: {}", gw.resource_group())?;
    writeln!(out, "\tRegion: {}", gw.region())?;
    writeln!(
        out,
        "\tSKU: {} (tier {}, capacity {})",
        gw.sku.name, gw.sku.tier, gw.sku.capacity
    )?;
    writeln!(out, "\tOperational state: {}", gw.operational_state)?;
    writeln!(out, "\tProvisioning state: {}", gw.provisioning_state)?;
    writeln!(
        out,
        "\tPublic IP: {} ({})",
        gw.public_ip.name, gw.public_ip.address
    )?;

    let mut ports: Vec<(u16, Protocol)> = gw
        .rules()
        .iter()
        .map(|r| (r.listener.port, r.listener.protocol))
        .collect();
    ports.sort();
    ports.dedup();
    writeln!(out, "\tFrontend ports: {}", ports.len())?;
    for (port, protocol) in &ports {
        writeln!(out, "\t\t{} ({})", port, protocol)?;
    }

    writeln!(out, "\tBackend pools: {}", gw.spec.backend_pools.len())?;
    for pool in &gw.spec.backend_pools {
        let addresses: Vec<String> = pool.addresses.iter().map(|a| a.to_string()).collect();
        writeln!(out, "\t\t{}: {}", pool.name, addresses.join(", "))?;
    }

    writeln!(out, "\tBackend HTTP settings: {}", gw.rules().len())?;
    for rule in gw.rules() {
        writeln!(
            out,
            "\t\t{}-settings: HTTP:{}, cookie affinity {}",
            rule.name,
            rule.backend_port,
            if rule.cookie_affinity { "enabled" } else { "disabled" }
        )?;
    }

    let certs: Vec<&str> = gw
        .rules()
        .iter()
        .filter_map(|r| r.listener.certificate.as_ref())
        .map(|c| c.name.as_str())
        .collect();
    writeln!(out, "\tTLS certificates: {}", certs.len())?;
    for name in &certs {
        writeln!(out, "\t\t{}", name)?;
    }

    writeln!(out, "\tListeners: {}", gw.rules().len())?;
    for rule in gw.rules() {
        let l = &rule.listener;
        write!(
            out,
            "\t\t{}-listener: {} {}:{}",
            rule.name, l.frontend, l.protocol, l.port
        )?;
        if let Some(host) = &l.host_name {
            write!(out, ", host {}", host)?;
        }
        if let Some(cert) = &l.certificate {
            write!(out, ", certificate {}", cert.name)?;
        }
        writeln!(out)?;
    }

    writeln!(out, "\tRequest routing rules: {}", gw.rules().len())?;
    for rule in gw.rules() {
        writeln!(
            out,
            "\t\t{}: {}-listener -> {}:{}",
            rule.name, rule.name, rule.backend_pool, rule.backend_port
        )?;
    }

    Ok(())
}

fn step_line(name: &str, outcome: &StepOutcome) -> String {
    match outcome {
        StepOutcome::Succeeded { elapsed } => {
            format!("  {:<15} succeeded ({} s)", name, elapsed.as_secs())
        }
        StepOutcome::Failed(e) => format!("  {:<15} failed: {}", name, e.chain()),
        StepOutcome::Skipped => format!("  {:<15} skipped", name),
    }
}

pub fn render_report(report: &RunReport) -> String {
    let mut lines = vec![
        step_line("authenticate", &report.authentication),
        step_line("create", &report.create),
        step_line("update", &report.update),
    ];
    lines.push(match &report.cleanup {
        CleanupOutcome::Deleted { resource_group } => {
            format!("  {:<15} deleted resource group {}", "cleanup", resource_group)
        }
        CleanupOutcome::NothingToClean => format!("  {:<15} nothing to clean up", "cleanup"),
        CleanupOutcome::Failed(e) => format!("  {:<15} failed: {}", "cleanup", e.chain()),
    });
    let mut out = lines.join("\n");
    out.push('\n');
    out
}
