//! The gateway configurations provisioned by the demo
//!
//! Create:
//!   HTTP:80 on the public frontend -> backend pool (4 addresses) HTTP:8080,
//!   round-robin, no host name.
//!
//! Update (SSL offload):
//!   HTTPS:1443 with a PFX certificate, host name www.contoso.com,
//!   cookie-based affinity -> same backend pool HTTP:8080.

use gatewayflow_cloud::{BackendPool, ChangeSet, GatewaySpec, RoutingRule, TlsCertificate};
use gatewayflow_config::DemoConfig;

pub const HTTP_RULE: &str = "HTTP-80-to-8080";
pub const HTTPS_RULE: &str = "HTTPs-1443-to-8080";

const HTTP_FRONTEND_PORT: u16 = 80;
const HTTPS_FRONTEND_PORT: u16 = 1443;
const BACKEND_PORT: u16 = 8080;

pub fn initial_spec(config: &DemoConfig) -> GatewaySpec {
    GatewaySpec {
        name: config.gateway_name.clone(),
        region: config.region,
        resource_group: config.resource_group.clone(),
        public_ip_name: config.public_ip_name.clone(),
        backend_pools: vec![BackendPool::new(
            config.backend_pool_name.clone(),
            config.backend_addresses.clone(),
        )],
        rules: vec![RoutingRule::http(
            HTTP_RULE,
            HTTP_FRONTEND_PORT,
            config.backend_pool_name.clone(),
            BACKEND_PORT,
        )],
    }
}

/// Replace the HTTP rule with its TLS-terminating counterpart
pub fn ssl_offload_changes(config: &DemoConfig, certificate: TlsCertificate) -> ChangeSet {
    ChangeSet::new().without_rule(HTTP_RULE).with_rule(
        RoutingRule::https(
            HTTPS_RULE,
            HTTPS_FRONTEND_PORT,
            certificate,
            config.backend_pool_name.clone(),
            BACKEND_PORT,
        )
        .with_host_name(config.host_name.clone())
        .with_cookie_affinity(),
    )
}
