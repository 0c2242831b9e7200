use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use gatewayflow::print::Console;
use gatewayflow::{CredentialSource, DemoDriver};
use gatewayflow_cloud::{PollConfig, Region};
use gatewayflow_cloud_sim::{Faults, SimulatedCloud};
use gatewayflow_config::DemoConfig;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "gateway-demo")]
#[command(
    about = "Create an application gateway, reconfigure it for SSL offload, and clean up",
    long_about = None
)]
struct Cli {
    /// Debug logging on stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the demo: authenticate, create, update, clean up
    Run(RunArgs),
    /// Print the resolved configuration as YAML
    Config {
        /// Seed for the random resource names
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Show version information
    Version,
}

#[derive(Args)]
struct RunArgs {
    /// Credentials file (default: the path in AZURE_AUTH_LOCATION)
    #[arg(long)]
    auth_file: Option<PathBuf>,

    /// Seed for the random resource names
    #[arg(long)]
    seed: Option<u64>,

    /// Region to provision into (e.g. eastus, westeurope)
    #[arg(long)]
    region: Option<Region>,

    /// Resource group name (default: random rgNEAGS… name)
    #[arg(long)]
    resource_group: Option<String>,

    /// PFX certificate used for SSL offload
    #[arg(long)]
    certificate: Option<PathBuf>,

    /// Passphrase of the PFX certificate
    #[arg(long, env = "GATEWAYFLOW_CERT_PASSWORD", hide_env_values = true)]
    certificate_password: Option<String>,

    /// Simulated duration of each long-running operation, in milliseconds
    #[arg(long, default_value = "1500")]
    latency_ms: u64,

    /// Inject a control-plane failure (repeatable)
    #[arg(long = "fault", value_enum)]
    faults: Vec<FaultKind>,

    /// Print only the final summary
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FaultKind {
    /// Reject the credentials
    Auth,
    /// Fail gateway creation
    Create,
    /// Fail the gateway update
    Update,
    /// Fail resource group deletion
    Delete,
}

fn build_faults(kinds: &[FaultKind]) -> Faults {
    let mut faults = Faults::default();
    for kind in kinds {
        match kind {
            FaultKind::Auth => faults.reject_credentials = true,
            FaultKind::Create => {
                faults.fail_create = Some("InternalServerError: injected create failure".into())
            }
            FaultKind::Update => {
                faults.fail_update = Some("InternalServerError: injected update failure".into())
            }
            FaultKind::Delete => {
                faults.fail_delete = Some("ScopeLocked: injected delete failure".into())
            }
        }
    }
    faults
}

fn apply_overrides(config: &mut DemoConfig, args: &RunArgs) {
    if let Some(region) = args.region {
        config.region = region;
    }
    if let Some(resource_group) = &args.resource_group {
        config.resource_group = resource_group.clone();
    }
    if let Some(certificate) = &args.certificate {
        config.certificate_path = certificate.clone();
    }
    if let Some(password) = &args.certificate_password {
        config.certificate_password = password.clone();
    }
}

async fn run(args: RunArgs) -> anyhow::Result<()> {
    let mut config = gatewayflow_config::load(args.seed)?;
    apply_overrides(&mut config, &args);

    let source = match &args.auth_file {
        Some(path) => CredentialSource::File(path.clone()),
        None => CredentialSource::Env(config.auth_location_env.clone()),
    };

    let cloud = SimulatedCloud::new()
        .with_latency(Duration::from_millis(args.latency_ms))
        .with_poll_config(PollConfig {
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
            ..PollConfig::default()
        })
        .with_faults(build_faults(&args.faults));

    let console = if args.quiet {
        Console::quiet()
    } else {
        Console::stdout()
    };

    let report = DemoDriver::new(&cloud, config)
        .with_console(console)
        .run(&source)
        .await;

    Console::stdout().report(&report);
    if report.is_success() {
        println!("{}", "Demo completed".green().bold());
    } else {
        println!("{}", "Demo finished with errors".yellow().bold());
    }

    // Failures are reported above; the process itself completes normally.
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run(args) => run(args).await?,
        Commands::Config { seed } => {
            let config = gatewayflow_config::load(seed)?;
            print!("{}", config.to_yaml()?);
        }
        Commands::Version => {
            println!("gatewayflow {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
