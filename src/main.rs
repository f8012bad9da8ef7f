/// Version injected at compile time via OCIPROV_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("OCIPROV_VERSION") {
    Some(v) => v,
    None => "dev",
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use ociprov::adapter::FilterPredicate;
use ociprov::config::Config;
use ociprov::oci::client::{format_oci_error, OciClient};
use ociprov::resource::sweeper::{sweep_all, SweepOptions};
use ociprov::resource::{instances, network, shapes, Registry};
use ociprov::schema::AttributeMap;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Schema-driven resource adapter for OCI
#[derive(Parser, Debug)]
#[command(name = "ociprov", version = VERSION, about, long_about = None)]
struct Args {
    /// OCI config profile to use
    #[arg(short, long)]
    profile: Option<String>,

    /// OCI region to use
    #[arg(short, long)]
    region: Option<String>,

    /// Compartment OCID to operate in
    #[arg(short, long)]
    compartment: Option<String>,

    /// Override all service endpoints (mock/testing)
    #[arg(long)]
    endpoint: Option<String>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List resources of a type and print the projected attribute maps
    List {
        /// Resource key, e.g. core_shapes or core_instances
        resource: String,
        /// Keep only entries matching key=value[,value...]; repeatable
        #[arg(long = "filter")]
        filters: Vec<String>,
        /// Print at most this many entries
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Fetch and project a single resource by OCID
    Get {
        /// Resource key, e.g. core_instances
        resource: String,
        /// Resource OCID
        id: String,
    },
    /// Delete leftover test resources in dependency order
    Sweep {
        /// Display-name prefix marking sweepable resources
        #[arg(long, default_value = "ociprov-test-")]
        prefix: String,
        /// Only sweep resources older than this many hours
        #[arg(long, default_value_t = 4)]
        age_hours: i64,
        /// Report without deleting
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return None;
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .expect("Failed to open log file");

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("ociprov started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("ociprov").join("ociprov.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".ociprov").join("ociprov.log");
    }
    PathBuf::from("ociprov.log")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level);

    let config = Config::load();
    let profile = config.effective_profile(args.profile.as_deref());
    let region = config.effective_region(args.region.as_deref());

    let mut client = OciClient::from_profile(&profile, region.as_deref()).await?;
    if let Some(endpoint) = &args.endpoint {
        client = client.with_endpoint_override(endpoint)?;
    }

    let registry = Registry::core();
    registry.validate()?;

    if let Err(err) = run_command(&args, &client, &registry, &config).await {
        tracing::error!("{:#}", err);
        eprintln!("Error: {}", format_oci_error(&err));
        std::process::exit(1);
    }
    Ok(())
}

fn required_compartment(args: &Args, config: &Config) -> Result<String> {
    config
        .effective_compartment(args.compartment.as_deref())
        .context(
            "No compartment configured. Pass --compartment or set OCI_CLI_COMPARTMENT",
        )
}

fn parse_filters(specs: &[String]) -> Result<Vec<FilterPredicate>> {
    specs
        .iter()
        .map(|spec| FilterPredicate::parse(spec).map_err(Into::into))
        .collect()
}

fn print_maps(maps: &[AttributeMap]) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(maps)?);
    Ok(())
}

async fn run_command(
    args: &Args,
    client: &OciClient,
    registry: &Registry,
    config: &Config,
) -> Result<()> {
    match &args.command {
        Command::List {
            resource,
            filters,
            limit,
        } => {
            if registry.get(resource).is_none() {
                anyhow::bail!(
                    "Unknown resource: {}. Available: {}",
                    resource,
                    registry.keys().join(", ")
                );
            }
            let compartment = required_compartment(args, config)?;
            let filters = parse_filters(filters)?;

            let mut maps = match resource.as_str() {
                "core_shapes" => shapes::read_shapes(client, &compartment, &filters).await?,
                "core_instances" => {
                    instances::read_instances(client, &compartment, &filters).await?
                }
                "core_vcns" => network::read_vcns(client, &compartment, &filters).await?,
                "core_subnets" => network::read_subnets(client, &compartment, &filters).await?,
                other => anyhow::bail!("Resource {} is registered but has no reader", other),
            };

            if let Some(limit) = limit {
                maps.truncate(*limit);
            }
            print_maps(&maps)
        }

        Command::Get { resource, id } => {
            let map = match resource.as_str() {
                "core_instances" => instances::read_instance(client, id).await?,
                "core_vcns" => network::read_vcn(client, id).await?,
                "core_subnets" => network::read_subnet(client, id).await?,
                "core_shapes" => {
                    anyhow::bail!("Shapes have no get endpoint; use list with --filter name=...")
                }
                other => anyhow::bail!("Unknown resource: {}", other),
            };
            println!("{}", serde_json::to_string_pretty(&map)?);
            Ok(())
        }

        Command::Sweep {
            prefix,
            age_hours,
            dry_run,
        } => {
            let compartment = required_compartment(args, config)?;
            let opts = SweepOptions {
                prefix: prefix.clone(),
                min_age: chrono::Duration::hours(*age_hours),
                dry_run: *dry_run,
                ..SweepOptions::default()
            };

            let reports = sweep_all(client, registry, &compartment, &opts).await?;

            let mut failed = 0;
            for report in &reports {
                println!(
                    "{}: matched {}, deleted {}{}",
                    report.resource,
                    report.matched,
                    report.deleted,
                    if report.failures.is_empty() {
                        String::new()
                    } else {
                        format!(", {} failed", report.failures.len())
                    }
                );
                for failure in &report.failures {
                    println!("  {}", failure);
                }
                failed += report.failures.len();
            }

            if failed > 0 {
                anyhow::bail!("{} resource(s) could not be swept", failed);
            }
            Ok(())
        }
    }
}
