use std::net::Ipv4Addr;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use recursor::{QueryType, ResolveError, Resolver, ResolverConfig, UdpTransport};

#[derive(Parser)]
#[command(name = "recursor")]
#[command(version)]
#[command(about = "Resolve a name iteratively, starting at the root servers")]
struct Cli {
    /// Name to resolve
    name: String,

    /// Record type (A, NS, CNAME, MX, AAAA or TYPEnnn)
    #[arg(short = 't', long = "type", default_value = "A")]
    qtype: QueryType,

    /// Root hint address, may be repeated (defaults to the IANA root servers)
    #[arg(short = 'r', long = "root", value_name = "ADDR")]
    roots: Vec<Ipv4Addr>,

    /// Name server port
    #[arg(short = 'p', long, default_value_t = 53)]
    port: u16,

    /// Timeout per exchange, in milliseconds
    #[arg(long, default_value_t = 2000)]
    timeout_ms: u64,

    /// Extra attempts per server after a timeout
    #[arg(long, default_value_t = 2)]
    retries: usize,

    /// Maximum number of referrals to follow
    #[arg(long, default_value_t = 20)]
    max_referrals: usize,

    /// Log level (trace, debug, info, warn, error), overrides RUST_LOG
    #[arg(long)]
    log_level: Option<String>,
}

fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    let mut config = ResolverConfig {
        port: cli.port,
        timeout: Duration::from_millis(cli.timeout_ms),
        retries: cli.retries,
        max_referrals: cli.max_referrals,
        ..ResolverConfig::default()
    };
    if !cli.roots.is_empty() {
        config = config.with_root_hints(cli.roots);
    }

    let resolver = Resolver::new(UdpTransport::new(), config);

    match resolver.resolve(&cli.name, cli.qtype).await {
        Ok(answer) => {
            if answer.is_nodata() {
                println!("NODATA");
            }
            for record in &answer.records {
                println!("{}", record);
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(ResolveError::NameNotFound(name)) => {
            println!("NXDOMAIN {}", name);
            Ok(ExitCode::from(3))
        }
        Err(e) => Err(anyhow::anyhow!(e).context(format!("resolving {} {}", cli.name, cli.qtype))),
    }
}
