use clap::Parser;
use docker_net_graph::docker_client::{DEFAULT_DOCKER_HOST, DockerClient, DockerClientConfig};
use docker_net_graph::render::{Graphviz, Layout};
use docker_net_graph::{Options, generate};
use log::info;
use std::path::PathBuf;

/// Generate docker network graph.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Write output to file
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Docker daemon address
    #[arg(short = 'H', long, env = "DOCKER_HOST", default_value = DEFAULT_DOCKER_HOST)]
    host: String,

    /// Timeout for daemon requests, in seconds
    #[arg(long, default_value_t = 120)]
    timeout: u64,

    /// Graphviz layout program used with --out
    #[arg(long, value_enum, default_value_t = Layout::Sfdp)]
    layout: Layout,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    info!("Connecting to {}", cli.host);
    let client = DockerClient::new(DockerClientConfig {
        host: cli.host,
        timeout_seconds: cli.timeout,
    })?;

    let options = Options {
        verbose: cli.verbose,
        output: cli.out,
    };

    let mut renderer = Graphviz::new(cli.layout);
    let mut stdout = std::io::stdout().lock();
    generate(&client, &mut renderer, &mut stdout, &options).await?;

    Ok(())
}
