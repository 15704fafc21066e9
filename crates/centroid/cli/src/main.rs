//! centroid-bench - randomized verification of the nearest-centroid block
//!
//! - `run` renders random testbenches and drives Vivado/xsim over them
//! - `select` evaluates the reference model for a single input

use std::path::{Path, PathBuf};

use anyhow::Context;
use centroid_testbench::BenchConfig;
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod output;

use commands::{run, select};

/// Default configuration file, relative to the project root
const CONFIG_FILE: &str = "centroid-bench.toml";

/// centroid-bench CLI application
#[derive(Parser)]
#[command(name = "centroid-bench")]
#[command(about = "Run behavioural, post-synthesis functional or post-synthesis timing simulations on a testbench template populated with random values", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path [default: <root>/centroid-bench.toml]
    #[arg(long, env = "CENTROID_BENCH_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Project root holding vhd/, lib/ and log/
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Simulate the design against random testbenches
    Run(run::RunArgs),

    /// Compute the expected result for one input
    Select(select::SelectArgs),

    /// Show the effective configuration
    Config,
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time().with_writer(std::io::stderr))
        .init();

    if let Err(err) = execute(cli) {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn execute(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Run(args) => {
            let config = load_config(cli.config.as_deref(), &cli.root)?;
            run::execute(args, config, &cli.root)
        }
        Commands::Select(args) => select::execute(args),
        Commands::Config => {
            let config = load_config(cli.config.as_deref(), &cli.root)?;
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

fn load_config(explicit: Option<&Path>, root: &Path) -> anyhow::Result<BenchConfig> {
    let path = explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.join(CONFIG_FILE));
    debug!(path = %path.display(), "loading configuration");
    BenchConfig::load(Some(&path))
        .with_context(|| format!("failed to load configuration from {}", path.display()))
}
