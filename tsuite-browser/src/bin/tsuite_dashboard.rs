//! TSuite Dashboard Server
//!
//! Serves the result browser and its JSON API, and offers the offline
//! tooling around it: archive statistics, synthetic archives and disk error
//! collection for the heat grid.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use tsuite_browser::generate::{generate_archive, GenerateOptions};
use tsuite_browser::sense::{collect, parse_inventory};
use tsuite_browser::server;
use tsuite_browser::source::DataSource;
use tsuite_common::DashboardConfig;

#[derive(Parser)]
#[command(name = "tsuite-dashboard")]
#[command(about = "TSuite Test Suite Result Browser")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server bind address
    #[arg(short, long)]
    bind: Option<String>,

    /// Test set archive (file path or URL)
    #[arg(short, long)]
    archive: Option<String>,

    /// Sensor readings (file path or URL)
    #[arg(short, long)]
    sensors: Option<String>,

    /// Enable development mode (more verbose logging)
    #[arg(long)]
    dev: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the dashboard server
    Serve,
    /// Show archive statistics
    Stats,
    /// Write a synthetic test set archive
    Generate {
        /// Number of test sets
        #[arg(long, default_value = "100")]
        sets: usize,
        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
        /// Output file, stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Count disk errors from kernel logs into sensor readings
    Sense {
        /// Inventory listing the drives of every host
        #[arg(short, long)]
        inventory: PathBuf,
        /// Kernel log of a host, as host:file (repeatable)
        #[arg(short = 'f', long = "file-input", required = true)]
        file_inputs: Vec<String>,
        /// Output file, stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.dev { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&cli)?;

    match cli.command {
        Some(Commands::Serve) | None => server::serve(&config).await,
        Some(Commands::Stats) => show_stats(&config).await,
        Some(Commands::Generate { sets, seed, output }) => {
            generate(sets, seed, output.as_deref())
        }
        Some(Commands::Sense {
            inventory,
            file_inputs,
            output,
        }) => sense(&inventory, &file_inputs, output.as_deref()),
    }
}

/// File, then environment, then command line
fn load_config(cli: &Cli) -> Result<DashboardConfig> {
    let mut config = match &cli.config {
        Some(path) => DashboardConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => DashboardConfig::default(),
    };
    config.apply_env().context("Invalid TSUITE_* environment override")?;

    if let Some(bind) = &cli.bind {
        config.server.bind_address = bind.clone();
    }
    if let Some(archive) = &cli.archive {
        config.data.archive = Some(archive.clone());
    }
    if let Some(sensors) = &cli.sensors {
        config.data.sensors = Some(sensors.clone());
    }
    config.validate().context("Invalid configuration")?;
    debug!("Effective configuration: {:?}", config);
    Ok(config)
}

async fn show_stats(config: &DashboardConfig) -> Result<()> {
    let Some(location) = &config.data.archive else {
        bail!("No archive configured; pass --archive or set TSUITE_ARCHIVE");
    };
    let source = DataSource::parse(location);
    let archive = source
        .load_archive(Duration::from_secs(config.server.request_timeout_secs))
        .await
        .with_context(|| format!("Failed to load archive from {}", source))?;

    let stats = archive.statistics();
    println!("📊 Archive Statistics");
    println!("   Test sets: {}", stats.total_sets);
    println!("   Run records: {}", stats.total_records);
    println!("   Tests: {}", stats.test_names.join(", "));
    if let Some(latest) = stats.latest_tsid {
        println!("   Latest test set: {}", latest);
    }
    println!("   Pass rate: {:.1}%", stats.pass_rate * 100.0);

    Ok(())
}

fn generate(sets: usize, seed: Option<u64>, output: Option<&Path>) -> Result<()> {
    let options = GenerateOptions {
        sets,
        ..Default::default()
    };
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let archive = generate_archive(&options, &mut rng);
    let json = serde_json::to_string_pretty(&archive).context("Failed to serialize archive")?;
    write_output(output, &json)?;
    info!("Generated {} test sets", archive.len());
    Ok(())
}

fn sense(inventory: &Path, file_inputs: &[String], output: Option<&Path>) -> Result<()> {
    let text = std::fs::read_to_string(inventory)
        .with_context(|| format!("Failed to read inventory {}", inventory.display()))?;
    let inventory = parse_inventory(&text);

    let mut logs = Vec::with_capacity(file_inputs.len());
    for input in file_inputs {
        let Some((host, file)) = input.split_once(':') else {
            bail!("Invalid file input {}; expected host:file", input);
        };
        let log = std::fs::read_to_string(file).with_context(|| format!("Failed to read {}", file))?;
        logs.push((host.to_string(), log));
    }

    let readings = collect(&inventory, &logs)?;
    let json = serde_json::to_string(&readings).context("Failed to serialize readings")?;
    write_output(output, &json)
}

fn write_output(output: Option<&Path>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}
