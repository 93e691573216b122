//! TSuite Static Report Generator
//!
//! Fetches test sets (and optionally sensor readings) from a file or URL and
//! writes the browser views as static HTML.

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tsuite::prelude::*;
use tsuite::write_report;

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("TSuite Report Generator")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Writes static HTML reports from test-suite results")
        .arg(Arg::new("source")
            .short('s')
            .long("source")
            .value_name("FILE|URL")
            .help("Test sets document: an archive, a single test set or a results mapping")
            .required(true))
        .arg(Arg::new("sensors")
            .long("sensors")
            .value_name("FILE|URL")
            .help("Sensor readings document for the heat grid page"))
        .arg(Arg::new("tsid")
            .long("tsid")
            .value_name("ID")
            .help("Test set to report on (defaults to the latest)")
            .value_parser(clap::value_parser!(u64)))
        .arg(Arg::new("output")
            .short('o')
            .long("output")
            .value_name("DIR")
            .help("Output directory for HTML reports")
            .default_value("tsuite-report"))
        .arg(Arg::new("title")
            .short('t')
            .long("title")
            .value_name("TITLE")
            .help("Report title"))
        .arg(Arg::new("threshold")
            .long("threshold")
            .value_name("PERCENT")
            .help("Percent change at which a test counts as regressed or improved")
            .value_parser(clap::value_parser!(f64)))
        .arg(Arg::new("config")
            .short('c')
            .long("config")
            .value_name("FILE")
            .help("TOML configuration file; its [display] section styles the report"))
        .arg(Arg::new("timeout")
            .long("timeout")
            .value_name("SECONDS")
            .help("Timeout for remote documents")
            .value_parser(clap::value_parser!(u64))
            .default_value("30"))
        .arg(Arg::new("verbose")
            .short('v')
            .long("verbose")
            .help("Enable debug logging")
            .action(ArgAction::SetTrue))
        .get_matches();

    let default_level = if matches.get_flag("verbose") { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = match matches.get_one::<String>("config") {
        Some(path) => DashboardConfig::from_file(&PathBuf::from(path))
            .with_context(|| format!("Failed to load configuration from {}", path))?,
        None => DashboardConfig::default(),
    };
    config.apply_env().context("Invalid TSUITE_* environment override")?;

    let mut builder = ReportConfigBuilder::new()
        .display(config.display.clone())
        .output_dir(matches.get_one::<String>("output").context("output has a default")?);
    if let Some(title) = matches.get_one::<String>("title") {
        builder = builder.title(title.as_str());
    }
    if let Some(threshold) = matches.get_one::<f64>("threshold") {
        builder = builder.change_threshold(*threshold);
    }
    let generator = ReportGenerator::new(builder.build());

    let source = DataSource::parse(matches.get_one::<String>("source").context("source is required")?);
    let sensors = matches
        .get_one::<String>("sensors")
        .or(config.data.sensors.as_ref())
        .map(|s| DataSource::parse(s));
    let tsid = matches.get_one::<u64>("tsid").copied();
    let timeout = Duration::from_secs(*matches.get_one::<u64>("timeout").context("timeout has a default")?);

    info!("Generating report from {}", source);
    let manifest = write_report(&source, sensors.as_ref(), tsid, &generator, timeout)
        .await
        .with_context(|| format!("Failed to write report to {}", generator.output_dir().display()))?;

    println!("✅ Report written to {}", generator.output_dir().display());
    for page in &manifest.pages {
        println!("   {}", page.display());
    }
    if !manifest.is_complete() {
        println!("⚠️  {} views show placeholders:", manifest.failures.len());
        for failure in &manifest.failures {
            println!("   [{}] {}", failure.code, failure.message);
        }
    }

    Ok(())
}
