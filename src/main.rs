//! dcm-fit command-line interface.
//!
//! Fit every configured intensity and write the parameter table:
//! ```sh
//! dcm-fit
//! dcm-fit --config run.json --data-dir spectra/ --output fits.csv
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use dcm_fit::data::format_float;
use dcm_fit::{FitConfig, SequentialFitDriver};

#[derive(Parser)]
#[command(name = "dcm-fit")]
#[command(about = "DCM line-shape fits of time-resolved absorption spectra")]
#[command(version)]
struct Cli {
    /// JSON configuration file. Built-in defaults are used without one.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Directory holding the per-intensity spectrum files (overrides config).
    #[arg(short, long)]
    data_dir: Option<PathBuf>,
    /// Output CSV file (overrides config).
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => FitConfig::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => FitConfig::default(),
    };
    if let Some(dir) = cli.data_dir {
        config.data.directory = dir;
    }
    if let Some(output) = cli.output {
        config.output.path = output;
    }

    let driver = SequentialFitDriver::from_config(&config).context("Invalid fit setup")?;
    let report = driver.run().context("Sequential fit failed")?;

    report
        .table
        .write_csv(&config.output.path)
        .with_context(|| format!("Failed to write {}", config.output.path.display()))?;

    let rows = report.table.time().map_or(0, |t| t.len());
    println!(
        "Fitted {} intensities x {} time delays -> {}",
        report.table.len(),
        rows,
        config.output.path.display()
    );
    for (intensity, err) in &report.failed {
        println!("  skipped intensity {}: {}", format_float(*intensity), err);
    }

    Ok(())
}
