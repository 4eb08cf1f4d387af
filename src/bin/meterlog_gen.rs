use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use meterlog::table::GeneratorConfig;

#[derive(Parser, Debug)]
#[command(name = "meterlog-gen")]
#[command(about = "Generate hourly channel measurements into monthly SQLite partitions")]
struct Args {
    /// JSON config file; command-line flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// First calendar year to generate
    #[arg(long)]
    start_year: Option<i32>,

    /// Number of whole years to generate
    #[arg(long)]
    years: Option<u32>,

    /// IANA timezone name (e.g. America/Los_Angeles) or UTC
    #[arg(short, long, conflicts_with = "local_time")]
    timezone: Option<String>,

    /// Use the host's local time instead of a named zone
    #[arg(long)]
    local_time: bool,

    /// Directory for the partition files
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Measured value increment per hour
    #[arg(long)]
    step: Option<f64>,

    /// Extra attempts for a failed row insert (default: no retry)
    #[arg(long)]
    retries: Option<u32>,
}

impl Args {
    fn into_config(self) -> Result<GeneratorConfig> {
        let mut config = match &self.config {
            Some(path) => GeneratorConfig::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => GeneratorConfig::default(),
        };

        if let Some(year) = self.start_year {
            config.start_year = year;
        }
        if let Some(years) = self.years {
            config.span_years = years;
        }
        if self.local_time {
            config.timezone = None;
        } else if let Some(zone) = self.timezone {
            config.timezone = Some(zone);
        }
        if let Some(output) = self.output {
            config.output_dir = output;
        }
        if let Some(step) = self.step {
            config.value_step = step;
        }
        if let Some(retries) = self.retries {
            config.insert_retries = retries;
        }
        Ok(config)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let config = Args::parse().into_config()?;

    let report = meterlog::generate(&config)
        .await
        .context("generation aborted")?;

    info!(
        "{} partitions, {} rows written, {} row failures, {} commit failures, {} months skipped",
        report.partitions.len(),
        report.rows_written,
        report.row_failures,
        report.commit_failures,
        report.open_failures
    );
    info!("Generation finished.");
    Ok(())
}
