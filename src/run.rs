//! One-call generation entry point.

use crate::core::{MeasurementGenerator, Result, Timeline};
use crate::table::{GeneratorConfig, PartitionStore, RotationController, RunReport, WriteDriver};

/// Generate every partition described by `config`.
///
/// Only a failure to open the first partition (or an invalid config) is
/// returned as an error; row and commit failures are logged and counted in
/// the report.
pub async fn generate(config: &GeneratorConfig) -> Result<RunReport> {
    config.validate()?;
    let zone = config.zone()?;
    let timeline = Timeline::for_years(&zone, config.start_year, config.span_years)?;

    log::info!(
        "generating {} year(s) from {} in {} into {}",
        config.span_years,
        config.start_year,
        crate::core::Calendar::name(&zone),
        config.output_dir.display()
    );

    let driver = WriteDriver::new(MeasurementGenerator::new(config.value_step))
        .with_insert_retries(config.insert_retries);
    let controller = RotationController::new(PartitionStore::new(&config.output_dir), zone, driver);
    controller.run(timeline).await
}
