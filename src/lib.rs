//! TSuite: test-suite result browser and disk sensor visualizer
//!
//! This package ties the workspace together: the data model and
//! configuration live in `tsuite-common`, aggregation, rendering and the
//! dashboard server in `tsuite-browser`. The `tsuite-report` binary writes
//! static reports.

pub use tsuite_browser as browser;
pub use tsuite_common as common;

/// Commonly used types
pub mod prelude {
    pub use tsuite_browser::{
        DataSource, Failure, ReportConfigBuilder, ReportGenerator, ReportManifest, TestArchive,
    };
    pub use tsuite_common::{
        DashboardConfig, DisplayConfig, Result, RunRecord, SensorReadings, TestGroup, TestSet,
        TestSetId, TsuiteError,
    };
}

/// Load a report's inputs and write it.
///
/// Fetch and parse failures end up as placeholders in the report; only a
/// failure to write files is returned.
pub async fn write_report(
    source: &tsuite_browser::DataSource,
    sensors: Option<&tsuite_browser::DataSource>,
    tsid: Option<tsuite_common::TestSetId>,
    generator: &tsuite_browser::ReportGenerator,
    timeout: std::time::Duration,
) -> tsuite_common::Result<tsuite_browser::ReportManifest> {
    use tracing::warn;
    use tsuite_browser::Failure;

    let archive = source.load_archive(timeout).await.map_err(|e| {
        warn!("Failed to load test sets from {}: {}", source, e);
        Failure::from(e)
    });

    let readings = match sensors {
        Some(sensors) => Some(sensors.load_sensors(timeout).await.map_err(|e| {
            warn!("Failed to load sensor readings from {}: {}", sensors, e);
            Failure::from(e)
        })),
        None => None,
    };

    generator.generate(
        archive.as_ref(),
        tsid,
        readings.as_ref().map(|r| r.as_ref()),
    )
}
